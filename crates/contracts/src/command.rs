//! CommandName and CommandSet
//!
//! `CommandName` uses `Arc<str>` internally so fanning one event out to many
//! handlers never copies the name. `CommandSet` is the subscription filter.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

/// Subscription entry that matches every command
pub const WILDCARD: &str = "*";

/// Name of a captured remote-procedure command (e.g. `HubUserLogin`).
///
/// # Examples
/// ```
/// use contracts::CommandName;
///
/// let cmd: CommandName = "HubUserLogin".into();
/// let cmd2 = cmd.clone();  // O(1) - just increments ref count
/// assert_eq!(cmd, cmd2);
/// assert_eq!(cmd.as_str(), "HubUserLogin");
/// ```
#[derive(Clone, Default)]
pub struct CommandName(Arc<str>);

impl CommandName {
    #[inline]
    pub fn new(s: &str) -> Self {
        Self(Arc::from(s))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for CommandName {
    type Target = str;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for CommandName {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for CommandName {
    #[inline]
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CommandName {
    #[inline]
    fn from(s: &str) -> Self {
        Self(Arc::from(s))
    }
}

impl From<String> for CommandName {
    #[inline]
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CommandName({:?})", self.0)
    }
}

impl PartialEq for CommandName {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Eq for CommandName {}

impl PartialEq<str> for CommandName {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.0.as_ref() == other
    }
}

impl PartialEq<&str> for CommandName {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        self.0.as_ref() == *other
    }
}

impl PartialOrd for CommandName {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CommandName {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl Hash for CommandName {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}

impl Serialize for CommandName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for CommandName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s))
    }
}

/// Set of commands a handler subscribes to.
///
/// Ordered so that logging and `info` output are stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSet {
    commands: BTreeSet<CommandName>,
}

impl CommandSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set containing only the wildcard entry
    pub fn wildcard() -> Self {
        [WILDCARD].into_iter().collect()
    }

    pub fn insert(&mut self, command: impl Into<CommandName>) {
        self.commands.insert(command.into());
    }

    pub fn extend<I, C>(&mut self, commands: I)
    where
        I: IntoIterator<Item = C>,
        C: Into<CommandName>,
    {
        self.commands.extend(commands.into_iter().map(Into::into));
    }

    /// CommandFilter: true if `command` is subscribed or the set holds `*`
    pub fn matches(&self, command: &str) -> bool {
        self.commands.contains(WILDCARD) || self.commands.contains(command)
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CommandName> {
        self.commands.iter()
    }

    /// Command names as owned strings, sorted
    pub fn to_vec(&self) -> Vec<String> {
        self.commands.iter().map(|c| c.to_string()).collect()
    }
}

impl<C: Into<CommandName>> FromIterator<C> for CommandSet {
    fn from_iter<I: IntoIterator<Item = C>>(iter: I) -> Self {
        Self {
            commands: iter.into_iter().map(Into::into).collect(),
        }
    }
}
