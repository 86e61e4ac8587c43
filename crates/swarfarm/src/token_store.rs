//! TokenStore - wizard id to API token mapping
//!
//! In-memory only. Written at configuration time, read on every upload.

use parking_lot::RwLock;
use std::collections::HashMap;
use thiserror::Error;

/// Token lookup failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("identity is empty")]
    EmptyIdentity,

    #[error("no token stored for identity '{identity}'")]
    NotFound { identity: String },
}

/// Identity -> credential store with last-write-wins upserts
#[derive(Debug, Default)]
pub struct TokenStore {
    tokens: RwLock<HashMap<String, String>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from `(identity, token)` pairs, skipping blank identities
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let store = Self::new();
        for (identity, token) in pairs {
            store.add_profile(identity.as_ref(), token);
        }
        store
    }

    /// Store `token` for `identity`. Blank identities are ignored.
    pub fn add_profile(&self, identity: &str, token: impl Into<String>) {
        if identity.trim().is_empty() {
            return;
        }
        self.tokens.write().insert(identity.to_string(), token.into());
    }

    /// Token stored for `identity`
    pub fn find_token(&self, identity: &str) -> Result<String, TokenError> {
        if identity.trim().is_empty() {
            return Err(TokenError::EmptyIdentity);
        }
        self.tokens
            .read()
            .get(identity)
            .cloned()
            .ok_or_else(|| TokenError::NotFound {
                identity: identity.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.tokens.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.read().is_empty()
    }
}
