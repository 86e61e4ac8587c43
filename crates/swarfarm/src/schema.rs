//! Command schema cache
//!
//! The remote authority publishes, per command, which request and response
//! fields may be uploaded. Each cache domain is fetched at most once per
//! process unless cleared. A failed fetch is never memoized, so the next
//! lookup tries again.

use contracts::{json_kind, ContractError};
use parking_lot::RwLock;
use reqwest::Client;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

/// Keys starting with this prefix are metadata, not commands
pub const RESERVED_PREFIX: &str = "__";

/// Direction -> approved field names for one command
pub type SchemaEntry = BTreeMap<String, Vec<String>>;

/// Logical schema cache domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaDomain {
    DataLog,
    LiveSync,
}

impl SchemaDomain {
    pub fn label(self) -> &'static str {
        match self {
            Self::DataLog => "data log commands",
            Self::LiveSync => "live sync commands",
        }
    }
}

/// Command name -> schema entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSchema {
    commands: BTreeMap<String, SchemaEntry>,
}

impl CommandSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the remote document `{command: {direction: [field, ...]}}`
    pub fn from_document(document: &Value) -> Result<Self, ContractError> {
        let top = document.as_object().ok_or_else(|| {
            ContractError::validation(
                "schema",
                format!("expected an object, found {}", json_kind(document)),
            )
        })?;

        let mut commands = BTreeMap::new();
        for (command, directions) in top {
            if command.starts_with(RESERVED_PREFIX) {
                continue;
            }
            commands.insert(command.clone(), parse_entry(command, directions)?);
        }
        Ok(Self { commands })
    }

    pub fn insert(&mut self, command: impl Into<String>, entry: SchemaEntry) {
        self.commands.insert(command.into(), entry);
    }

    pub fn get(&self, command: &str) -> Option<&SchemaEntry> {
        self.commands.get(command)
    }

    pub fn contains(&self, command: &str) -> bool {
        self.commands.contains_key(command)
    }

    pub fn commands(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }
}

fn parse_entry(command: &str, directions: &Value) -> Result<SchemaEntry, ContractError> {
    let directions = directions.as_object().ok_or_else(|| {
        ContractError::validation(
            format!("schema.{command}"),
            format!("expected an object, found {}", json_kind(directions)),
        )
    })?;

    let mut entry = SchemaEntry::new();
    for (direction, fields) in directions {
        let field_path = || format!("schema.{command}.{direction}");
        let fields = fields.as_array().ok_or_else(|| {
            ContractError::validation(field_path(), "expected a list of field names")
        })?;
        let names = fields
            .iter()
            .map(|f| {
                f.as_str().map(str::to_string).ok_or_else(|| {
                    ContractError::validation(field_path(), "field names must be strings")
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        entry.insert(direction.clone(), names);
    }
    Ok(entry)
}

/// Source of schema documents
#[trait_variant::make(SchemaFetcher: Send)]
pub trait LocalSchemaFetcher {
    /// Fetch and parse the schema published at `url`
    async fn fetch_schema(&self, url: &str) -> Result<CommandSchema, ContractError>;
}

/// Fetches schemas over HTTP (anonymous GET)
#[derive(Debug, Clone)]
pub struct HttpSchemaFetcher {
    http: Client,
}

impl HttpSchemaFetcher {
    pub fn new(http: Client) -> Self {
        Self { http }
    }
}

impl SchemaFetcher for HttpSchemaFetcher {
    async fn fetch_schema(&self, url: &str) -> Result<CommandSchema, ContractError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ContractError::RemoteTransport {
                endpoint: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ContractError::RemoteServer {
                endpoint: url.to_string(),
                status: status.as_u16(),
                detail: status
                    .canonical_reason()
                    .unwrap_or("invalid status code")
                    .to_string(),
            });
        }

        let document: Value = response.json().await.map_err(|e| {
            ContractError::serialization(format!("schema body from {url}: {e}"))
        })?;
        CommandSchema::from_document(&document)
    }
}

struct Slot {
    url: String,
    value: RwLock<Option<Arc<CommandSchema>>>,
    /// Serializes population so concurrent misses trigger one fetch
    fetch_gate: tokio::sync::Mutex<()>,
}

impl Slot {
    fn cached(&self) -> Option<Arc<CommandSchema>> {
        self.value.read().clone()
    }
}

/// Memoizing schema cache, one slot per domain
pub struct SchemaCache<F = HttpSchemaFetcher> {
    fetcher: F,
    slots: HashMap<SchemaDomain, Slot>,
}

impl<F> SchemaCache<F> {
    /// Create a cache with the URL each domain is fetched from
    pub fn new<I, U>(fetcher: F, urls: I) -> Self
    where
        I: IntoIterator<Item = (SchemaDomain, U)>,
        U: Into<String>,
    {
        let slots = urls
            .into_iter()
            .map(|(domain, url)| {
                (
                    domain,
                    Slot {
                        url: url.into(),
                        value: RwLock::new(None),
                        fetch_gate: tokio::sync::Mutex::new(()),
                    },
                )
            })
            .collect();
        Self { fetcher, slots }
    }

    /// Whether a successful fetch is memoized for `domain`
    pub fn is_cached(&self, domain: SchemaDomain) -> bool {
        self.slots
            .get(&domain)
            .is_some_and(|slot| slot.value.read().is_some())
    }

    /// Drop the memoized schema so the next lookup fetches again
    pub fn clear(&self, domain: SchemaDomain) {
        if let Some(slot) = self.slots.get(&domain) {
            slot.value.write().take();
        }
    }
}

impl<F: SchemaFetcher + Sync> SchemaCache<F> {
    /// Memoized schema, fetching on first use
    pub async fn get(&self, domain: SchemaDomain) -> Arc<CommandSchema> {
        if let Some(schema) = self.slots.get(&domain).and_then(Slot::cached) {
            debug!(domain = domain.label(), "Using cached schema");
            return schema;
        }
        self.fetch(domain).await
    }

    /// Fetch `domain` unless another caller already populated it.
    ///
    /// Failures yield an empty schema and leave the slot empty.
    #[instrument(name = "schema_cache_fetch", skip_all, fields(domain = domain.label()))]
    pub async fn fetch(&self, domain: SchemaDomain) -> Arc<CommandSchema> {
        let Some(slot) = self.slots.get(&domain) else {
            error!("No URL configured for schema domain");
            return Arc::new(CommandSchema::new());
        };

        let _gate = slot.fetch_gate.lock().await;
        if let Some(schema) = slot.cached() {
            return schema;
        }

        debug!(url = %slot.url, "Fetching schema");
        match self.fetcher.fetch_schema(&slot.url).await {
            Ok(schema) => {
                let schema = Arc::new(schema);
                info!(
                    url = %slot.url,
                    commands = ?schema.commands().collect::<Vec<_>>(),
                    "Successfully retrieved {}", domain.label()
                );
                *slot.value.write() = Some(Arc::clone(&schema));
                schema
            }
            Err(e) => {
                error!(
                    url = %slot.url,
                    error = %e,
                    "Unable to retrieve {}. Uploads for this domain are disabled",
                    domain.label()
                );
                Arc::new(CommandSchema::new())
            }
        }
    }
}
