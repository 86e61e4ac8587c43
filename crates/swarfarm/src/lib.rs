//! # SWARFARM
//!
//! Remote upload handlers and their building blocks:
//!
//! - `TokenStore`: wizard id -> API token
//! - `SchemaCache`: memoized accepted-command schemas
//! - `project`: schema-driven payload projection
//! - `UploadClient`: JSON submission + status classification
//! - `JobPoller`: cancellable import job polling
//! - `SwarfarmUploader` / `SwagForwarder`: the event handlers

pub mod client;
pub mod poller;
pub mod projector;
pub mod schema;
pub mod swag;
pub mod token_store;
pub mod uploader;

pub use client::{SwarfarmEndpoints, UploadClient, UploadOutcome};
pub use poller::{
    JobPoller, JobStatusClient, JobStatusSource, PollHandle, PollOutcome, PollPolicy,
    JOB_COMPLETE_STATUS,
};
pub use projector::{project, UploadPayload};
pub use schema::{
    CommandSchema, HttpSchemaFetcher, SchemaCache, SchemaDomain, SchemaEntry, SchemaFetcher,
    RESERVED_PREFIX,
};
pub use swag::{SwagForwarder, SWAG_COMMANDS};
pub use token_store::{TokenError, TokenStore};
pub use uploader::{schema_cache_for, SwarfarmUploader, UploaderOptions, PROFILE_UPLOAD_COMMANDS};
