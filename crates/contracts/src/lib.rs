//! # Contracts
//!
//! Frozen interface contracts shared by every plugin crate: the captured
//! event, the command filter, the handler trait, the error taxonomy and the
//! configuration schema. Business crates depend on this crate only.
//!
//! ## Event Model
//! - An event is `(command, request JSON text, response JSON text)`
//! - Handlers decide by command name whether they care about an event

mod command;
mod config;
mod error;
mod event;
mod handler;

pub use command::{CommandName, CommandSet, WILDCARD};
pub use config::*;
pub use error::*;
pub use event::{as_id, decode_view, json_kind, ApiEvent, DecodedEvent, JsonObject};
pub use handler::{EventHandler, EventOutcome, LocalEventHandler};
