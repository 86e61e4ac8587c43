//! EventHandler trait - Dispatcher output interface
//!
//! Every domain handler (exporters, uploaders, debug output) implements it.

use crate::{ApiEvent, CommandSet, ContractError};

/// What a handler did with an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// Command matched and the pipeline ran
    Handled,
    /// Command filtered out; nothing happened
    Ignored,
}

/// Event consumer trait
#[trait_variant::make(EventHandler: Send)]
pub trait LocalEventHandler {
    /// Handler name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Commands this handler currently subscribes to
    async fn subscriptions(&self) -> CommandSet;

    /// Process one event
    ///
    /// # Errors
    /// Deserialization, validation, IO or remote errors for this event only
    async fn on_event(&mut self, event: &ApiEvent) -> Result<EventOutcome, ContractError>;

    /// Release resources on shutdown
    async fn close(&mut self) -> Result<(), ContractError>;
}
