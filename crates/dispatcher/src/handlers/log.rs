//! DebugOutput - logs every event via tracing

use chrono::Utc;
use contracts::{ApiEvent, CommandSet, ContractError, EventHandler, EventOutcome};
use tracing::{debug, info, instrument};

/// Handler that logs command, request and response for debugging
pub struct DebugOutput {
    name: String,
    commands: CommandSet,
}

impl DebugOutput {
    pub fn new() -> Self {
        Self {
            name: "debug_output".to_string(),
            commands: CommandSet::wildcard(),
        }
    }
}

impl Default for DebugOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHandler for DebugOutput {
    fn name(&self) -> &str {
        &self.name
    }

    async fn subscriptions(&self) -> CommandSet {
        self.commands.clone()
    }

    #[instrument(
        name = "debug_output_on_event",
        skip(self, event),
        fields(command = %event.command)
    )]
    async fn on_event(&mut self, event: &ApiEvent) -> Result<EventOutcome, ContractError> {
        if !self.commands.matches(&event.command) {
            return Ok(EventOutcome::Ignored);
        }
        debug!(
            command = %event.command,
            captured_at = %Utc::now().to_rfc3339(),
            request = %event.request,
            response = %event.response,
            "API event"
        );
        Ok(EventOutcome::Handled)
    }

    #[instrument(name = "debug_output_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(handler = %self.name, "DebugOutput closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_debug_output_handles_everything() {
        let mut output = DebugOutput::new();
        for command in ["HubUserLogin", "GetGuildSiegeBattleLog", ""] {
            let event = ApiEvent::new(command, "{}", "not even json");
            assert_eq!(output.on_event(&event).await.unwrap(), EventOutcome::Handled);
        }
    }

    #[tokio::test]
    async fn test_debug_output_subscribes_wildcard() {
        let output = DebugOutput::new();
        assert_eq!(output.name(), "debug_output");
        assert_eq!(output.subscriptions().await.to_vec(), vec!["*"]);
    }
}
