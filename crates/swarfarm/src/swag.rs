//! SwagForwarder - anonymous guild war log passthrough
//!
//! Best effort: upload failures are logged and never surfaced.

use contracts::{ApiEvent, CommandSet, ContractError, EventHandler, EventOutcome, SwagConfig};
use observability::record_upload;
use std::time::Duration;
use tracing::{error, info, instrument};

use crate::client::{UploadClient, UploadOutcome};

/// Guild war battle log commands
pub const SWAG_COMMANDS: &[&str] = &[
    "GetGuildWarBattleLogByWizardId",
    "GetGuildWarBattleLogByGuildId",
];

pub struct SwagForwarder {
    name: String,
    client: UploadClient,
    upload_url: String,
    commands: CommandSet,
}

impl SwagForwarder {
    pub fn new(client: UploadClient, upload_url: impl Into<String>) -> Self {
        Self {
            name: "swag".to_string(),
            client,
            upload_url: upload_url.into(),
            commands: SWAG_COMMANDS.iter().copied().collect(),
        }
    }

    pub fn from_config(config: &SwagConfig, timeout: Duration) -> Result<Self, ContractError> {
        Ok(Self::new(UploadClient::new(timeout)?, config.upload_url.clone()))
    }
}

impl EventHandler for SwagForwarder {
    fn name(&self) -> &str {
        &self.name
    }

    async fn subscriptions(&self) -> CommandSet {
        self.commands.clone()
    }

    #[instrument(name = "swag_on_event", skip(self, event), fields(command = %event.command))]
    async fn on_event(&mut self, event: &ApiEvent) -> Result<EventOutcome, ContractError> {
        if !self.commands.matches(&event.command) {
            return Ok(EventOutcome::Ignored);
        }

        let request = event.decode_request()?;
        // forwarded untouched, but must still be a JSON object
        event.decode_response()?;
        let wizard_id = request
            .get("wizard_id")
            .and_then(contracts::as_id)
            .ok_or_else(|| {
                ContractError::validation("request.wizard_id", "missing or not a number")
            })?;

        info!(wizard_id, "Uploading guild war data to SWAG...");
        let outcome = self
            .client
            .submit_raw(&self.upload_url, "", event.response.to_string())
            .await;
        record_upload("swag", outcome.label());

        match outcome {
            UploadOutcome::Success(_) => info!(wizard_id, "SWAG upload successful"),
            UploadOutcome::TransportFailure { message } => {
                error!(wizard_id, %message, "SWAG upload failed")
            }
            UploadOutcome::AuthFailure { .. } => {
                error!(wizard_id, status = 401, "SWAG upload failed. Status 401")
            }
            UploadOutcome::InvalidRequest { .. } => {
                error!(wizard_id, status = 400, "SWAG upload failed. Status 400")
            }
            UploadOutcome::ServerError { status, .. } => {
                error!(wizard_id, status, "SWAG upload failed. Status {status}")
            }
        }
        Ok(EventOutcome::Handled)
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string, method, path};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    fn forwarder(server: &MockServer) -> SwagForwarder {
        SwagForwarder::new(
            UploadClient::new(Duration::from_secs(5)).unwrap(),
            format!("{}/data/upload/", server.uri()),
        )
    }

    #[tokio::test]
    async fn test_forwards_raw_response_anonymously() {
        let server = MockServer::start().await;
        let response = r#"{"log_list":[{"battle":1}], "ret_code":0}"#;
        Mock::given(method("POST"))
            .and(path("/data/upload/"))
            .and(body_string(response))
            .respond_with(|request: &Request| {
                if request.headers.contains_key("authorization") {
                    ResponseTemplate::new(500)
                } else {
                    ResponseTemplate::new(200)
                }
            })
            .expect(1)
            .mount(&server)
            .await;

        let mut swag = forwarder(&server);
        let event = ApiEvent::new(
            "GetGuildWarBattleLogByGuildId",
            r#"{"wizard_id": 3}"#,
            response,
        );

        assert_eq!(swag.on_event(&event).await.unwrap(), EventOutcome::Handled);
    }

    #[tokio::test]
    async fn test_upload_failure_is_not_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let mut swag = forwarder(&server);
        let event = ApiEvent::new(
            "GetGuildWarBattleLogByWizardId",
            r#"{"wizard_id": 3}"#,
            "{}",
        );

        assert_eq!(swag.on_event(&event).await.unwrap(), EventOutcome::Handled);
    }

    #[tokio::test]
    async fn test_other_commands_are_ignored() {
        let server = MockServer::start().await;
        let mut swag = forwarder(&server);
        let event = ApiEvent::new("HubUserLogin", "{}", "{}");
        assert_eq!(swag.on_event(&event).await.unwrap(), EventOutcome::Ignored);
    }

    #[tokio::test]
    async fn test_missing_wizard_id_fails() {
        let server = MockServer::start().await;
        let mut swag = forwarder(&server);
        let event = ApiEvent::new("GetGuildWarBattleLogByWizardId", "{}", "{}");
        assert!(matches!(
            swag.on_event(&event).await,
            Err(ContractError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_malformed_response_fails() {
        let server = MockServer::start().await;
        let mut swag = forwarder(&server);
        let event = ApiEvent::new(
            "GetGuildWarBattleLogByWizardId",
            r#"{"wizard_id": 3}"#,
            "[1",
        );
        assert!(matches!(
            swag.on_event(&event).await,
            Err(ContractError::Deserialization { part: "response", .. })
        ));
    }
}
