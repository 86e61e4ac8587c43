//! SwarfarmUploader - profile upload, data log and live sync forwarding

use contracts::{
    ApiEvent, CommandSet, ContractError, DecodedEvent, EventHandler, EventOutcome,
    JobPollConfig, SwarfarmConfig,
};
use observability::record_upload;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

use crate::client::{SwarfarmEndpoints, UploadClient, UploadOutcome};
use crate::poller::{JobPoller, JobStatusClient, JobStatusSource, PollHandle, PollPolicy};
use crate::projector::{project, UploadPayload};
use crate::schema::{CommandSchema, HttpSchemaFetcher, SchemaCache, SchemaDomain, SchemaFetcher};
use crate::token_store::TokenStore;

/// Commands whose full response is uploaded as a profile
pub const PROFILE_UPLOAD_COMMANDS: &[&str] = &["HubUserLogin"];

/// Which upload paths are active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploaderOptions {
    pub datalog_enabled: bool,
    pub livesync_enabled: bool,
}

impl From<&SwarfarmConfig> for UploaderOptions {
    fn from(config: &SwarfarmConfig) -> Self {
        Self {
            datalog_enabled: config.datalog_enabled,
            livesync_enabled: config.livesync_enabled,
        }
    }
}

/// Wire envelope for data log and live sync uploads
#[derive(Serialize)]
struct DataEnvelope<'a> {
    data: &'a UploadPayload,
}

/// Routes matching events to the SWARFARM API
pub struct SwarfarmUploader<F = HttpSchemaFetcher, S = JobStatusClient> {
    name: String,
    client: UploadClient,
    endpoints: SwarfarmEndpoints,
    tokens: Arc<TokenStore>,
    schemas: Arc<SchemaCache<F>>,
    poller: JobPoller<S>,
    options: UploaderOptions,
    polls: Vec<PollHandle>,
}

impl SwarfarmUploader {
    /// Build the HTTP-backed uploader from configuration
    pub fn from_config(
        config: &SwarfarmConfig,
        job_poll: &JobPollConfig,
        tokens: Arc<TokenStore>,
    ) -> Result<Self, ContractError> {
        let client = UploadClient::new(Duration::from_secs(config.request_timeout_secs))?;
        let endpoints = SwarfarmEndpoints::new(config.api_url.clone());
        let schemas = Arc::new(schema_cache_for(&client, &endpoints));
        let poller = JobPoller::new(
            JobStatusClient::new(client.clone(), endpoints.clone()),
            PollPolicy::from(job_poll),
        );

        Ok(Self::new(
            client,
            endpoints,
            tokens,
            schemas,
            poller,
            UploaderOptions::from(config),
        ))
    }
}

/// HTTP schema cache with both SWARFARM domains configured
pub fn schema_cache_for(client: &UploadClient, endpoints: &SwarfarmEndpoints) -> SchemaCache {
    SchemaCache::new(
        HttpSchemaFetcher::new(client.http().clone()),
        [
            (SchemaDomain::DataLog, endpoints.data_log_schema()),
            (SchemaDomain::LiveSync, endpoints.live_sync_schema()),
        ],
    )
}

impl<F, S> SwarfarmUploader<F, S> {
    pub fn new(
        client: UploadClient,
        endpoints: SwarfarmEndpoints,
        tokens: Arc<TokenStore>,
        schemas: Arc<SchemaCache<F>>,
        poller: JobPoller<S>,
        options: UploaderOptions,
    ) -> Self {
        Self {
            name: "swarfarm".to_string(),
            client,
            endpoints,
            tokens,
            schemas,
            poller,
            options,
            polls: Vec::new(),
        }
    }

    /// Job polls that have not finished yet
    pub fn pending_polls(&self) -> usize {
        self.polls.iter().filter(|h| !h.is_finished()).count()
    }

    /// Drop handles of polls that already ended
    fn prune_polls(&mut self) {
        self.polls.retain(|h| !h.is_finished());
    }

    fn credential_for(&self, wizard_id: i64) -> Option<String> {
        self.tokens.find_token(&wizard_id.to_string()).ok()
    }
}

impl<F, S> SwarfarmUploader<F, S>
where
    F: SchemaFetcher + Sync + 'static,
    S: JobStatusSource + Sync + 'static,
{
    async fn data_log_schema(&self) -> Arc<CommandSchema> {
        if self.options.datalog_enabled {
            self.schemas.get(SchemaDomain::DataLog).await
        } else {
            Arc::new(CommandSchema::new())
        }
    }

    async fn live_sync_schema(&self) -> Arc<CommandSchema> {
        if self.options.livesync_enabled {
            self.schemas.get(SchemaDomain::LiveSync).await
        } else {
            Arc::new(CommandSchema::new())
        }
    }

    /// Current subscriptions: the profile list plus every schema command
    pub async fn subscribed_commands(&self) -> CommandSet {
        let mut commands: CommandSet = PROFILE_UPLOAD_COMMANDS.iter().copied().collect();
        commands.extend(self.data_log_schema().await.commands());
        commands.extend(self.live_sync_schema().await.commands());
        commands
    }

    #[instrument(
        name = "swarfarm_profile_upload",
        skip_all,
        fields(command = %event.command, wizard_id = wizard_id)
    )]
    async fn upload_profile(
        &mut self,
        event: &ApiEvent,
        wizard_id: i64,
        credential: &str,
    ) -> Result<(), ContractError> {
        info!("Uploading profile to SWARFARM...");
        let url = self.endpoints.profile_upload();
        let outcome = self
            .client
            .submit_raw(&url, credential, event.response.to_string())
            .await;
        record_upload("profiles/upload", outcome.label());

        match outcome {
            UploadOutcome::Success(body) => {
                let job_id = body
                    .get("job_id")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| {
                        ContractError::validation("job_id", "missing from profile upload response")
                    })?;
                info!(
                    job_id,
                    "SWARFARM profile successfully uploaded - awaiting import queue"
                );

                self.polls.push(self.poller.spawn(job_id, credential));
                Ok(())
            }
            other => {
                match &other {
                    UploadOutcome::InvalidRequest { detail } => {
                        error!(%detail, "Upload failed, invalid data provided")
                    }
                    UploadOutcome::AuthFailure { detail } => {
                        error!(%detail, "Unable to authorize. Please check your API key")
                    }
                    UploadOutcome::ServerError { status: 409, detail } => {
                        error!(%detail, "You need to upload your profile manually to resolve this")
                    }
                    UploadOutcome::TransportFailure { message } => error!(
                        %message,
                        "Failed to upload profile to SWARFARM, could not send request"
                    ),
                    _ => error!(outcome = other.label(), "Received unknown response type"),
                }
                other.into_result(&url).map(|_| ())
            }
        }
    }

    #[instrument(
        name = "swarfarm_data_log",
        skip_all,
        fields(command = %event.command, wizard_id = wizard_id)
    )]
    async fn upload_data_log(
        &self,
        event: &ApiEvent,
        raw: &DecodedEvent,
        schema: &CommandSchema,
        wizard_id: i64,
        credential: &str,
    ) -> Result<(), ContractError> {
        debug!("Uploading command data to SWARFARM");
        let payload = project(schema.get(event.command.as_str()), raw);
        let url = self.endpoints.data_log_upload();
        let outcome = self
            .client
            .submit_json(&url, credential, &DataEnvelope { data: &payload })
            .await?;
        record_upload("data_logs", outcome.label());
        report("data log", &url, outcome)
    }

    #[instrument(
        name = "swarfarm_live_sync",
        skip_all,
        fields(command = %event.command, wizard_id = wizard_id)
    )]
    async fn upload_live_sync(
        &self,
        event: &ApiEvent,
        raw: &DecodedEvent,
        schema: &CommandSchema,
        wizard_id: i64,
        credential: Option<&str>,
    ) -> Result<(), ContractError> {
        let Some(credential) = credential.filter(|c| !c.is_empty()) else {
            debug!("No API token stored for wizard, skipping live sync");
            return Ok(());
        };

        debug!("Uploading live sync data to SWARFARM");
        let payload = project(schema.get(event.command.as_str()), raw);
        let url = self.endpoints.live_sync_upload();
        let outcome = self
            .client
            .submit_json(&url, credential, &DataEnvelope { data: &payload })
            .await?;
        record_upload("profiles/sync", outcome.label());
        report("live sync", &url, outcome)
    }
}

/// Log a data log / live sync outcome and convert it to a result
fn report(kind: &str, url: &str, outcome: UploadOutcome) -> Result<(), ContractError> {
    match &outcome {
        UploadOutcome::Success(_) => info!("SWARFARM {kind} upload successful"),
        UploadOutcome::AuthFailure { detail } => {
            error!(%detail, "SWARFARM {kind} upload failed - authentication error")
        }
        UploadOutcome::InvalidRequest { detail } => error!(
            status = 400,
            %detail,
            "SWARFARM {kind} upload failed - invalid status code"
        ),
        UploadOutcome::ServerError { status, detail } => {
            error!(status, %detail, "SWARFARM {kind} upload failed - invalid status code")
        }
        UploadOutcome::TransportFailure { message } => {
            error!(%message, "SWARFARM {kind} upload failed")
        }
    }
    outcome.into_result(url).map(|_| ())
}

impl<F, S> EventHandler for SwarfarmUploader<F, S>
where
    F: SchemaFetcher + Sync + 'static,
    S: JobStatusSource + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn subscriptions(&self) -> CommandSet {
        self.subscribed_commands().await
    }

    #[instrument(name = "swarfarm_on_event", skip(self, event), fields(command = %event.command))]
    async fn on_event(&mut self, event: &ApiEvent) -> Result<EventOutcome, ContractError> {
        self.prune_polls();

        let command = event.command.as_str();
        let is_profile = PROFILE_UPLOAD_COMMANDS.contains(&command);
        let data_log = self.data_log_schema().await;
        let live_sync = self.live_sync_schema().await;
        let is_data_log = data_log.contains(command);
        let is_live_sync = live_sync.contains(command);

        if !(is_profile || is_data_log || is_live_sync) {
            return Ok(EventOutcome::Ignored);
        }

        let raw = event.decode()?;
        let wizard_id = raw.wizard_id().ok_or_else(|| {
            error!("Failed to get wizard id from API request/response");
            ContractError::validation("wizard_id", "not found in request or response")
        })?;
        let token = self.credential_for(wizard_id);
        let credential = token.as_deref().unwrap_or_default();

        let mut first_error = None;
        if is_profile {
            if let Err(e) = self.upload_profile(event, wizard_id, credential).await {
                first_error.get_or_insert(e);
            }
        }
        if is_data_log {
            if let Err(e) = self
                .upload_data_log(event, &raw, &data_log, wizard_id, credential)
                .await
            {
                first_error.get_or_insert(e);
            }
        }
        if is_live_sync {
            if let Err(e) = self
                .upload_live_sync(event, &raw, &live_sync, wizard_id, token.as_deref())
                .await
            {
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(EventOutcome::Handled),
        }
    }

    #[instrument(name = "swarfarm_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        let polls = std::mem::take(&mut self.polls);
        if !polls.is_empty() {
            warn!(count = polls.len(), "Cancelling outstanding job polls");
        }
        for handle in polls {
            handle.cancel();
            let job_id = handle.job_id().to_string();
            let outcome = handle.join().await;
            debug!(job_id, ?outcome, "Job poll finished");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poller::PollOutcome;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn data_log_schema() -> serde_json::Value {
        json!({
            "__meta": {"version": 3},
            "BattleDungeonResult": {
                "request": ["wizard_id", "dungeon_id"],
                "response": ["reward"]
            }
        })
    }

    async fn mount_schemas(server: &MockServer, live_sync: serde_json::Value) {
        mount_schema_pair(server, data_log_schema(), live_sync).await;
    }

    async fn mount_schema_pair(
        server: &MockServer,
        data_log: serde_json::Value,
        live_sync: serde_json::Value,
    ) {
        Mock::given(method("GET"))
            .and(path("/data_logs/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(data_log))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/profiles/accepted-commands/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(live_sync))
            .mount(server)
            .await;
    }

    fn uploader(
        server: &MockServer,
        options: UploaderOptions,
        tokens: TokenStore,
    ) -> SwarfarmUploader {
        let config = SwarfarmConfig {
            api_url: server.uri(),
            datalog_enabled: options.datalog_enabled,
            livesync_enabled: options.livesync_enabled,
            ..SwarfarmConfig::default()
        };
        let poll = JobPollConfig {
            max_attempts: 1,
            interval_secs: 0,
        };
        SwarfarmUploader::from_config(&config, &poll, Arc::new(tokens)).unwrap()
    }

    fn both_enabled() -> UploaderOptions {
        UploaderOptions {
            datalog_enabled: true,
            livesync_enabled: true,
        }
    }

    #[tokio::test]
    async fn test_subscriptions_derive_from_schemas() {
        let server = MockServer::start().await;
        mount_schemas(&server, json!({"SummonUnit": {"response": ["unit_list"]}})).await;

        let up = uploader(&server, both_enabled(), TokenStore::new());
        let subs = up.subscriptions().await;

        assert_eq!(
            subs.to_vec(),
            vec!["BattleDungeonResult", "HubUserLogin", "SummonUnit"]
        );
    }

    #[tokio::test]
    async fn test_disabled_domains_are_not_fetched() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(data_log_schema()))
            .expect(0)
            .mount(&server)
            .await;

        let options = UploaderOptions {
            datalog_enabled: false,
            livesync_enabled: false,
        };
        let up = uploader(&server, options, TokenStore::new());
        assert_eq!(up.subscriptions().await.to_vec(), vec!["HubUserLogin"]);
    }

    #[tokio::test]
    async fn test_unsubscribed_command_is_ignored() {
        let server = MockServer::start().await;
        mount_schemas(&server, json!({})).await;

        let mut up = uploader(&server, both_enabled(), TokenStore::new());
        let event = ApiEvent::new("GetMailList", "not json", "{}");

        assert_eq!(up.on_event(&event).await.unwrap(), EventOutcome::Ignored);
    }

    #[tokio::test]
    async fn test_data_log_projects_schema_fields() {
        let server = MockServer::start().await;
        mount_schemas(&server, json!({})).await;
        Mock::given(method("POST"))
            .and(path("/data_logs/"))
            .and(header("Authorization", "Token tok"))
            .and(body_json(json!({
                "data": {
                    "request": {"wizard_id": 7, "dungeon_id": null},
                    "response": {"reward": {"crystal": 3}}
                }
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let mut up = uploader(&server, both_enabled(), TokenStore::from_pairs([("7", "tok")]));
        let event = ApiEvent::new(
            "BattleDungeonResult",
            r#"{"wizard_id": 7, "session_key": "secret"}"#,
            r#"{"reward": {"crystal": 3}, "tvalue": 1}"#,
        );

        assert_eq!(up.on_event(&event).await.unwrap(), EventOutcome::Handled);
    }

    #[tokio::test]
    async fn test_data_log_failure_carries_detail() {
        let server = MockServer::start().await;
        mount_schemas(&server, json!({})).await;
        Mock::given(method("POST"))
            .and(path("/data_logs/"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"detail": "Invalid token."})),
            )
            .mount(&server)
            .await;

        let mut up = uploader(&server, both_enabled(), TokenStore::new());
        let event = ApiEvent::new("BattleDungeonResult", r#"{"wizard_id": 7}"#, "{}");

        let err = up.on_event(&event).await.unwrap_err();
        match err {
            ContractError::RemoteAuth { detail, .. } => assert_eq!(detail, "Invalid token."),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_wizard_id_is_validation_error() {
        let server = MockServer::start().await;
        mount_schemas(&server, json!({})).await;

        let mut up = uploader(&server, both_enabled(), TokenStore::new());
        let event = ApiEvent::new("BattleDungeonResult", "{}", "{}");

        assert!(matches!(
            up.on_event(&event).await,
            Err(ContractError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn test_live_sync_skipped_without_token() {
        let server = MockServer::start().await;
        mount_schemas(&server, json!({"SummonUnit": {"response": ["unit_list"]}})).await;
        Mock::given(method("POST"))
            .and(path("/profiles/sync/"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut up = uploader(&server, both_enabled(), TokenStore::new());
        let event = ApiEvent::new("SummonUnit", r#"{"wizard_id": 9}"#, r#"{"unit_list": []}"#);

        assert_eq!(up.on_event(&event).await.unwrap(), EventOutcome::Handled);
    }

    #[tokio::test]
    async fn test_live_sync_with_token() {
        let server = MockServer::start().await;
        mount_schemas(&server, json!({"SummonUnit": {"response": ["unit_list"]}})).await;
        Mock::given(method("POST"))
            .and(path("/profiles/sync/"))
            .and(header("Authorization", "Token abc"))
            .and(body_json(json!({"data": {"response": {"unit_list": [1]}}})))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let mut up = uploader(&server, both_enabled(), TokenStore::from_pairs([("9", "abc")]));
        let event = ApiEvent::new("SummonUnit", r#"{"wizard_id": 9}"#, r#"{"unit_list": [1]}"#);

        assert_eq!(up.on_event(&event).await.unwrap(), EventOutcome::Handled);
    }

    #[tokio::test]
    async fn test_profile_upload_starts_job_poll() {
        let server = MockServer::start().await;
        mount_schemas(&server, json!({})).await;
        let response = r#"{"wizard_info": {"wizard_id": 7, "wizard_name": "Tester"}}"#;
        Mock::given(method("POST"))
            .and(path("/profiles/upload/"))
            .and(body_json(serde_json::from_str::<serde_json::Value>(response).unwrap()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"job_id": "job-1"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/profiles/upload/job-1/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "SUCCESS"})))
            .expect(1)
            .mount(&server)
            .await;

        let mut up = uploader(&server, both_enabled(), TokenStore::from_pairs([("7", "tok")]));
        let event = ApiEvent::new("HubUserLogin", "{}", response);

        assert_eq!(up.on_event(&event).await.unwrap(), EventOutcome::Handled);
        assert_eq!(up.polls.len(), 1);

        let handle = up.polls.pop().unwrap();
        assert_eq!(handle.job_id(), "job-1");
        assert_eq!(handle.join().await, PollOutcome::Completed { attempts: 1 });
    }

    #[tokio::test]
    async fn test_profile_conflict_is_server_error() {
        let server = MockServer::start().await;
        mount_schemas(&server, json!({})).await;
        Mock::given(method("POST"))
            .and(path("/profiles/upload/"))
            .respond_with(ResponseTemplate::new(409))
            .mount(&server)
            .await;

        let mut up = uploader(&server, both_enabled(), TokenStore::new());
        let event = ApiEvent::new("HubUserLogin", r#"{"wizard_id": 1}"#, "{}");

        assert!(matches!(
            up.on_event(&event).await,
            Err(ContractError::RemoteServer { status: 409, .. })
        ));
        assert_eq!(up.pending_polls(), 0);
    }

    #[tokio::test]
    async fn test_close_cancels_outstanding_polls() {
        let server = MockServer::start().await;
        mount_schemas(&server, json!({})).await;
        Mock::given(method("POST"))
            .and(path("/profiles/upload/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"job_id": "slow"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/profiles/upload/slow/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "PENDING"})))
            .mount(&server)
            .await;

        let config = SwarfarmConfig {
            api_url: server.uri(),
            ..SwarfarmConfig::default()
        };
        let poll = JobPollConfig {
            max_attempts: 3,
            interval_secs: 3600,
        };
        let mut up =
            SwarfarmUploader::from_config(&config, &poll, Arc::new(TokenStore::new())).unwrap();
        let event = ApiEvent::new("HubUserLogin", r#"{"wizard_id": 1}"#, "{}");

        up.on_event(&event).await.unwrap();
        assert_eq!(up.polls.len(), 1);

        up.close().await.unwrap();
        assert!(up.polls.is_empty());
    }

    /// Data log schema that also lists the profile upload command
    fn login_logging_schema() -> serde_json::Value {
        json!({
            "HubUserLogin": {
                "request": ["wizard_id"],
                "response": ["wizard_info"]
            }
        })
    }

    fn login_event() -> ApiEvent {
        ApiEvent::new(
            "HubUserLogin",
            r#"{"wizard_id": 7}"#,
            r#"{"wizard_info": {"wizard_id": 7, "wizard_name": "Tester"}, "unit_list": []}"#,
        )
    }

    async fn mount_login_data_log(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/data_logs/"))
            .and(body_json(json!({
                "data": {
                    "request": {"wizard_id": 7},
                    "response": {"wizard_info": {"wizard_id": 7, "wizard_name": "Tester"}}
                }
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_command_on_both_paths_uploads_twice() {
        let server = MockServer::start().await;
        mount_schema_pair(&server, login_logging_schema(), json!({})).await;
        Mock::given(method("POST"))
            .and(path("/profiles/upload/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"job_id": "job-2"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/profiles/upload/job-2/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "SUCCESS"})))
            .mount(&server)
            .await;
        mount_login_data_log(&server).await;

        let mut up = uploader(&server, both_enabled(), TokenStore::from_pairs([("7", "tok")]));

        assert_eq!(up.on_event(&login_event()).await.unwrap(), EventOutcome::Handled);
        assert_eq!(up.polls.len(), 1);
        up.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_profile_failure_still_uploads_data_log() {
        let server = MockServer::start().await;
        mount_schema_pair(&server, login_logging_schema(), json!({})).await;
        Mock::given(method("POST"))
            .and(path("/profiles/upload/"))
            .respond_with(ResponseTemplate::new(409))
            .expect(1)
            .mount(&server)
            .await;
        mount_login_data_log(&server).await;

        let mut up = uploader(&server, both_enabled(), TokenStore::from_pairs([("7", "tok")]));

        let err = up.on_event(&login_event()).await.unwrap_err();
        match err {
            ContractError::RemoteServer {
                endpoint, status, ..
            } => {
                assert_eq!(status, 409);
                assert!(endpoint.ends_with("/profiles/upload/"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(up.polls.is_empty());
    }

    #[tokio::test]
    async fn test_finished_polls_are_pruned_on_next_event() {
        let server = MockServer::start().await;
        mount_schemas(&server, json!({})).await;
        Mock::given(method("POST"))
            .and(path("/profiles/upload/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"job_id": "job-3"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/profiles/upload/job-3/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "SUCCESS"})))
            .mount(&server)
            .await;

        let mut up = uploader(&server, both_enabled(), TokenStore::new());
        let login = ApiEvent::new("HubUserLogin", r#"{"wizard_id": 1}"#, "{}");
        up.on_event(&login).await.unwrap();
        assert_eq!(up.polls.len(), 1);

        while up.pending_polls() > 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        let other = ApiEvent::new("GetMailList", "{}", "{}");
        assert_eq!(up.on_event(&other).await.unwrap(), EventOutcome::Ignored);
        assert!(up.polls.is_empty());
    }
}
