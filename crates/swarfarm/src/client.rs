//! UploadClient - JSON submission with status-code classification
//!
//! No retries here; callers decide (see `poller`).

use contracts::ContractError;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Result of one remote call
#[derive(Debug, Clone, PartialEq)]
pub enum UploadOutcome {
    /// HTTP 200; body parsed as JSON (`Null` if empty or not JSON)
    Success(Value),
    /// HTTP 401
    AuthFailure { detail: String },
    /// HTTP 400
    InvalidRequest { detail: String },
    /// Any other non-200 status
    ServerError { status: u16, detail: String },
    /// Host unreachable, timeout, broken connection
    TransportFailure { message: String },
}

impl UploadOutcome {
    /// Short label for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::AuthFailure { .. } => "auth_failure",
            Self::InvalidRequest { .. } => "invalid_request",
            Self::ServerError { .. } => "server_error",
            Self::TransportFailure { .. } => "transport_failure",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Convert to the error taxonomy, keeping the success body
    pub fn into_result(self, endpoint: &str) -> Result<Value, ContractError> {
        let endpoint = endpoint.to_string();
        match self {
            Self::Success(body) => Ok(body),
            Self::AuthFailure { detail } => Err(ContractError::RemoteAuth { endpoint, detail }),
            Self::InvalidRequest { detail } => {
                Err(ContractError::RemoteRequest { endpoint, detail })
            }
            Self::ServerError { status, detail } => Err(ContractError::RemoteServer {
                endpoint,
                status,
                detail,
            }),
            Self::TransportFailure { message } => {
                Err(ContractError::RemoteTransport { endpoint, message })
            }
        }
    }

    /// Classify a completed HTTP exchange
    pub fn from_response(status: StatusCode, body: &[u8]) -> Self {
        let parsed: Value = serde_json::from_slice(body).unwrap_or(Value::Null);
        match status {
            StatusCode::OK => Self::Success(parsed),
            StatusCode::UNAUTHORIZED => Self::AuthFailure {
                detail: detail_of(&parsed),
            },
            StatusCode::BAD_REQUEST => Self::InvalidRequest {
                detail: detail_of(&parsed),
            },
            other => Self::ServerError {
                status: other.as_u16(),
                detail: detail_of(&parsed),
            },
        }
    }
}

fn detail_of(body: &Value) -> String {
    body.get("detail")
        .and_then(Value::as_str)
        .unwrap_or("no detail")
        .to_string()
}

/// HTTP client for uploads and job status checks
#[derive(Debug, Clone)]
pub struct UploadClient {
    http: Client,
}

impl UploadClient {
    /// Create a client with a per-request timeout
    pub fn new(timeout: Duration) -> Result<Self, ContractError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ContractError::Other(format!("failed to build http client: {e}")))?;
        Ok(Self { http })
    }

    /// Wrap an existing reqwest client
    pub fn with_client(http: Client) -> Self {
        Self { http }
    }

    /// Underlying reqwest client
    pub fn http(&self) -> &Client {
        &self.http
    }

    /// POST `payload` encoded as JSON
    ///
    /// A payload that cannot be encoded never reaches the network.
    pub async fn submit_json<T: Serialize + ?Sized>(
        &self,
        url: &str,
        credential: &str,
        payload: &T,
    ) -> Result<UploadOutcome, ContractError> {
        let body = serde_json::to_vec(payload).map_err(|e| {
            ContractError::serialization(format!("payload for '{url}': {e}"))
        })?;
        Ok(self.submit_raw(url, credential, body).await)
    }

    /// POST an already-encoded JSON body unchanged
    pub async fn submit_raw(
        &self,
        url: &str,
        credential: &str,
        body: impl Into<reqwest::Body>,
    ) -> UploadOutcome {
        let request = self
            .http
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        self.send(authorize(request, credential), url).await
    }

    /// GET `url` with the same authorization rules
    pub async fn get(&self, url: &str, credential: &str) -> UploadOutcome {
        let request = self
            .http
            .get(url)
            .header(CONTENT_TYPE, "application/json");
        self.send(authorize(request, credential), url).await
    }

    async fn send(&self, request: RequestBuilder, url: &str) -> UploadOutcome {
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                return UploadOutcome::TransportFailure {
                    message: e.to_string(),
                }
            }
        };

        let status = response.status();
        match response.bytes().await {
            Ok(body) => {
                debug!(url, status = status.as_u16(), bytes = body.len(), "Remote call finished");
                UploadOutcome::from_response(status, &body)
            }
            Err(e) => UploadOutcome::TransportFailure {
                message: format!("failed to read response body: {e}"),
            },
        }
    }
}

/// Attach `Authorization: Token <credential>` unless anonymous
fn authorize(request: RequestBuilder, credential: &str) -> RequestBuilder {
    if credential.is_empty() {
        request
    } else {
        request.header(AUTHORIZATION, format!("Token {credential}"))
    }
}

/// SWARFARM API routes relative to the configured API root
#[derive(Debug, Clone)]
pub struct SwarfarmEndpoints {
    api_url: String,
}

impl SwarfarmEndpoints {
    pub fn new(api_url: impl Into<String>) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Self { api_url }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn data_log_upload(&self) -> String {
        format!("{}/data_logs/", self.api_url)
    }

    pub fn data_log_schema(&self) -> String {
        format!("{}/data_logs/", self.api_url)
    }

    pub fn live_sync_upload(&self) -> String {
        format!("{}/profiles/sync/", self.api_url)
    }

    pub fn live_sync_schema(&self) -> String {
        format!("{}/profiles/accepted-commands/", self.api_url)
    }

    pub fn profile_upload(&self) -> String {
        format!("{}/profiles/upload/", self.api_url)
    }

    pub fn job_status(&self, job_id: &str) -> String {
        format!("{}/profiles/upload/{}/", self.api_url, job_id)
    }
}
