//! JobPoller - track asynchronous profile import jobs
//!
//! A poll runs as a background task with a fixed attempt budget and a fixed
//! delay between attempts. The returned `PollHandle` can cancel the task or
//! join it.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::client::{SwarfarmEndpoints, UploadClient, UploadOutcome};

/// `status` value that marks a finished import
pub const JOB_COMPLETE_STATUS: &str = "SUCCESS";

/// Attempt budget and spacing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            interval: Duration::from_secs(10),
        }
    }
}

impl From<&contracts::JobPollConfig> for PollPolicy {
    fn from(config: &contracts::JobPollConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            interval: Duration::from_secs(config.interval_secs),
        }
    }
}

/// How a poll ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Remote reported the terminal status
    Completed { attempts: u32 },
    /// Status check was rejected with 401
    Unauthorized { attempts: u32 },
    /// Budget used up without a terminal status
    Exhausted { attempts: u32 },
    /// Stopped through the handle
    Cancelled { attempts: u32 },
    /// Task panicked; attempts made before the panic are unknown
    Panicked,
}

impl PollOutcome {
    pub fn attempts(&self) -> u32 {
        match *self {
            Self::Completed { attempts }
            | Self::Unauthorized { attempts }
            | Self::Exhausted { attempts }
            | Self::Cancelled { attempts } => attempts,
            Self::Panicked => 0,
        }
    }
}

/// Job status lookup
#[trait_variant::make(JobStatusSource: Send)]
pub trait LocalJobStatusSource {
    async fn job_status(&self, job_id: &str, credential: &str) -> UploadOutcome;
}

/// Job status over HTTP: `GET {api}/profiles/upload/<job_id>/`
#[derive(Debug, Clone)]
pub struct JobStatusClient {
    client: UploadClient,
    endpoints: SwarfarmEndpoints,
}

impl JobStatusClient {
    pub fn new(client: UploadClient, endpoints: SwarfarmEndpoints) -> Self {
        Self { client, endpoints }
    }
}

impl JobStatusSource for JobStatusClient {
    async fn job_status(&self, job_id: &str, credential: &str) -> UploadOutcome {
        self.client
            .get(&self.endpoints.job_status(job_id), credential)
            .await
    }
}

/// Handle to a running poll task
#[derive(Debug)]
pub struct PollHandle {
    job_id: String,
    cancel: CancellationToken,
    task: JoinHandle<PollOutcome>,
}

impl PollHandle {
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Ask the task to stop at its next await point
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the task to end
    pub async fn join(self) -> PollOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) if e.is_panic() => {
                error!(job_id = %self.job_id, error = ?e, "Poll task panicked");
                PollOutcome::Panicked
            }
            Err(e) => {
                warn!(job_id = %self.job_id, error = ?e, "Poll task aborted");
                PollOutcome::Cancelled { attempts: 0 }
            }
        }
    }
}

/// Spawns poll tasks against a status source
pub struct JobPoller<S = JobStatusClient> {
    source: Arc<S>,
    policy: PollPolicy,
}

impl<S> JobPoller<S> {
    pub fn new(source: S, policy: PollPolicy) -> Self {
        Self {
            source: Arc::new(source),
            policy,
        }
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }
}

impl<S: JobStatusSource + Sync + 'static> JobPoller<S> {
    /// Start polling `job_id` in the background
    pub fn spawn(&self, job_id: impl Into<String>, credential: impl Into<String>) -> PollHandle {
        let job_id = job_id.into();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(poll_job(
            Arc::clone(&self.source),
            job_id.clone(),
            credential.into(),
            self.policy,
            cancel.clone(),
        ));

        PollHandle {
            job_id,
            cancel,
            task,
        }
    }
}

#[instrument(name = "job_poll", skip(source, credential, policy, cancel))]
async fn poll_job<S: JobStatusSource + Sync>(
    source: Arc<S>,
    job_id: String,
    credential: String,
    policy: PollPolicy,
    cancel: CancellationToken,
) -> PollOutcome {
    let mut attempts = 0;

    while attempts < policy.max_attempts {
        if attempts > 0 {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return PollOutcome::Cancelled { attempts },
                _ = tokio::time::sleep(policy.interval) => {}
            }
        }

        attempts += 1;
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return PollOutcome::Cancelled { attempts },
            outcome = source.job_status(&job_id, &credential) => outcome,
        };

        match outcome {
            UploadOutcome::Success(body) if is_complete(&body) => {
                info!(attempts, "SWARFARM profile import complete");
                return PollOutcome::Completed { attempts };
            }
            UploadOutcome::Success(body) => {
                debug!(attempts, status = ?body.get("status"), "Import still pending");
            }
            UploadOutcome::AuthFailure { detail } => {
                error!(attempts, %detail, "Could not check for job - access unauthorized");
                return PollOutcome::Unauthorized { attempts };
            }
            other => {
                warn!(attempts, outcome = other.label(), "Failed to check profile upload status");
            }
        }
    }

    error!(
        max_attempts = policy.max_attempts,
        "Aborting upload check - too many failed retries"
    );
    PollOutcome::Exhausted { attempts }
}

fn is_complete(body: &Value) -> bool {
    body.get("status").and_then(Value::as_str) == Some(JOB_COMPLETE_STATUS)
}
