//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Bad `--api-token` argument
    #[error("invalid api token '{value}': {message}")]
    InvalidTokenArg { value: String, message: String },

    /// Event input line that is not a valid event object
    #[error("invalid event: {message}")]
    InvalidEvent { message: String },
}

impl CliError {
    pub fn invalid_token_arg(value: &str, message: impl Into<String>) -> Self {
        // keep the identity, never echo the token
        let value = match value.split_once('=') {
            Some((wizard_id, _)) => format!("{wizard_id}=***"),
            None => value.to_string(),
        };
        Self::InvalidTokenArg {
            value,
            message: message.into(),
        }
    }

    pub fn invalid_event(message: impl Into<String>) -> Self {
        Self::InvalidEvent {
            message: message.into(),
        }
    }
}
