//! Layered error definitions
//!
//! Categorized by source: config / event decoding / export / remote

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Event Errors =====
    /// Request or response body is not a JSON object
    #[error("failed to deserialize {part} of '{command}': {source}")]
    Deserialization {
        command: String,
        part: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Well-formed JSON that lacks a field the handler needs
    #[error("incomplete data at '{field}': {message}")]
    Validation { field: String, message: String },

    /// Normalized structure could not be re-encoded
    #[error("serialization failed: {message}")]
    Serialization { message: String },

    /// Handler received a command it does not own
    #[error("handler '{handler}' does not handle command '{command}'")]
    UnknownCommand { handler: String, command: String },

    // ===== Remote Errors =====
    /// Remote host unreachable
    #[error("remote transport error for '{endpoint}': {message}")]
    RemoteTransport { endpoint: String, message: String },

    /// HTTP 401
    #[error("remote authentication error for '{endpoint}': {detail}")]
    RemoteAuth { endpoint: String, detail: String },

    /// HTTP 400
    #[error("remote rejected request for '{endpoint}': {detail}")]
    RemoteRequest { endpoint: String, detail: String },

    /// Any other non-200 status
    #[error("remote server error for '{endpoint}' (status {status}): {detail}")]
    RemoteServer {
        endpoint: String,
        status: u16,
        detail: String,
    },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create incomplete data error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create unknown command error
    pub fn unknown_command(handler: impl Into<String>, command: impl Into<String>) -> Self {
        Self::UnknownCommand {
            handler: handler.into(),
            command: command.into(),
        }
    }

    /// Whether the error came from a remote service rather than local data
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::RemoteTransport { .. }
                | Self::RemoteAuth { .. }
                | Self::RemoteRequest { .. }
                | Self::RemoteServer { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_names_field() {
        let err = ContractError::validation("building_list", "missing");
        assert_eq!(
            err.to_string(),
            "incomplete data at 'building_list': missing"
        );
    }

    #[test]
    fn test_is_remote() {
        let auth = ContractError::RemoteAuth {
            endpoint: "data_logs".into(),
            detail: "bad token".into(),
        };
        assert!(auth.is_remote());
        assert!(!ContractError::serialization("x").is_remote());
    }
}
