//! Dispatcher error types

use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Rejected dispatcher settings
    #[error("invalid dispatcher config: {0}")]
    InvalidConfig(String),

    /// Queue full - event dropped
    #[error("queue full for handler '{handler}', event '{command}' dropped")]
    QueueFull { handler: String, command: String },

    /// Worker already stopped
    #[error("worker for handler '{handler}' is closed")]
    WorkerClosed { handler: String },
}

impl DispatcherError {
    pub fn queue_full(handler: impl Into<String>, command: impl Into<String>) -> Self {
        Self::QueueFull {
            handler: handler.into(),
            command: command.into(),
        }
    }
}
