//! Error Types

use thiserror::Error;

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

/// Agent error types
///
/// Only endpoint-level failures (`Api`, `Timeout`, `Transport`, `Parse`)
/// abort a turn. Tool-level failures are absorbed into model-visible text
/// by the registry and never appear here.
#[derive(Error, Debug)]
pub enum AgentError {
    /// Completion endpoint returned a non-success status
    #[error("completion endpoint returned {status}: {body}")]
    Api { status: u16, body: String },

    /// Completion request exceeded the bounded wait
    #[error("completion request timed out after {0}s")]
    Timeout(u64),

    /// Network-level failure talking to the completion endpoint
    #[error("transport error: {0}")]
    Transport(String),

    /// Completion response body did not have the expected shape
    #[error("parse error: {0}")]
    Parse(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AgentError {
    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            AgentError::Api { status, .. } => {
                format!("The completion service rejected the request (HTTP {status}).")
            }
            AgentError::Timeout(_) => {
                "The completion service took too long to respond. Please try again.".into()
            }
            AgentError::Transport(_) => {
                "Could not reach the completion service. Please check the connection.".into()
            }
            AgentError::Parse(_) => {
                "The completion service sent a response that could not be understood.".into()
            }
            AgentError::Config(msg) => format!("Configuration problem: {msg}"),
            _ => "An unexpected error occurred.".into(),
        }
    }
}
