//! Core error types.

use thiserror::Error;

/// Errors raised by the extension-side logic.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The browser persistence API is missing or threw.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// The receiving context is gone or rejected the message.
    #[error("messaging failed: {0}")]
    Messaging(String),

    /// The peer answered with a response of the wrong kind.
    #[error("unexpected response to {0}")]
    UnexpectedResponse(&'static str),

    /// Installation identifier failed validation.
    #[error("invalid installation id: {0}")]
    InvalidId(String),

    /// Client version string failed validation.
    #[error("invalid version: {0}")]
    InvalidVersion(String),

    /// HTTP request to the backend failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("backend returned {status}: {message}")]
    Remote { status: u16, message: String },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
