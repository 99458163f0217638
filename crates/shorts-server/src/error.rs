//! API error types.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use shorts_core::api::ErrorResponse;
use shorts_core::CoreError;
use shorts_storage::StorageError;
use thiserror::Error;
use tracing::debug;

/// API errors.
///
/// Validation and storage failures both answer 400; clients treat every
/// failure the same way and keep their local state.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or incomplete request.
    #[error("{0}")]
    BadRequest(String),

    /// Identifier or version failed validation.
    #[error("{0}")]
    Invalid(#[from] CoreError),

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Storage error, including unknown installation references.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ApiError {
    /// The error for a request without an installation id.
    pub fn missing_installation_id() -> Self {
        ApiError::BadRequest("Installation ID is required".to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Invalid(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::Storage(StorageError::UnknownInstallation(_)) => {
                (StatusCode::BAD_REQUEST, "unknown_installation")
            }
            ApiError::Storage(_) => (StatusCode::BAD_REQUEST, "storage_error"),
        };
        debug!(code, "Request failed: {}", self);

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, axum::Json(body)).into_response()
    }
}

/// Result type for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;
