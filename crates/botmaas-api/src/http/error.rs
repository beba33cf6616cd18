//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use botmaas_types::error::{CloneError, RepositoryError};

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Clone engine errors.
    Clone(CloneError),
    /// Authentication failure.
    Unauthorized(String),
    /// Validation error.
    Validation(String),
    /// A looked-up resource does not exist.
    NotFound(String),
    /// Generic internal error.
    Internal(String),
}

impl From<CloneError> for AppError {
    fn from(e: CloneError) -> Self {
        AppError::Clone(e)
    }
}

impl From<RepositoryError> for AppError {
    fn from(e: RepositoryError) -> Self {
        AppError::Clone(e.into())
    }
}

impl AppError {
    /// Status, machine-readable code, message, and whether a retry may succeed.
    fn parts(&self) -> (StatusCode, &'static str, String, bool) {
        match self {
            AppError::Clone(e @ CloneError::InvalidRequest(_)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string(), false)
            }
            AppError::Clone(e @ CloneError::OriginNotFound(_)) => {
                (StatusCode::NOT_FOUND, "ORIGIN_NOT_FOUND", e.to_string(), false)
            }
            AppError::Clone(e @ CloneError::PermissionDenied { .. }) => {
                (StatusCode::FORBIDDEN, "PERMISSION_DENIED", e.to_string(), false)
            }
            AppError::Clone(e @ CloneError::DuplicationConflict(_)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "DUPLICATION_CONFLICT", e.to_string(), false)
            }
            AppError::Clone(e @ CloneError::DuplicateProducedId(_)) => {
                (StatusCode::CONFLICT, "DUPLICATE_PRODUCED_ID", e.to_string(), false)
            }
            AppError::Clone(e @ CloneError::Storage { retryable: true, .. }) => {
                (StatusCode::SERVICE_UNAVAILABLE, "STORAGE_UNAVAILABLE", e.to_string(), true)
            }
            AppError::Clone(e @ CloneError::Storage { .. }) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR", e.to_string(), false)
            }
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone(), false),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone(), false),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone(), false),
            AppError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg.clone(), false)
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, retryable) = self.parts();

        if status.is_server_error() {
            tracing::error!(code, %message, "request failed");
        }

        let body = json!({
            "data": null,
            "meta": {
                "request_id": uuid::Uuid::now_v7().to_string(),
                "timestamp": chrono::Utc::now().to_rfc3339(),
                "response_time_ms": 0
            },
            "errors": [{
                "code": code,
                "message": message,
                "retryable": retryable,
            }]
        });

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}
