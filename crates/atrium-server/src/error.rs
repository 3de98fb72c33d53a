//! HTTP error types for the Atrium server.
//!
//! Maps domain errors from `atrium-core` into appropriate HTTP responses.
//! Every error variant produces a JSON body with a machine-readable `error`
//! field and a human-readable `message`. Messages never contain secret
//! values because the engine's errors never do.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use atrium_core::ConfigError;

/// Application-level error returned from HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Requested section or field not found.
    NotFound(String),
    /// Client sent invalid input (bad edits, validation failure).
    BadRequest(String),
    /// The backing secret store is unreachable.
    ServiceUnavailable(String),
    /// Internal server error (partial save, audit failure).
    Internal(String),
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            Self::ServiceUnavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "store_unavailable",
                msg,
            ),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg),
        };

        let body = ErrorBody {
            error: error_type,
            message,
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::SectionNotFound { .. } | ConfigError::FieldNotFound { .. } => {
                Self::NotFound(err.to_string())
            }
            ConfigError::FieldValidationFailed { .. } | ConfigError::InvalidRequest { .. } => {
                Self::BadRequest(err.to_string())
            }
            ConfigError::SecretStoreUnavailable(_) => Self::ServiceUnavailable(err.to_string()),
            ConfigError::PartialSave { .. }
            | ConfigError::Serialization { .. }
            | ConfigError::AuditRefused(_) => Self::Internal(err.to_string()),
        }
    }
}
