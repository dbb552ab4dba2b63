//! HTTP error types for the `CapUpdate` server.
//!
//! Maps catalog errors into JSON responses of the form
//! `{"success": false, "error": <code>, "message": ..., "fieldErrors": {...}}`.
//! Store failures are logged here with full detail and reported to the
//! caller only as a generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use capupdate_core::error::{CatalogError, StoreError};
use capupdate_core::validate::FieldErrors;

/// Application-level error returned from HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Submitted form fields were invalid.
    Validation(FieldErrors),
    /// Client sent an unusable request.
    BadRequest(String),
    /// Password did not match.
    Unauthorized(String),
    /// Requested application not found.
    NotFound(String),
    /// Request body exceeded the configured limit.
    PayloadTooLarge(String),
    /// The backing store did not respond in time.
    Unavailable(String),
    /// Internal server error. The detail is logged, never returned.
    Internal(String),
}

/// JSON error response body.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    success: bool,
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field_errors: Option<FieldErrors>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut field_errors = None;
        let (status, error_type, message) = match self {
            Self::Validation(fields) => {
                field_errors = Some(fields);
                (
                    StatusCode::BAD_REQUEST,
                    "validation_failed",
                    "Invalid form data.".to_owned(),
                )
            }
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            Self::PayloadTooLarge(msg) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large", msg)
            }
            Self::Unavailable(detail) => {
                tracing::error!(error = %detail, "store unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "unavailable",
                    "storage is temporarily unavailable".to_owned(),
                )
            }
            Self::Internal(detail) => {
                tracing::error!(error = %detail, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal server error".to_owned(),
                )
            }
        };

        let body = ErrorBody {
            success: false,
            error: error_type,
            message,
            field_errors,
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Validation(fields) => Self::Validation(fields),
            CatalogError::InvalidId => Self::BadRequest("Application ID is required.".to_owned()),
            CatalogError::NotFound { .. } => Self::NotFound("Application not found.".to_owned()),
            CatalogError::Unauthorized => Self::Unauthorized("Incorrect password.".to_owned()),
            CatalogError::Store(ref inner) => match inner {
                StoreError::Unavailable { .. } => Self::Unavailable(err.to_string()),
                StoreError::Storage(_) | StoreError::Corrupt { .. } => {
                    Self::Internal(err.to_string())
                }
            },
            CatalogError::Internal { .. } => Self::Internal(err.to_string()),
        }
    }
}
