//! Error types for `capupdate-core`.
//!
//! Errors carry the record id or store operation involved. None of them
//! ever carry a password, hashed or not.

use capupdate_storage::StorageError;

use crate::validate::FieldErrors;

/// Errors from the record store adapter.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing store did not answer within the configured timeout.
    #[error("store unavailable: {operation} timed out after {timeout_ms}ms")]
    Unavailable {
        operation: &'static str,
        timeout_ms: u64,
    },

    /// The backing store returned an error.
    #[error("store error: {0}")]
    Storage(#[from] StorageError),

    /// A stored document could not be encoded or decoded.
    #[error("record '{id}' is corrupt: {reason}")]
    Corrupt { id: String, reason: String },
}

/// Errors from catalog operations.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Submitted fields failed validation.
    #[error("invalid form data")]
    Validation(FieldErrors),

    /// No record id was supplied.
    #[error("application id is required")]
    InvalidId,

    /// No record exists under the given id.
    #[error("application '{id}' not found")]
    NotFound { id: String },

    /// The supplied password does not match the stored credential.
    #[error("incorrect password")]
    Unauthorized,

    /// The record store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Anything else that should never reach a caller.
    #[error("internal error: {reason}")]
    Internal { reason: String },
}
