//! Storage error types.
//!
//! Each variant names the document or collection involved so a failure can
//! be traced from the log line alone.

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Failed to open the storage backend at the given path.
    #[error("failed to open storage at '{path}': {reason}")]
    Open { path: String, reason: String },

    /// Failed to read a document.
    #[error("failed to read '{key}': {reason}")]
    Read { key: String, reason: String },

    /// Failed to write a document.
    #[error("failed to write '{key}': {reason}")]
    Write { key: String, reason: String },

    /// Failed to delete a document.
    #[error("failed to delete '{key}': {reason}")]
    Delete { key: String, reason: String },

    /// Failed to enumerate a collection.
    #[error("failed to list collection '{collection}': {reason}")]
    List { collection: String, reason: String },

    /// Failed to begin or commit a transaction.
    #[error("transaction failed: {reason}")]
    Transaction { reason: String },

    /// A collection name or document id was malformed.
    #[error("invalid key: {reason}")]
    InvalidKey { reason: String },
}
