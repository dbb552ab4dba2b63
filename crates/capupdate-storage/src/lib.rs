//! Document storage abstraction for `CapUpdate`.
//!
//! This crate defines the [`StorageBackend`] trait, a collection-scoped
//! document store that knows nothing about applications, passwords, or
//! validation. The record store in `capupdate-core` serializes records and
//! hands the bytes to this layer.
//!
//! Three implementations are provided:
//!
//! - [`RocksDbBackend`]: production default, backed by `RocksDB` (feature `rocksdb-backend`)
//! - [`RedbBackend`]: pure-Rust alternative, backed by redb (feature `redb-backend`)
//! - [`MemoryBackend`]: in-memory, for development and tests

mod error;
mod memory;
#[cfg(feature = "redb-backend")]
mod redb_backend;
#[cfg(feature = "rocksdb-backend")]
mod rocksdb_backend;

pub use error::StorageError;
pub use memory::MemoryBackend;
#[cfg(feature = "redb-backend")]
pub use redb_backend::RedbBackend;
#[cfg(feature = "rocksdb-backend")]
pub use rocksdb_backend::RocksDbBackend;

/// A pluggable document storage backend.
///
/// Documents are opaque byte values addressed by a `(collection, id)` pair.
/// Both parts must be non-empty and must not contain `/`, which backends use
/// internally as a separator.
///
/// Implementations must be safe to share across async tasks (`Send + Sync`).
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync + 'static {
    /// Retrieve a document by id.
    ///
    /// Returns `Ok(None)` if the document does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Read`] if the underlying backend fails.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Store a document, overwriting any existing value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Write`] if the underlying backend fails.
    async fn put(&self, collection: &str, id: &str, value: &[u8]) -> Result<(), StorageError>;

    /// Remove a document. Removing a missing document is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Delete`] if the underlying backend fails.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StorageError>;

    /// Return every document in a collection as `(id, value)` pairs,
    /// ordered by id.
    ///
    /// An unknown collection yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::List`] if the underlying backend fails.
    async fn list(&self, collection: &str) -> Result<Vec<(String, Vec<u8>)>, StorageError>;

    /// Check whether a document exists.
    ///
    /// The default implementation calls [`get`](StorageBackend::get) and checks
    /// for `Some`. Backends may override this with a cheaper check.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Read`] if the underlying backend fails.
    async fn exists(&self, collection: &str, id: &str) -> Result<bool, StorageError> {
        Ok(self.get(collection, id).await?.is_some())
    }
}

/// Reject collection names and ids that would break key namespacing.
pub(crate) fn check_segment(kind: &str, value: &str) -> Result<(), StorageError> {
    if value.is_empty() {
        return Err(StorageError::InvalidKey {
            reason: format!("{kind} must not be empty"),
        });
    }
    if value.contains('/') {
        return Err(StorageError::InvalidKey {
            reason: format!("{kind} '{value}' must not contain '/'"),
        });
    }
    Ok(())
}

/// Build the flat `collection/id` key used by key-value backends.
pub(crate) fn document_key(collection: &str, id: &str) -> Result<String, StorageError> {
    check_segment("collection", collection)?;
    check_segment("id", id)?;
    Ok(format!("{collection}/{id}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn document_key_joins_segments() {
        assert_eq!(document_key("apps", "abc123").unwrap(), "apps/abc123");
    }

    #[test]
    fn document_key_rejects_empty_and_slashes() {
        assert!(matches!(
            document_key("", "abc"),
            Err(StorageError::InvalidKey { .. })
        ));
        assert!(matches!(
            document_key("apps", ""),
            Err(StorageError::InvalidKey { .. })
        ));
        assert!(matches!(
            document_key("apps", "a/b"),
            Err(StorageError::InvalidKey { .. })
        ));
    }
}
