//! In-memory document backend.
//!
//! Collections are `BTreeMap`s keyed by document id, held behind a single
//! `RwLock`. Nothing is persisted; all data is lost when the process exits.

use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::{StorageBackend, StorageError, check_segment};

type Collections = BTreeMap<String, BTreeMap<String, Vec<u8>>>;

/// An in-memory storage backend.
///
/// Cloning is cheap and clones share the same data, which lets tests keep a
/// handle on the backend after handing it to the record store.
///
/// # Examples
///
/// ```
/// # use capupdate_storage::{MemoryBackend, StorageBackend};
/// # #[tokio::main]
/// # async fn main() {
/// let backend = MemoryBackend::new();
/// backend.put("apps", "abc", b"{}").await.unwrap();
/// let val = backend.get("apps", "abc").await.unwrap();
/// assert_eq!(val, Some(b"{}".to_vec()));
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    collections: Arc<RwLock<Collections>>,
}

impl MemoryBackend {
    /// Create a new empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl StorageBackend for MemoryBackend {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Vec<u8>>, StorageError> {
        check_segment("collection", collection)?;
        check_segment("id", id)?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn put(&self, collection: &str, id: &str, value: &[u8]) -> Result<(), StorageError> {
        check_segment("collection", collection)?;
        check_segment("id", id)?;
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_owned())
            .or_default()
            .insert(id.to_owned(), value.to_vec());
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StorageError> {
        check_segment("collection", collection)?;
        check_segment("id", id)?;
        let mut collections = self.collections.write().await;
        if let Some(docs) = collections.get_mut(collection) {
            docs.remove(id);
        }
        Ok(())
    }

    async fn list(&self, collection: &str) -> Result<Vec<(String, Vec<u8>)>, StorageError> {
        check_segment("collection", collection)?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, value)| (id.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn exists(&self, collection: &str, id: &str) -> Result<bool, StorageError> {
        check_segment("collection", collection)?;
        check_segment("id", id)?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .is_some_and(|docs| docs.contains_key(id)))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_missing_returns_none() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.get("apps", "nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn put_overwrites_existing() {
        let backend = MemoryBackend::new();
        backend.put("apps", "a", b"v1").await.unwrap();
        backend.put("apps", "a", b"v2").await.unwrap();
        assert_eq!(backend.get("apps", "a").await.unwrap(), Some(b"v2".to_vec()));
    }

    #[tokio::test]
    async fn collections_are_isolated() {
        let backend = MemoryBackend::new();
        backend.put("apps", "a", b"1").await.unwrap();
        backend.put("drafts", "a", b"2").await.unwrap();

        assert_eq!(backend.get("apps", "a").await.unwrap(), Some(b"1".to_vec()));
        assert_eq!(backend.list("drafts").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_then_get_is_none_and_repeat_delete_is_noop() {
        let backend = MemoryBackend::new();
        backend.put("apps", "a", b"1").await.unwrap();
        backend.delete("apps", "a").await.unwrap();
        backend.delete("apps", "a").await.unwrap();
        assert!(!backend.exists("apps", "a").await.unwrap());
    }

    #[tokio::test]
    async fn list_returns_documents_ordered_by_id() {
        let backend = MemoryBackend::new();
        backend.put("apps", "b", b"2").await.unwrap();
        backend.put("apps", "a", b"1").await.unwrap();

        let docs = backend.list("apps").await.unwrap();
        assert_eq!(
            docs,
            vec![("a".to_owned(), b"1".to_vec()), ("b".to_owned(), b"2".to_vec())]
        );
    }

    #[tokio::test]
    async fn list_unknown_collection_is_empty() {
        let backend = MemoryBackend::new();
        assert!(backend.list("apps").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn invalid_id_is_rejected() {
        let backend = MemoryBackend::new();
        let err = backend.put("apps", "a/b", b"1").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey { .. }));
    }

    #[tokio::test]
    async fn clone_shares_state() {
        let backend = MemoryBackend::new();
        let clone = backend.clone();
        backend.put("apps", "a", b"1").await.unwrap();
        assert!(clone.exists("apps", "a").await.unwrap());
    }
}
