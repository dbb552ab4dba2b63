//! `RocksDB` document backend: the production default.
//!
//! Every document lives in the default column family under the flat key
//! `collection/id`. Listing a collection is a forward scan from the
//! `collection/` prefix. All calls are dispatched to the blocking pool via
//! [`tokio::task::spawn_blocking`] since `RocksDB` is a synchronous C++ library.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rocksdb::{DBWithThreadMode, Direction, IteratorMode, MultiThreaded, Options};

use crate::{StorageBackend, StorageError, check_segment, document_key};

type Db = DBWithThreadMode<MultiThreaded>;

/// A storage backend backed by `RocksDB`.
///
/// # Examples
///
/// ```no_run
/// # use capupdate_storage::RocksDbBackend;
/// let backend = RocksDbBackend::open("/var/lib/capupdate/data").unwrap();
/// ```
#[derive(Clone)]
pub struct RocksDbBackend {
    db: Arc<Db>,
    path: PathBuf,
}

impl std::fmt::Debug for RocksDbBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RocksDbBackend")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl RocksDbBackend {
    /// Open a `RocksDB` database at the given path, creating it if missing.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Open`] if `RocksDB` fails to open or create the
    /// database at the specified path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let mut opts = Options::default();
        opts.create_if_missing(true);

        let db = Db::open(&opts, path).map_err(|e| StorageError::Open {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            db: Arc::new(db),
            path: path.to_path_buf(),
        })
    }

    /// Return the filesystem path of this database.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn join_error(e: &tokio::task::JoinError) -> String {
    format!("blocking task panicked: {e}")
}

#[async_trait::async_trait]
impl StorageBackend for RocksDbBackend {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let key = document_key(collection, id)?;
        let db = Arc::clone(&self.db);
        let task_key = key.clone();
        tokio::task::spawn_blocking(move || {
            db.get(task_key.as_bytes()).map_err(|e| StorageError::Read {
                key: task_key,
                reason: e.to_string(),
            })
        })
        .await
        .map_err(|e| StorageError::Read {
            key,
            reason: join_error(&e),
        })?
    }

    async fn put(&self, collection: &str, id: &str, value: &[u8]) -> Result<(), StorageError> {
        let key = document_key(collection, id)?;
        let db = Arc::clone(&self.db);
        let task_key = key.clone();
        let value = value.to_vec();
        tokio::task::spawn_blocking(move || {
            db.put(task_key.as_bytes(), &value)
                .map_err(|e| StorageError::Write {
                    key: task_key,
                    reason: e.to_string(),
                })
        })
        .await
        .map_err(|e| StorageError::Write {
            key,
            reason: join_error(&e),
        })?
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StorageError> {
        let key = document_key(collection, id)?;
        let db = Arc::clone(&self.db);
        let task_key = key.clone();
        tokio::task::spawn_blocking(move || {
            db.delete(task_key.as_bytes())
                .map_err(|e| StorageError::Delete {
                    key: task_key,
                    reason: e.to_string(),
                })
        })
        .await
        .map_err(|e| StorageError::Delete {
            key,
            reason: join_error(&e),
        })?
    }

    async fn list(&self, collection: &str) -> Result<Vec<(String, Vec<u8>)>, StorageError> {
        check_segment("collection", collection)?;
        let db = Arc::clone(&self.db);
        let name = collection.to_owned();
        tokio::task::spawn_blocking(move || {
            let prefix = format!("{name}/");
            let iter = db.iterator(IteratorMode::From(prefix.as_bytes(), Direction::Forward));

            let mut docs = Vec::new();
            for item in iter {
                let (k, v) = item.map_err(|e| StorageError::List {
                    collection: name.clone(),
                    reason: e.to_string(),
                })?;
                let key = String::from_utf8(k.to_vec()).map_err(|e| StorageError::InvalidKey {
                    reason: e.to_string(),
                })?;
                let Some(id) = key.strip_prefix(&prefix) else {
                    break;
                };
                docs.push((id.to_owned(), v.to_vec()));
            }
            Ok(docs)
        })
        .await
        .map_err(|e| StorageError::List {
            collection: collection.to_owned(),
            reason: join_error(&e),
        })?
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn documents_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let backend = RocksDbBackend::open(dir.path()).unwrap();
            backend.put("apps", "a", b"1").await.unwrap();
        }
        let backend = RocksDbBackend::open(dir.path()).unwrap();
        assert_eq!(backend.get("apps", "a").await.unwrap(), Some(b"1".to_vec()));
    }

    #[tokio::test]
    async fn list_stops_at_collection_boundary() {
        let dir = tempfile::tempdir().unwrap();
        let backend = RocksDbBackend::open(dir.path()).unwrap();
        backend.put("apps", "b", b"2").await.unwrap();
        backend.put("apps", "a", b"1").await.unwrap();
        backend.put("appsx", "c", b"3").await.unwrap();
        backend.put("zzz", "d", b"4").await.unwrap();

        let ids: Vec<String> = backend
            .list("apps")
            .await
            .unwrap()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn delete_removes_document() {
        let dir = tempfile::tempdir().unwrap();
        let backend = RocksDbBackend::open(dir.path()).unwrap();
        backend.put("apps", "a", b"1").await.unwrap();
        backend.delete("apps", "a").await.unwrap();
        assert_eq!(backend.get("apps", "a").await.unwrap(), None);
    }
}
