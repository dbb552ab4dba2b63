//! Pure-Rust redb document backend.
//!
//! An alternative to `RocksDB` for builds that must avoid C++ FFI.
//! Feature-gated behind `redb-backend`.
//!
//! Each collection maps to its own redb table, created lazily on first write.
//! Reads against a collection that has never been written see an empty table.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use redb::{Database, ReadOnlyTable, ReadableTable, TableDefinition, TableError};

use crate::{StorageBackend, StorageError, check_segment, document_key};

fn table(collection: &str) -> TableDefinition<'_, &'static str, &'static [u8]> {
    TableDefinition::new(collection)
}

fn txn_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Transaction {
        reason: e.to_string(),
    }
}

/// A storage backend backed by redb.
///
/// # Examples
///
/// ```no_run
/// # use capupdate_storage::RedbBackend;
/// let backend = RedbBackend::open("/var/lib/capupdate/data.redb").unwrap();
/// ```
#[derive(Clone)]
pub struct RedbBackend {
    db: Arc<Database>,
    path: PathBuf,
}

impl std::fmt::Debug for RedbBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbBackend")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl RedbBackend {
    /// Open or create a redb database file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Open`] if redb fails to open or create the file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let db = Database::create(path).map_err(|e| StorageError::Open {
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

/// Open a collection table for reading; `None` when it was never created.
fn open_read(
    db: &Database,
    collection: &str,
) -> Result<Option<ReadOnlyTable<&'static str, &'static [u8]>>, StorageError> {
    let txn = db.begin_read().map_err(txn_error)?;
    match txn.open_table(table(collection)) {
        Ok(t) => Ok(Some(t)),
        Err(TableError::TableDoesNotExist(_)) => Ok(None),
        Err(e) => Err(txn_error(e)),
    }
}

#[async_trait::async_trait]
impl StorageBackend for RedbBackend {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let key = document_key(collection, id)?;
        let db = Arc::clone(&self.db);
        let (collection, id) = (collection.to_owned(), id.to_owned());
        let task_key = key.clone();
        tokio::task::spawn_blocking(move || {
            let Some(t) = open_read(&db, &collection)? else {
                return Ok(None);
            };
            let value = t
                .get(id.as_str())
                .map_err(|e| StorageError::Read {
                    key: task_key,
                    reason: e.to_string(),
                })?
                .map(|v| v.value().to_vec());
            Ok(value)
        })
        .await
        .map_err(|e| StorageError::Read {
            key,
            reason: format!("blocking task panicked: {e}"),
        })?
    }

    async fn put(&self, collection: &str, id: &str, value: &[u8]) -> Result<(), StorageError> {
        let key = document_key(collection, id)?;
        let db = Arc::clone(&self.db);
        let (collection, id) = (collection.to_owned(), id.to_owned());
        let value = value.to_vec();
        let task_key = key.clone();
        tokio::task::spawn_blocking(move || {
            let txn = db.begin_write().map_err(txn_error)?;
            {
                let mut t = txn.open_table(table(&collection)).map_err(txn_error)?;
                t.insert(id.as_str(), value.as_slice())
                    .map_err(|e| StorageError::Write {
                        key: task_key,
                        reason: e.to_string(),
                    })?;
            }
            txn.commit().map_err(txn_error)
        })
        .await
        .map_err(|e| StorageError::Write {
            key,
            reason: format!("blocking task panicked: {e}"),
        })?
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), StorageError> {
        let key = document_key(collection, id)?;
        let db = Arc::clone(&self.db);
        let (collection, id) = (collection.to_owned(), id.to_owned());
        let task_key = key.clone();
        tokio::task::spawn_blocking(move || {
            let txn = db.begin_write().map_err(txn_error)?;
            {
                let mut t = txn.open_table(table(&collection)).map_err(txn_error)?;
                t.remove(id.as_str()).map_err(|e| StorageError::Delete {
                    key: task_key,
                    reason: e.to_string(),
                })?;
            }
            txn.commit().map_err(txn_error)
        })
        .await
        .map_err(|e| StorageError::Delete {
            key,
            reason: format!("blocking task panicked: {e}"),
        })?
    }

    async fn list(&self, collection: &str) -> Result<Vec<(String, Vec<u8>)>, StorageError> {
        check_segment("collection", collection)?;
        let db = Arc::clone(&self.db);
        let name = collection.to_owned();
        tokio::task::spawn_blocking(move || {
            let Some(t) = open_read(&db, &name)? else {
                return Ok(Vec::new());
            };
            let list_error = |e: redb::StorageError| StorageError::List {
                collection: name.clone(),
                reason: e.to_string(),
            };
            let mut docs = Vec::new();
            for item in t.iter().map_err(list_error)? {
                let (k, v) = item.map_err(list_error)?;
                docs.push((k.value().to_owned(), v.value().to_vec()));
            }
            Ok(docs)
        })
        .await
        .map_err(|e| StorageError::List {
            collection: collection.to_owned(),
            reason: format!("blocking task panicked: {e}"),
        })?
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn open_temp() -> (tempfile::TempDir, RedbBackend) {
        let dir = tempfile::tempdir().unwrap();
        let backend = RedbBackend::open(dir.path().join("data.redb")).unwrap();
        (dir, backend)
    }

    #[tokio::test]
    async fn unknown_collection_reads_empty() {
        let (_dir, backend) = open_temp();
        assert_eq!(backend.get("apps", "a").await.unwrap(), None);
        assert!(backend.list("apps").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn put_get_list_delete() {
        let (_dir, backend) = open_temp();
        backend.put("apps", "b", b"2").await.unwrap();
        backend.put("apps", "a", b"1").await.unwrap();

        assert_eq!(backend.get("apps", "a").await.unwrap(), Some(b"1".to_vec()));
        let ids: Vec<String> = backend
            .list("apps")
            .await
            .unwrap()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);

        backend.delete("apps", "a").await.unwrap();
        assert!(!backend.exists("apps", "a").await.unwrap());
    }
}
