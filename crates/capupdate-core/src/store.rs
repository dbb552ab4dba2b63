//! Record store adapter.
//!
//! Maps [`AppRecord`]s onto a [`StorageBackend`] collection as camelCase
//! JSON documents. Every backend call is bounded by a timeout; an expired
//! call surfaces as [`StoreError::Unavailable`].
//!
//! There is no concurrency control: two updates racing on the same id both
//! read, both write, and the later write wins.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error};

use capupdate_storage::{StorageBackend, StorageError};

use crate::error::StoreError;
use crate::record::{AppRecord, RecordPatch};

/// The single collection holding application records.
pub const APPS_COLLECTION: &str = "apps";

/// Default bound on a single backend call.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Typed access to application records.
#[derive(Clone)]
pub struct RecordStore {
    backend: Arc<dyn StorageBackend>,
    timeout: Duration,
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl RecordStore {
    /// Wrap a backend with the given per-call timeout.
    pub fn new(backend: Arc<dyn StorageBackend>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        fut: impl Future<Output = Result<T, StorageError>>,
    ) -> Result<T, StoreError> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(StoreError::from),
            Err(_) => Err(StoreError::Unavailable {
                operation,
                timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }

    fn decode(id: &str, bytes: &[u8]) -> Result<AppRecord, StoreError> {
        serde_json::from_slice(bytes).map_err(|e| StoreError::Corrupt {
            id: id.to_owned(),
            reason: e.to_string(),
        })
    }

    fn encode(record: &AppRecord) -> Result<Vec<u8>, StoreError> {
        serde_json::to_vec(record).map_err(|e| StoreError::Corrupt {
            id: record.id.clone(),
            reason: e.to_string(),
        })
    }

    /// Whether a record with `id` exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails or times out.
    pub async fn exists(&self, id: &str) -> Result<bool, StoreError> {
        self.bounded("exists", self.backend.exists(APPS_COLLECTION, id))
            .await
    }

    /// Write a complete record, replacing any existing one.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails or times out.
    pub async fn insert(&self, record: &AppRecord) -> Result<(), StoreError> {
        let bytes = Self::encode(record)?;
        self.bounded("insert", self.backend.put(APPS_COLLECTION, &record.id, &bytes))
            .await
    }

    /// Load a record by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails, times out, or holds an
    /// undecodable document.
    pub async fn get(&self, id: &str) -> Result<Option<AppRecord>, StoreError> {
        let bytes = self
            .bounded("get", self.backend.get(APPS_COLLECTION, id))
            .await?;
        bytes.map(|b| Self::decode(id, &b)).transpose()
    }

    /// Load every record, newest `created_at` first.
    ///
    /// Records created at the same instant are ordered by id so repeated
    /// calls return the same sequence. Undecodable documents are logged and
    /// left out.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails or times out.
    pub async fn list_newest_first(&self) -> Result<Vec<AppRecord>, StoreError> {
        let docs = self
            .bounded("list", self.backend.list(APPS_COLLECTION))
            .await?;
        let mut records: Vec<AppRecord> = docs
            .iter()
            .filter_map(|(id, bytes)| match Self::decode(id, bytes) {
                Ok(record) => Some(record),
                Err(e) => {
                    error!(app_id = %id, error = %e, "skipping undecodable record");
                    None
                }
            })
            .collect();
        records.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        debug!(count = records.len(), "listed records");
        Ok(records)
    }

    /// Merge `patch` into the stored record and refresh `updated_at`.
    ///
    /// Returns the updated record, or `None` if no record exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails or times out.
    pub async fn update(
        &self,
        id: &str,
        patch: RecordPatch,
    ) -> Result<Option<AppRecord>, StoreError> {
        let Some(mut record) = self.get(id).await? else {
            return Ok(None);
        };
        patch.apply(&mut record, Utc::now());
        self.insert(&record).await?;
        Ok(Some(record))
    }

    /// Hard-delete a record. Removing a missing record is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend fails or times out.
    pub async fn remove(&self, id: &str) -> Result<(), StoreError> {
        self.bounded("remove", self.backend.delete(APPS_COLLECTION, id))
            .await
    }
}
