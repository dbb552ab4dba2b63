//! The application catalog.
//!
//! [`AppCatalog`] is the only entry point the HTTP layer uses. It validates
//! submitted forms, generates ids, gates mutations behind the record's
//! password, and returns [`PublicApp`]s so the credential never leaves this
//! crate.
//!
//! Deletion is a hard delete: once removed, a record is indistinguishable
//! from one that never existed.

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::CatalogError;
use crate::id::{DEFAULT_ID_LEN, generate_id, is_well_formed};
use crate::password::PasswordHash;
use crate::record::{AppRecord, PublicApp, RecordPatch};
use crate::store::RecordStore;
use crate::validate::{ApplicationUpdate, FieldErrors, Limits, NewApplication, check_auth_password};

/// How many fresh ids to try before giving up on a publish.
const MAX_ID_ATTEMPTS: u32 = 5;

/// Publish, list, fetch, and password-gated mutation of application records.
#[derive(Debug, Clone)]
pub struct AppCatalog {
    store: RecordStore,
    limits: Limits,
}

fn reject(errors: FieldErrors) -> CatalogError {
    debug!(fields = ?errors.fields().collect::<Vec<_>>(), "form validation failed");
    CatalogError::Validation(errors)
}

fn require_id(id: &str) -> Result<(), CatalogError> {
    if id.is_empty() {
        Err(CatalogError::InvalidId)
    } else {
        Ok(())
    }
}

impl AppCatalog {
    /// Build a catalog over `store`, enforcing `limits` on every write.
    pub fn new(store: RecordStore, limits: Limits) -> Self {
        Self { store, limits }
    }

    /// The limits applied to submitted forms.
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Validate and store a new application, returning its generated id.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Validation`] for bad input and
    /// [`CatalogError::Store`] if the store fails.
    pub async fn publish(&self, input: NewApplication) -> Result<String, CatalogError> {
        let valid = input.validate(&self.limits).map_err(reject)?;
        let id = self.fresh_id().await?;

        let now = Utc::now();
        let record = AppRecord {
            id: id.clone(),
            name: valid.name,
            version: valid.version,
            description: valid.description,
            html_content: valid.html_content,
            password: PasswordHash::new(&valid.password).map_err(|e| CatalogError::Internal {
                reason: format!("password hashing failed: {e}"),
            })?,
            created_at: now,
            updated_at: now,
        };
        self.store.insert(&record).await?;

        info!(app_id = %id, name = %record.name, version = %record.version, "application published");
        Ok(id)
    }

    async fn fresh_id(&self) -> Result<String, CatalogError> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let id = generate_id(DEFAULT_ID_LEN);
            if !self.store.exists(&id).await? {
                return Ok(id);
            }
            warn!(app_id = %id, "generated id already taken, drawing another");
        }
        Err(CatalogError::Internal {
            reason: format!("no free id after {MAX_ID_ATTEMPTS} attempts"),
        })
    }

    /// All applications, newest first. An empty catalog is an empty vec.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Store`] if the store fails.
    pub async fn list(&self) -> Result<Vec<PublicApp>, CatalogError> {
        let records = self.store.list_newest_first().await?;
        Ok(records.into_iter().map(PublicApp::from).collect())
    }

    /// Public fields of one application.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidId`] for an empty id,
    /// [`CatalogError::NotFound`] if absent or not a well-formed id, and
    /// [`CatalogError::Store`] if the store fails.
    pub async fn get(&self, id: &str) -> Result<PublicApp, CatalogError> {
        self.load(id).await.map(PublicApp::from)
    }

    async fn load(&self, id: &str) -> Result<AppRecord, CatalogError> {
        require_id(id)?;
        if !is_well_formed(id) {
            return Err(CatalogError::NotFound { id: id.to_owned() });
        }
        self.store
            .get(id)
            .await?
            .ok_or_else(|| CatalogError::NotFound { id: id.to_owned() })
    }

    /// Load a record and check `auth_password` against it.
    async fn unlock(&self, id: &str, auth_password: &str) -> Result<AppRecord, CatalogError> {
        let record = self.load(id).await?;
        if record.password.verify(auth_password) {
            Ok(record)
        } else {
            warn!(app_id = %id, "password rejected");
            Err(CatalogError::Unauthorized)
        }
    }

    /// Check a password without changing anything.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Validation`] for an empty password,
    /// [`CatalogError::NotFound`], [`CatalogError::Unauthorized`], or
    /// [`CatalogError::Store`].
    pub async fn verify(&self, id: &str, auth_password: &str) -> Result<(), CatalogError> {
        check_auth_password(auth_password).map_err(reject)?;
        self.unlock(id, auth_password).await.map(|_| ())
    }

    /// Apply an authenticated update and return the new public fields.
    ///
    /// `created_at` is preserved; `updated_at` is refreshed. Concurrent
    /// updates are last-write-wins.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Validation`], [`CatalogError::InvalidId`],
    /// [`CatalogError::NotFound`], [`CatalogError::Unauthorized`], or
    /// [`CatalogError::Store`]. On any error the stored record is unchanged.
    pub async fn update(
        &self,
        id: &str,
        input: ApplicationUpdate,
    ) -> Result<PublicApp, CatalogError> {
        let valid = input.validate(&self.limits).map_err(reject)?;
        self.unlock(id, &valid.auth_password).await?;

        let patch = RecordPatch {
            name: Some(valid.name),
            version: Some(valid.version),
            description: valid.description,
            html_content: Some(valid.html_content),
        };
        let updated = self
            .store
            .update(id, patch)
            .await?
            .ok_or_else(|| CatalogError::NotFound { id: id.to_owned() })?;

        info!(app_id = %id, version = %updated.version, "application updated");
        Ok(PublicApp::from(updated))
    }

    /// Permanently remove an application after checking its password.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Validation`], [`CatalogError::InvalidId`],
    /// [`CatalogError::NotFound`], [`CatalogError::Unauthorized`], or
    /// [`CatalogError::Store`].
    pub async fn delete(&self, id: &str, auth_password: &str) -> Result<(), CatalogError> {
        check_auth_password(auth_password).map_err(reject)?;
        self.unlock(id, auth_password).await?;
        self.store.remove(id).await?;
        info!(app_id = %id, "application deleted");
        Ok(())
    }
}
