//! Shared application state for the `CapUpdate` server.
//!
//! One [`AppState`] is built at startup and shared across all handlers via
//! `Arc`. The catalog inside it is the single store client for the process.

use capupdate_core::catalog::AppCatalog;

/// Shared application state passed to all HTTP handlers.
#[derive(Debug)]
pub struct AppState {
    /// Publish / list / fetch / update / delete operations.
    pub catalog: AppCatalog,
}

impl AppState {
    pub fn new(catalog: AppCatalog) -> Self {
        Self { catalog }
    }
}
