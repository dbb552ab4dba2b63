//! `CapUpdate` HTTP server.
//!
//! Wires the application catalog and a storage backend into an Axum router.
//! Serves the JSON API at `/api/apps`, raw previews at `/preview/{id}`, and a
//! small landing page at `/`.

pub mod app;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;
