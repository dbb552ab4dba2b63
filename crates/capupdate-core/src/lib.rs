//! Core library for `CapUpdate`.
//!
//! Contains the application record model, the form validator, identifier
//! generation, the salted password gate, the record store adapter that sits
//! on top of `capupdate-storage`, and the [`catalog::AppCatalog`] that ties
//! them together into publish / list / fetch / update / delete operations.
//! Nothing here knows about HTTP.

pub mod catalog;
pub mod error;
pub mod id;
pub mod password;
pub mod record;
pub mod store;
pub mod validate;
