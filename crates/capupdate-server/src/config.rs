//! Server configuration for `CapUpdate`.
//!
//! Loads configuration from environment variables with defaults. An
//! unparsable value falls back to its default rather than aborting startup.

use std::net::SocketAddr;
use std::time::Duration;

use capupdate_core::store::DEFAULT_STORE_TIMEOUT;
use capupdate_core::validate::Limits;

const DEFAULT_PORT: u16 = 8300;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to.
    pub bind_addr: SocketAddr,
    /// Storage backend type.
    pub storage_backend: StorageBackendType,
    /// Log level filter (e.g., `info`, `debug`, `warn`).
    pub log_level: String,
    /// Upper bound on any single store call.
    pub store_timeout: Duration,
    /// Upper bound on submitted HTML, in bytes.
    pub max_html_bytes: usize,
}

/// Supported storage backend types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackendType {
    /// In-memory (development only, data lost on restart).
    Memory,
    /// `RocksDB` persistent storage.
    RocksDb { path: String },
    /// Redb persistent storage.
    Redb { path: String },
}

impl ServerConfig {
    /// Load configuration from the process environment.
    ///
    /// Environment variables:
    /// - `CAPUPDATE_BIND_ADDR`: full bind address (default: `127.0.0.1:8300`)
    /// - `PORT`: port to bind on `0.0.0.0` when `CAPUPDATE_BIND_ADDR` is unset
    /// - `CAPUPDATE_STORAGE`: `memory`, `rocksdb`, or `redb` (default: `memory`)
    /// - `CAPUPDATE_STORAGE_PATH`: path for persistent backends (default: `./data`)
    /// - `CAPUPDATE_LOG_LEVEL`: log filter (default: `info`)
    /// - `CAPUPDATE_STORE_TIMEOUT_MS`: per-call store timeout (default: `5000`)
    /// - `CAPUPDATE_MAX_HTML_BYTES`: HTML size limit (default: `1048576`)
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let default_addr = SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT));
        let bind_addr = if let Some(addr) = lookup("CAPUPDATE_BIND_ADDR") {
            addr.parse().unwrap_or(default_addr)
        } else if let Some(port) = lookup("PORT") {
            SocketAddr::from(([0, 0, 0, 0], port.parse().unwrap_or(DEFAULT_PORT)))
        } else {
            default_addr
        };

        let storage_path =
            lookup("CAPUPDATE_STORAGE_PATH").unwrap_or_else(|| "./data".to_owned());

        let storage_backend = match lookup("CAPUPDATE_STORAGE")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "rocksdb" => StorageBackendType::RocksDb { path: storage_path },
            "redb" => StorageBackendType::Redb { path: storage_path },
            _ => StorageBackendType::Memory,
        };

        let log_level = lookup("CAPUPDATE_LOG_LEVEL").unwrap_or_else(|| "info".to_owned());

        let store_timeout = lookup("CAPUPDATE_STORE_TIMEOUT_MS")
            .and_then(|v| v.parse().ok())
            .filter(|ms| *ms > 0)
            .map_or(DEFAULT_STORE_TIMEOUT, Duration::from_millis);

        let max_html_bytes = lookup("CAPUPDATE_MAX_HTML_BYTES")
            .and_then(|v| v.parse().ok())
            .filter(|n| *n > 0)
            .unwrap_or(Limits::default().max_html_bytes);

        Self {
            bind_addr,
            storage_backend,
            log_level,
            store_timeout,
            max_html_bytes,
        }
    }

    /// Validation limits derived from this configuration.
    #[must_use]
    pub fn limits(&self) -> Limits {
        Limits {
            max_html_bytes: self.max_html_bytes,
            ..Limits::default()
        }
    }

    /// Request body limit: the HTML limit plus room for the other fields.
    #[must_use]
    pub fn body_limit(&self) -> usize {
        self.max_html_bytes.saturating_mul(2).saturating_add(64 * 1024)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = config(&[]);
        assert_eq!(cfg.bind_addr, SocketAddr::from(([127, 0, 0, 1], 8300)));
        assert_eq!(cfg.storage_backend, StorageBackendType::Memory);
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.store_timeout, Duration::from_secs(5));
        assert_eq!(cfg.max_html_bytes, 1024 * 1024);
    }

    #[test]
    fn bind_addr_wins_over_port() {
        let cfg = config(&[("CAPUPDATE_BIND_ADDR", "127.0.0.1:9000"), ("PORT", "7000")]);
        assert_eq!(cfg.bind_addr.port(), 9000);

        let cfg = config(&[("PORT", "7000")]);
        assert_eq!(cfg.bind_addr, SocketAddr::from(([0, 0, 0, 0], 7000)));
    }

    #[test]
    fn persistent_backends_use_storage_path() {
        let cfg = config(&[("CAPUPDATE_STORAGE", "RocksDB"), ("CAPUPDATE_STORAGE_PATH", "/tmp/x")]);
        assert_eq!(
            cfg.storage_backend,
            StorageBackendType::RocksDb {
                path: "/tmp/x".to_owned()
            }
        );
        let cfg = config(&[("CAPUPDATE_STORAGE", "redb")]);
        assert_eq!(
            cfg.storage_backend,
            StorageBackendType::Redb {
                path: "./data".to_owned()
            }
        );
    }

    #[test]
    fn bad_numbers_fall_back_to_defaults() {
        let cfg = config(&[
            ("CAPUPDATE_STORE_TIMEOUT_MS", "soon"),
            ("CAPUPDATE_MAX_HTML_BYTES", "0"),
            ("CAPUPDATE_BIND_ADDR", "not an address"),
        ]);
        assert_eq!(cfg.store_timeout, DEFAULT_STORE_TIMEOUT);
        assert_eq!(cfg.max_html_bytes, Limits::default().max_html_bytes);
        assert_eq!(cfg.bind_addr.port(), 8300);
    }

    #[test]
    fn limits_follow_html_setting() {
        let cfg = config(&[("CAPUPDATE_MAX_HTML_BYTES", "2048")]);
        assert_eq!(cfg.limits().max_html_bytes, 2048);
        assert!(cfg.body_limit() > 2048);
    }
}
