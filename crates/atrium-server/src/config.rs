//! Server configuration for Atrium.
//!
//! Loads configuration from environment variables with sensible defaults.
//! All settings can be overridden via `ATRIUM_*` environment variables.

use std::net::SocketAddr;
use std::time::Duration;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to.
    pub bind_addr: SocketAddr,
    /// Secret store backend type.
    pub storage_backend: StorageBackendType,
    /// Log level filter (e.g., `info`, `debug`, `warn`).
    pub log_level: String,
    /// Path to the reveal audit log file (if file auditing is enabled).
    pub audit_file_path: Option<String>,
    /// Timeout applied to each connectivity probe.
    pub probe_timeout: Duration,
}

/// Supported secret store backend types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackendType {
    /// In-memory (development only, data lost on restart).
    Memory,
    /// AES-256-GCM encrypted file. The key comes from `ATRIUM_STORAGE_KEY`.
    EncryptedFile { path: String, key_hex: String },
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `PORT` — port to bind on (binds to `0.0.0.0`)
    /// - `ATRIUM_BIND_ADDR` — full bind address (overrides `PORT`, default: `127.0.0.1:8700`)
    /// - `ATRIUM_STORAGE` — `memory` or `file` (default: `memory`)
    /// - `ATRIUM_STORAGE_PATH` — path to the encrypted store file (default: `./data/config.enc`)
    /// - `ATRIUM_STORAGE_KEY` — 64 hex chars, required when `ATRIUM_STORAGE=file`
    /// - `ATRIUM_LOG_LEVEL` — log filter (default: `info`)
    /// - `ATRIUM_AUDIT_FILE` — path to the reveal audit log (optional)
    /// - `ATRIUM_PROBE_TIMEOUT_SECS` — connectivity probe timeout (default: `10`)
    ///
    /// # Errors
    ///
    /// Returns an error when `ATRIUM_STORAGE=file` but `ATRIUM_STORAGE_KEY`
    /// is not set — starting an encrypted store without a key cannot work.
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_addr = if let Ok(addr) = std::env::var("ATRIUM_BIND_ADDR") {
            addr.parse()
                .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 8700)))
        } else if let Ok(port_str) = std::env::var("PORT") {
            let port: u16 = port_str.parse().unwrap_or(8700);
            SocketAddr::from(([0, 0, 0, 0], port))
        } else {
            SocketAddr::from(([127, 0, 0, 1], 8700))
        };

        let storage_backend = match std::env::var("ATRIUM_STORAGE")
            .unwrap_or_else(|_| "memory".to_owned())
            .to_lowercase()
            .as_str()
        {
            "file" => {
                let path = std::env::var("ATRIUM_STORAGE_PATH")
                    .unwrap_or_else(|_| "./data/config.enc".to_owned());
                let key_hex = std::env::var("ATRIUM_STORAGE_KEY").map_err(|_| {
                    anyhow::anyhow!("ATRIUM_STORAGE=file requires ATRIUM_STORAGE_KEY (64 hex chars)")
                })?;
                StorageBackendType::EncryptedFile { path, key_hex }
            }
            _ => StorageBackendType::Memory,
        };

        let log_level = std::env::var("ATRIUM_LOG_LEVEL").unwrap_or_else(|_| "info".to_owned());

        let audit_file_path = std::env::var("ATRIUM_AUDIT_FILE").ok();

        let probe_timeout_secs = std::env::var("ATRIUM_PROBE_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10);

        Ok(Self {
            bind_addr,
            storage_backend,
            log_level,
            audit_file_path,
            probe_timeout: Duration::from_secs(probe_timeout_secs),
        })
    }
}
