//! Secret store abstraction for Atrium.
//!
//! This crate defines the [`SecretStore`] trait — a pure key-value interface
//! over an opaque secret backend. The configuration engine in `atrium-core`
//! decides *what* goes into the store (one entry per secret field, one JSON
//! document per section for plaintext fields); this layer only moves bytes.
//!
//! Two implementations are provided:
//!
//! - [`EncryptedFileStore`] — local deployments, a single AES-256-GCM
//!   encrypted file on disk
//! - [`MemoryStore`] — in-memory, for testing only
//!
//! An external vault can be plugged in by implementing [`SecretStore`] for
//! its client; the engine never assumes anything beyond this trait.

mod error;
mod file;
mod memory;

pub use error::StoreError;
pub use file::{EncryptedFileStore, StoreKey};
pub use memory::MemoryStore;

/// A pluggable key-value secret store.
///
/// Keys are UTF-8 strings using `/` as a separator (e.g.
/// `secret/database/SQL_PASSWORD`, `config/search`). Values are opaque byte
/// arrays. Failures are always surfaced as [`StoreError`] — backends must
/// never swallow an I/O or decryption error and report "not found" instead.
///
/// Implementations must be safe to share across async tasks (`Send + Sync`).
#[async_trait::async_trait]
pub trait SecretStore: Send + Sync + 'static {
    /// Retrieve a value by key.
    ///
    /// Returns `Ok(None)` if the key does not exist — "not set" is a normal
    /// outcome, distinct from a backend failure.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Read`] if the underlying backend fails.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Store a key-value pair, overwriting any existing value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Write`] if the underlying backend fails.
    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Delete a key. Idempotent — deleting a non-existent key is not an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Delete`] if the underlying backend fails.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// List all keys that start with the given prefix.
    ///
    /// Returns keys only, not values.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::List`] if the underlying backend fails.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError>;

    /// Check whether a key exists in the store.
    ///
    /// The default implementation calls [`get`](SecretStore::get) and checks
    /// for `Some`. Backends may override this with a cheaper check.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Read`] if the underlying backend fails.
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.get(key).await?.is_some())
    }
}
