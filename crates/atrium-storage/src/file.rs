//! AES-256-GCM encrypted single-file secret store.
//!
//! The whole key-value map is serialized to JSON and encrypted as one blob:
//! `nonce (12 bytes) || ciphertext || tag (16 bytes)`. A fresh nonce is
//! generated for every write. Writes go to a temp file in the same directory
//! followed by a rename, so a crash mid-write never leaves a torn store.
//!
//! This backend is intended for single-node deployments where an external
//! vault is not available. The full map is held in memory behind a `RwLock`;
//! admin configuration is small, so re-encrypting the whole map per write is
//! acceptable.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use tokio::sync::RwLock;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{SecretStore, StoreError};

/// Minimum ciphertext length: 12-byte nonce + 16-byte AES-GCM tag.
const MIN_CIPHERTEXT_LEN: usize = 12 + 16;

/// Nonce length for AES-256-GCM (96 bits).
const NONCE_LEN: usize = 12;

/// A 256-bit store encryption key that is zeroized on drop.
///
/// The inner bytes are never exposed in `Debug` output.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct StoreKey([u8; 32]);

impl StoreKey {
    /// Create a key from raw bytes.
    #[must_use]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse a key from 64 hex characters (as supplied via the environment).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidKey`] if the input is not exactly 32
    /// bytes of hex.
    pub fn from_hex(s: &str) -> Result<Self, StoreError> {
        let decoded = hex::decode(s.trim()).map_err(|e| StoreError::InvalidKey {
            reason: format!("not valid hex: {e}"),
        })?;
        let bytes: [u8; 32] = decoded.try_into().map_err(|v: Vec<u8>| StoreError::InvalidKey {
            reason: format!("expected 32 bytes, got {}", v.len()),
        })?;
        Ok(Self(bytes))
    }

    /// Generate a new random key using the OS CSPRNG.
    #[must_use]
    pub fn generate() -> Self {
        let key = Aes256Gcm::generate_key(OsRng);
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&key);
        Self(bytes)
    }
}

impl fmt::Debug for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// An encrypted single-file secret store.
pub struct EncryptedFileStore {
    path: PathBuf,
    key: StoreKey,
    data: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl EncryptedFileStore {
    /// Open (or create) an encrypted store at the given path.
    ///
    /// A missing file yields an empty store; the file is created on the
    /// first write.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Open`] if the file exists but cannot be read.
    /// - [`StoreError::Corrupt`] if decryption or parsing fails (wrong key,
    ///   tampered or truncated file).
    pub async fn open(path: impl AsRef<Path>, key: StoreKey) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let data = match tokio::fs::read(&path).await {
            Ok(blob) => decrypt_map(&key, &blob, &path)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(StoreError::Open {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                });
            }
        };

        Ok(Self {
            path,
            key,
            data: RwLock::new(data),
        })
    }

    /// Serialize, encrypt, and atomically persist the current map.
    async fn persist(&self, data: &BTreeMap<String, Vec<u8>>, key: &str) -> Result<(), StoreError> {
        let plaintext = serde_json::to_vec(data).map_err(|e| StoreError::Write {
            key: key.to_owned(),
            reason: format!("serialization failed: {e}"),
        })?;

        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key.0));
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = cipher
            .encrypt(&nonce, plaintext.as_slice())
            .map_err(|e| StoreError::Write {
                key: key.to_owned(),
                reason: format!("encryption failed: {e}"),
            })?;

        let mut blob = Vec::with_capacity(NONCE_LEN.saturating_add(ciphertext.len()));
        blob.extend_from_slice(&nonce);
        blob.extend_from_slice(&ciphertext);

        // Temp file + rename in the same directory so the swap is atomic.
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, &blob)
            .await
            .map_err(|e| StoreError::Write {
                key: key.to_owned(),
                reason: format!("write to '{}' failed: {e}", tmp.display()),
            })?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StoreError::Write {
                key: key.to_owned(),
                reason: format!("rename to '{}' failed: {e}", self.path.display()),
            })?;

        Ok(())
    }
}

/// Decrypt and parse the on-disk blob into the key-value map.
fn decrypt_map(
    key: &StoreKey,
    blob: &[u8],
    path: &Path,
) -> Result<BTreeMap<String, Vec<u8>>, StoreError> {
    if blob.len() < MIN_CIPHERTEXT_LEN {
        return Err(StoreError::Corrupt {
            path: path.display().to_string(),
            reason: format!(
                "file too short: expected at least {MIN_CIPHERTEXT_LEN} bytes, got {}",
                blob.len()
            ),
        });
    }

    let (nonce_bytes, ciphertext) = blob.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key.0));

    let plaintext = cipher
        .decrypt(nonce, ciphertext)
        .map_err(|e| StoreError::Corrupt {
            path: path.display().to_string(),
            reason: format!("decryption failed: {e}"),
        })?;

    serde_json::from_slice(&plaintext).map_err(|e| StoreError::Corrupt {
        path: path.display().to_string(),
        reason: format!("deserialization failed: {e}"),
    })
}

impl fmt::Debug for EncryptedFileStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptedFileStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl SecretStore for EncryptedFileStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let data = self.data.read().await;
        Ok(data.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let mut data = self.data.write().await;
        let previous = data.insert(key.to_owned(), value.to_vec());
        if let Err(e) = self.persist(&data, key).await {
            // Roll back the in-memory map so a failed persist is not
            // observable as a successful write.
            match previous {
                Some(old) => {
                    data.insert(key.to_owned(), old);
                }
                None => {
                    data.remove(key);
                }
            }
            return Err(e);
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut data = self.data.write().await;
        let previous = data.remove(key);
        if previous.is_none() {
            return Ok(());
        }
        if let Err(e) = self.persist(&data, key).await {
            if let Some(old) = previous {
                data.insert(key.to_owned(), old);
            }
            return Err(match e {
                StoreError::Write { key, reason } => StoreError::Delete { key, reason },
                other => other,
            });
        }
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let data = self.data.read().await;
        let keys = data
            .range(prefix.to_owned()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect();
        Ok(keys)
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let data = self.data.read().await;
        Ok(data.contains_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(dir: &tempfile::TempDir) -> PathBuf {
        dir.path().join("store.enc")
    }

    #[tokio::test]
    async fn open_missing_file_yields_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = EncryptedFileStore::open(temp_path(&dir), StoreKey::generate())
            .await
            .unwrap();
        assert_eq!(store.get("anything").await.unwrap(), None);
    }

    #[tokio::test]
    async fn put_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_path(&dir);
        let key = StoreKey::generate();

        let store = EncryptedFileStore::open(&path, key.clone()).await.unwrap();
        store
            .put("secret/database/SQL_PASSWORD", b"Secr3t!")
            .await
            .unwrap();
        drop(store);

        let reopened = EncryptedFileStore::open(&path, key).await.unwrap();
        let val = reopened.get("secret/database/SQL_PASSWORD").await.unwrap();
        assert_eq!(val, Some(b"Secr3t!".to_vec()));
    }

    #[tokio::test]
    async fn wrong_key_reports_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_path(&dir);

        let store = EncryptedFileStore::open(&path, StoreKey::generate())
            .await
            .unwrap();
        store.put("k", b"v").await.unwrap();
        drop(store);

        let err = EncryptedFileStore::open(&path, StoreKey::generate())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn truncated_file_reports_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_path(&dir);
        tokio::fs::write(&path, b"short").await.unwrap();

        let err = EncryptedFileStore::open(&path, StoreKey::generate())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn delete_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_path(&dir);
        let key = StoreKey::generate();

        let store = EncryptedFileStore::open(&path, key.clone()).await.unwrap();
        store.put("a", b"1").await.unwrap();
        store.put("b", b"2").await.unwrap();
        store.delete("a").await.unwrap();
        drop(store);

        let reopened = EncryptedFileStore::open(&path, key).await.unwrap();
        assert_eq!(reopened.get("a").await.unwrap(), None);
        assert_eq!(reopened.get("b").await.unwrap(), Some(b"2".to_vec()));
    }

    #[tokio::test]
    async fn list_with_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let store = EncryptedFileStore::open(temp_path(&dir), StoreKey::generate())
            .await
            .unwrap();
        store.put("secret/database/a", b"1").await.unwrap();
        store.put("secret/database/b", b"2").await.unwrap();
        store.put("secret/search/c", b"3").await.unwrap();

        let keys = store.list("secret/database/").await.unwrap();
        assert_eq!(keys, vec!["secret/database/a", "secret/database/b"]);
    }

    #[test]
    fn store_key_from_hex_roundtrip() {
        let hex_key = "a".repeat(64);
        let key = StoreKey::from_hex(&hex_key).unwrap();
        assert_eq!(key.0, [0xaa; 32]);
    }

    #[test]
    fn store_key_rejects_bad_length() {
        let err = StoreKey::from_hex("abcd").unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey { .. }));
    }

    #[test]
    fn store_key_rejects_non_hex() {
        let err = StoreKey::from_hex(&"z".repeat(64)).unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey { .. }));
    }

    #[test]
    fn debug_never_prints_key_bytes() {
        let key = StoreKey::from_bytes([7u8; 32]);
        let out = format!("{key:?}");
        assert!(out.contains("REDACTED"));
        assert!(!out.contains('7'));
    }
}
