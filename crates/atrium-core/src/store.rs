//! Configuration store: merges the section registry with live values.
//!
//! Secret fields live as one store entry per `(section, field)` under
//! `secret/{section}/{field}`. Non-secret fields live together in one JSON
//! document per section under `config/{section}`. The store produces
//! [`SectionSnapshot`] projections for display and applies validated edits;
//! status is read from the [`StatusTracker`] but never written here.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use atrium_storage::SecretStore;

use crate::error::ConfigError;
use crate::mask::{self, FieldEdit};
use crate::registry::{FieldSpec, Registry, Section, ValueType};
use crate::status::{SectionStatus, StatusTracker};

/// A field spec paired with its display value.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedField {
    /// The field's schema.
    #[serde(flatten)]
    pub spec: FieldSpec,
    /// What the caller may see. For an unrevealed secret this is always
    /// the mask token.
    pub display_value: String,
    /// Whether `display_value` is the mask rather than the real value.
    pub is_masked: bool,
}

/// A read-only projection of one section: schema, values, and status.
///
/// Recomputed on every read, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct SectionSnapshot {
    /// Section identifier.
    pub section: String,
    /// Human-readable label.
    pub label: String,
    /// Resolved fields in schema order.
    pub fields: Vec<ResolvedField>,
    /// Connection status from the tracker.
    pub status: SectionStatus,
    /// When the section was last saved or tested.
    pub last_checked: Option<DateTime<Utc>>,
    /// Failure message from the most recent failed save or test, or a
    /// store-unavailability note when the snapshot is degraded.
    pub error_message: Option<String>,
}

/// The configuration store.
pub struct ConfigStore {
    registry: Arc<Registry>,
    store: Arc<dyn SecretStore>,
    tracker: Arc<StatusTracker>,
}

fn secret_key(section: &str, field: &str) -> String {
    format!("secret/{section}/{field}")
}

fn doc_key(section: &str) -> String {
    format!("config/{section}")
}

impl ConfigStore {
    /// Create a store over the given registry, backend, and tracker.
    #[must_use]
    pub fn new(
        registry: Arc<Registry>,
        store: Arc<dyn SecretStore>,
        tracker: Arc<StatusTracker>,
    ) -> Self {
        Self {
            registry,
            store,
            tracker,
        }
    }

    /// The registry this store projects.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Read the plaintext document for a section.
    async fn read_doc(&self, section_id: &str) -> Result<HashMap<String, String>, ConfigError> {
        let Some(bytes) = self.store.get(&doc_key(section_id)).await? else {
            return Ok(HashMap::new());
        };
        serde_json::from_slice(&bytes).map_err(|e| ConfigError::Serialization {
            section: section_id.to_owned(),
            reason: e.to_string(),
        })
    }

    /// Read one secret field's stored value, or `None` if unset.
    async fn read_secret(
        &self,
        section_id: &str,
        field_key: &str,
    ) -> Result<Option<String>, ConfigError> {
        let bytes = self.store.get(&secret_key(section_id, field_key)).await?;
        Ok(bytes.map(|b| String::from_utf8_lossy(&b).into_owned()))
    }

    /// Resolve every field of a section to its real (unmasked) value.
    ///
    /// Unset fields fall back to their default, or the empty string.
    pub(crate) async fn resolve_all(
        &self,
        section: &Section,
    ) -> Result<HashMap<String, String>, ConfigError> {
        let doc = self.read_doc(&section.id).await?;
        let mut values = HashMap::with_capacity(section.fields.len());
        for field in &section.fields {
            let raw = if field.value_type == ValueType::Secret {
                self.read_secret(&section.id, &field.key).await?
            } else {
                doc.get(&field.key).cloned()
            };
            let value = raw
                .or_else(|| field.default_value.clone())
                .unwrap_or_default();
            values.insert(field.key.clone(), value);
        }
        Ok(values)
    }

    /// Produce a snapshot of one section.
    ///
    /// With `reveal = false` every secret field displays the mask token,
    /// whatever its real value.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::SectionNotFound`] for an unknown section id.
    /// - [`ConfigError::SecretStoreUnavailable`] if the backend fails.
    pub async fn snapshot(
        &self,
        section_id: &str,
        reveal: bool,
    ) -> Result<SectionSnapshot, ConfigError> {
        let section = self.section(section_id)?;
        let values = self.resolve_all(section).await?;
        Ok(self.project(section, &values, reveal, None).await)
    }

    /// Snapshot every section, in registry order.
    ///
    /// A backend failure for one section degrades that snapshot (fields
    /// blanked, `error_message` set) instead of failing the whole batch —
    /// one unreachable store must not blank out the dashboard.
    pub async fn snapshot_all(&self, reveal: bool) -> Vec<SectionSnapshot> {
        let mut snapshots = Vec::with_capacity(self.registry.len());
        for section in self.registry.iter() {
            let snapshot = match self.resolve_all(section).await {
                Ok(values) => self.project(section, &values, reveal, None).await,
                Err(e) => {
                    tracing::warn!(section = %section.id, error = %e, "snapshot degraded");
                    self.project(section, &HashMap::new(), false, Some(e.to_string()))
                        .await
                }
            };
            snapshots.push(snapshot);
        }
        snapshots
    }

    /// Validate and persist edits for a section.
    ///
    /// Secret edits equal to the mask token are dropped (the client is
    /// echoing the placeholder back, not clearing the secret). Required
    /// fields must be non-empty after edits are applied over current
    /// values. The plaintext document is written first in a single atomic
    /// write, then each secret entry; a mid-sequence failure reports
    /// exactly which fields were committed.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::SectionNotFound`] / [`ConfigError::FieldNotFound`]
    ///   for unknown identifiers — nothing persisted.
    /// - [`ConfigError::FieldValidationFailed`] if a required field would
    ///   end up empty — nothing persisted.
    /// - [`ConfigError::PartialSave`] if persistence failed partway.
    pub(crate) async fn apply_edits(
        &self,
        section_id: &str,
        edits: &HashMap<String, String>,
    ) -> Result<(), ConfigError> {
        let section = self.section(section_id)?;

        for key in edits.keys() {
            if section.field(key).is_none() {
                return Err(ConfigError::FieldNotFound {
                    section: section_id.to_owned(),
                    field: key.clone(),
                });
            }
        }

        let current = self.resolve_all(section).await?;
        let mut doc = self.read_doc(section_id).await?;

        // Split accepted edits into secret writes and plaintext changes.
        let mut secret_writes: Vec<(String, String)> = Vec::new();
        let mut doc_changed = false;
        let mut effective = current.clone();

        for field in &section.fields {
            let Some(proposed) = edits.get(&field.key) else {
                continue;
            };
            let current_value = current.get(&field.key).map_or("", String::as_str);
            match mask::diff(field.value_type, current_value, proposed) {
                FieldEdit::NoOp => {}
                FieldEdit::Set(value) => {
                    effective.insert(field.key.clone(), value.clone());
                    if field.value_type == ValueType::Secret {
                        secret_writes.push((field.key.clone(), value));
                    } else {
                        // Clearing a plaintext field removes it from the
                        // document so defaults apply again.
                        if value.is_empty() {
                            doc.remove(&field.key);
                        } else {
                            doc.insert(field.key.clone(), value);
                        }
                        doc_changed = true;
                    }
                }
            }
        }

        // Validate required fields against the post-edit view before any
        // byte is written.
        for field in &section.fields {
            if field.required
                && effective
                    .get(&field.key)
                    .is_none_or(|v| v.trim().is_empty())
            {
                return Err(ConfigError::FieldValidationFailed {
                    section: section_id.to_owned(),
                    field: field.key.clone(),
                });
            }
        }

        let mut persisted: Vec<String> = Vec::new();

        if doc_changed {
            let bytes = serde_json::to_vec(&doc).map_err(|e| ConfigError::Serialization {
                section: section_id.to_owned(),
                reason: e.to_string(),
            })?;
            let plain_keys: Vec<String> = edits
                .keys()
                .filter(|k| {
                    section
                        .field(k)
                        .is_some_and(|f| f.value_type != ValueType::Secret)
                })
                .cloned()
                .collect();
            if let Err(e) = self.store.put(&doc_key(section_id), &bytes).await {
                return Err(ConfigError::PartialSave {
                    section: section_id.to_owned(),
                    persisted,
                    failed: plain_keys.join(", "),
                    reason: e.to_string(),
                });
            }
            persisted.extend(plain_keys);
        }

        for (key, value) in &secret_writes {
            if let Err(e) = self
                .store
                .put(&secret_key(section_id, key), value.as_bytes())
                .await
            {
                return Err(ConfigError::PartialSave {
                    section: section_id.to_owned(),
                    persisted,
                    failed: key.clone(),
                    reason: e.to_string(),
                });
            }
            persisted.push(key.clone());
        }

        Ok(())
    }

    /// Read one secret field's real value for an explicit reveal.
    ///
    /// This is a raw read — auditing lives in the engine, which is the
    /// only caller.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::FieldNotFound`] for an unknown field key.
    /// - [`ConfigError::InvalidRequest`] for a non-secret field — those
    ///   are already visible in any snapshot.
    pub(crate) async fn read_secret_value(
        &self,
        section_id: &str,
        field_key: &str,
    ) -> Result<String, ConfigError> {
        let section = self.section(section_id)?;
        let field = section
            .field(field_key)
            .ok_or_else(|| ConfigError::FieldNotFound {
                section: section_id.to_owned(),
                field: field_key.to_owned(),
            })?;
        if field.value_type != ValueType::Secret {
            return Err(ConfigError::InvalidRequest {
                reason: format!("field '{field_key}' is not a secret; read it from a snapshot"),
            });
        }
        Ok(self
            .read_secret(section_id, field_key)
            .await?
            .unwrap_or_default())
    }

    /// Remove every stored value for a section (secrets and document).
    ///
    /// Used by explicit section reconfiguration, alongside a status reset.
    pub(crate) async fn clear_section(&self, section_id: &str) -> Result<(), ConfigError> {
        let section = self.section(section_id)?;
        for field in &section.fields {
            if field.value_type == ValueType::Secret {
                self.store
                    .delete(&secret_key(section_id, &field.key))
                    .await?;
            }
        }
        self.store.delete(&doc_key(section_id)).await?;
        Ok(())
    }

    fn section(&self, section_id: &str) -> Result<&Section, ConfigError> {
        self.registry
            .get(section_id)
            .ok_or_else(|| ConfigError::SectionNotFound {
                section: section_id.to_owned(),
            })
    }

    /// Build the snapshot projection from resolved values.
    async fn project(
        &self,
        section: &Section,
        values: &HashMap<String, String>,
        reveal: bool,
        degraded: Option<String>,
    ) -> SectionSnapshot {
        let fields = section
            .fields
            .iter()
            .map(|spec| {
                let raw = values.get(&spec.key).map_or("", String::as_str);
                let is_masked = spec.value_type == ValueType::Secret && !reveal;
                let display_value = if is_masked {
                    mask::mask(raw, spec.value_type)
                } else {
                    raw.to_owned()
                };
                ResolvedField {
                    spec: spec.clone(),
                    display_value,
                    is_masked,
                }
            })
            .collect();

        let record = self.tracker.get(&section.id).await;
        SectionSnapshot {
            section: section.id.clone(),
            label: section.label.clone(),
            fields,
            status: record.status,
            last_checked: record.last_checked,
            error_message: degraded.or(record.error_message),
        }
    }
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::MASK_TOKEN;
    use atrium_storage::{MemoryStore, StoreError};

    fn test_store() -> (ConfigStore, Arc<MemoryStore>) {
        let backend = Arc::new(MemoryStore::new());
        let store = ConfigStore::new(
            Arc::new(Registry::builtin()),
            Arc::clone(&backend) as Arc<dyn SecretStore>,
            Arc::new(StatusTracker::new()),
        );
        (store, backend)
    }

    async fn seed_database(store: &ConfigStore) {
        let edits = HashMap::from([
            ("SQL_SERVER".to_owned(), "db.internal".to_owned()),
            ("SQL_DATABASE".to_owned(), "assistant".to_owned()),
            ("SQL_USERNAME".to_owned(), "admin".to_owned()),
            ("SQL_PASSWORD".to_owned(), "Secr3t!".to_owned()),
        ]);
        store.apply_edits("database", &edits).await.unwrap();
    }

    #[tokio::test]
    async fn snapshot_masks_all_secrets() {
        let (store, _) = test_store();
        seed_database(&store).await;

        let snapshot = store.snapshot("database", false).await.unwrap();
        let pw = snapshot
            .fields
            .iter()
            .find(|f| f.spec.key == "SQL_PASSWORD")
            .unwrap();
        assert_eq!(pw.display_value, MASK_TOKEN);
        assert!(pw.is_masked);

        let host = snapshot
            .fields
            .iter()
            .find(|f| f.spec.key == "SQL_SERVER")
            .unwrap();
        assert_eq!(host.display_value, "db.internal");
        assert!(!host.is_masked);
    }

    #[tokio::test]
    async fn unset_secret_still_displays_masked() {
        let (store, _) = test_store();
        // Nothing saved at all — the password is unset.
        let snapshot = store.snapshot("database", false).await.unwrap();
        let pw = snapshot
            .fields
            .iter()
            .find(|f| f.spec.key == "SQL_PASSWORD")
            .unwrap();
        assert_eq!(pw.display_value, MASK_TOKEN);
        assert!(pw.is_masked);
    }

    #[tokio::test]
    async fn reveal_snapshot_shows_real_values() {
        let (store, _) = test_store();
        seed_database(&store).await;

        let snapshot = store.snapshot("database", true).await.unwrap();
        let pw = snapshot
            .fields
            .iter()
            .find(|f| f.spec.key == "SQL_PASSWORD")
            .unwrap();
        assert_eq!(pw.display_value, "Secr3t!");
        assert!(!pw.is_masked);
    }

    #[tokio::test]
    async fn missing_optional_field_resolves_to_default() {
        let (store, _) = test_store();
        seed_database(&store).await;

        let snapshot = store.snapshot("database", false).await.unwrap();
        let port = snapshot
            .fields
            .iter()
            .find(|f| f.spec.key == "SQL_PORT")
            .unwrap();
        assert_eq!(port.display_value, "1433");
    }

    #[tokio::test]
    async fn unknown_section_is_an_error() {
        let (store, _) = test_store();
        let err = store.snapshot("telemetry", false).await.unwrap_err();
        assert!(matches!(err, ConfigError::SectionNotFound { .. }));
    }

    #[tokio::test]
    async fn mask_token_edit_leaves_secret_unchanged() {
        let (store, backend) = test_store();
        seed_database(&store).await;

        let edits = HashMap::from([
            ("SQL_PASSWORD".to_owned(), MASK_TOKEN.to_owned()),
            ("SQL_SERVER".to_owned(), "new-host".to_owned()),
        ]);
        store.apply_edits("database", &edits).await.unwrap();

        let stored = backend.get("secret/database/SQL_PASSWORD").await.unwrap();
        assert_eq!(stored, Some(b"Secr3t!".to_vec()));

        let snapshot = store.snapshot("database", false).await.unwrap();
        let host = snapshot
            .fields
            .iter()
            .find(|f| f.spec.key == "SQL_SERVER")
            .unwrap();
        assert_eq!(host.display_value, "new-host");
    }

    #[tokio::test]
    async fn genuine_secret_edit_round_trips() {
        let (store, _) = test_store();
        seed_database(&store).await;

        let edits = HashMap::from([("SQL_PASSWORD".to_owned(), "N3w-Secr3t".to_owned())]);
        store.apply_edits("database", &edits).await.unwrap();

        let value = store
            .read_secret_value("database", "SQL_PASSWORD")
            .await
            .unwrap();
        assert_eq!(value, "N3w-Secr3t");
    }

    #[tokio::test]
    async fn secret_that_starts_with_mask_chars_is_persisted() {
        let (store, _) = test_store();
        seed_database(&store).await;

        let tricky = format!("{MASK_TOKEN}tail");
        let edits = HashMap::from([("SQL_PASSWORD".to_owned(), tricky.clone())]);
        store.apply_edits("database", &edits).await.unwrap();

        let value = store
            .read_secret_value("database", "SQL_PASSWORD")
            .await
            .unwrap();
        assert_eq!(value, tricky);
    }

    #[tokio::test]
    async fn required_field_validation_persists_nothing() {
        let (store, backend) = test_store();
        seed_database(&store).await;

        let edits = HashMap::from([
            ("SQL_SERVER".to_owned(), String::new()),
            ("SQL_DATABASE".to_owned(), "other".to_owned()),
        ]);
        let err = store.apply_edits("database", &edits).await.unwrap_err();
        assert!(matches!(
            err,
            ConfigError::FieldValidationFailed { ref field, .. } if field == "SQL_SERVER"
        ));

        // Neither edit reached the store.
        let doc = backend.get("config/database").await.unwrap().unwrap();
        let doc: HashMap<String, String> = serde_json::from_slice(&doc).unwrap();
        assert_eq!(doc.get("SQL_SERVER").map(String::as_str), Some("db.internal"));
        assert_eq!(doc.get("SQL_DATABASE").map(String::as_str), Some("assistant"));
    }

    #[tokio::test]
    async fn unset_required_secret_fails_validation() {
        let (store, _) = test_store();
        // No password stored and none provided.
        let edits = HashMap::from([
            ("SQL_SERVER".to_owned(), "h".to_owned()),
            ("SQL_DATABASE".to_owned(), "d".to_owned()),
            ("SQL_USERNAME".to_owned(), "u".to_owned()),
        ]);
        let err = store.apply_edits("database", &edits).await.unwrap_err();
        assert!(matches!(
            err,
            ConfigError::FieldValidationFailed { ref field, .. } if field == "SQL_PASSWORD"
        ));
    }

    #[tokio::test]
    async fn partial_save_names_committed_and_failed_fields() {
        struct SecretPutsFail {
            inner: MemoryStore,
        }

        #[async_trait::async_trait]
        impl SecretStore for SecretPutsFail {
            async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
                self.inner.get(key).await
            }
            async fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
                if key.starts_with("secret/") {
                    return Err(StoreError::Write {
                        key: key.to_owned(),
                        reason: "disk full".to_owned(),
                    });
                }
                self.inner.put(key, value).await
            }
            async fn delete(&self, key: &str) -> Result<(), StoreError> {
                self.inner.delete(key).await
            }
            async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
                self.inner.list(prefix).await
            }
        }

        let inner = MemoryStore::new();
        let store = ConfigStore::new(
            Arc::new(Registry::builtin()),
            Arc::new(SecretPutsFail {
                inner: inner.clone(),
            }),
            Arc::new(StatusTracker::new()),
        );

        let edits = HashMap::from([
            ("SQL_SERVER".to_owned(), "db.internal".to_owned()),
            ("SQL_DATABASE".to_owned(), "assistant".to_owned()),
            ("SQL_USERNAME".to_owned(), "admin".to_owned()),
            ("SQL_PASSWORD".to_owned(), "Secr3t!".to_owned()),
        ]);
        let err = store.apply_edits("database", &edits).await.unwrap_err();
        let (section, persisted, failed) = match err {
            ConfigError::PartialSave {
                section,
                persisted,
                failed,
                ..
            } => (section, persisted, failed),
            other => panic!("expected PartialSave, got {other:?}"),
        };
        assert_eq!(section, "database");
        assert_eq!(failed, "SQL_PASSWORD");
        assert_eq!(persisted.len(), 3);
        for key in ["SQL_SERVER", "SQL_DATABASE", "SQL_USERNAME"] {
            assert!(
                persisted.contains(&key.to_owned()),
                "{key} missing from {persisted:?}"
            );
        }

        // The committed half really is in the backend; the failed half
        // never landed.
        let doc = inner.get("config/database").await.unwrap().unwrap();
        let doc: HashMap<String, String> = serde_json::from_slice(&doc).unwrap();
        assert_eq!(doc.get("SQL_SERVER").map(String::as_str), Some("db.internal"));
        assert_eq!(
            inner.get("secret/database/SQL_PASSWORD").await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn document_write_failure_reports_nothing_persisted() {
        struct DocPutsFail {
            inner: MemoryStore,
        }

        #[async_trait::async_trait]
        impl SecretStore for DocPutsFail {
            async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
                self.inner.get(key).await
            }
            async fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
                if key.starts_with("config/") {
                    return Err(StoreError::Write {
                        key: key.to_owned(),
                        reason: "disk full".to_owned(),
                    });
                }
                self.inner.put(key, value).await
            }
            async fn delete(&self, key: &str) -> Result<(), StoreError> {
                self.inner.delete(key).await
            }
            async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
                self.inner.list(prefix).await
            }
        }

        let inner = MemoryStore::new();
        let store = ConfigStore::new(
            Arc::new(Registry::builtin()),
            Arc::new(DocPutsFail {
                inner: inner.clone(),
            }),
            Arc::new(StatusTracker::new()),
        );

        let edits = HashMap::from([
            ("SQL_SERVER".to_owned(), "db.internal".to_owned()),
            ("SQL_DATABASE".to_owned(), "assistant".to_owned()),
            ("SQL_USERNAME".to_owned(), "admin".to_owned()),
            ("SQL_PASSWORD".to_owned(), "Secr3t!".to_owned()),
        ]);
        let err = store.apply_edits("database", &edits).await.unwrap_err();
        let persisted = match err {
            ConfigError::PartialSave { persisted, .. } => persisted,
            other => panic!("expected PartialSave, got {other:?}"),
        };
        assert!(persisted.is_empty());

        // The secret write was never attempted after the document failed.
        assert_eq!(
            inner.get("secret/database/SQL_PASSWORD").await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn unknown_field_key_is_rejected() {
        let (store, _) = test_store();
        let edits = HashMap::from([("NOT_A_FIELD".to_owned(), "x".to_owned())]);
        let err = store.apply_edits("database", &edits).await.unwrap_err();
        assert!(matches!(err, ConfigError::FieldNotFound { .. }));
    }

    #[tokio::test]
    async fn reveal_of_non_secret_field_is_invalid() {
        let (store, _) = test_store();
        let err = store
            .read_secret_value("database", "SQL_SERVER")
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRequest { .. }));
    }

    #[tokio::test]
    async fn snapshot_all_follows_registry_order() {
        let (store, _) = test_store();
        let snapshots = store.snapshot_all(false).await;
        let ids: Vec<&str> = snapshots.iter().map(|s| s.section.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "database",
                "model-provider",
                "object-storage",
                "identity",
                "search",
                "document-intelligence"
            ]
        );
    }

    #[tokio::test]
    async fn snapshot_all_degrades_on_store_failure() {
        struct DownStore;

        #[async_trait::async_trait]
        impl SecretStore for DownStore {
            async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
                Err(StoreError::Read {
                    key: key.to_owned(),
                    reason: "backend offline".to_owned(),
                })
            }
            async fn put(&self, key: &str, _value: &[u8]) -> Result<(), StoreError> {
                Err(StoreError::Write {
                    key: key.to_owned(),
                    reason: "backend offline".to_owned(),
                })
            }
            async fn delete(&self, _key: &str) -> Result<(), StoreError> {
                Ok(())
            }
            async fn list(&self, _prefix: &str) -> Result<Vec<String>, StoreError> {
                Ok(Vec::new())
            }
        }

        let store = ConfigStore::new(
            Arc::new(Registry::builtin()),
            Arc::new(DownStore),
            Arc::new(StatusTracker::new()),
        );

        let snapshots = store.snapshot_all(false).await;
        assert_eq!(snapshots.len(), Registry::builtin().len());
        for snapshot in &snapshots {
            assert!(snapshot.error_message.is_some());
            for field in &snapshot.fields {
                // Degraded snapshots leak nothing: blanks and masks only.
                assert!(field.display_value.is_empty() || field.display_value == MASK_TOKEN);
            }
        }
    }

    #[tokio::test]
    async fn clear_section_removes_values() {
        let (store, backend) = test_store();
        seed_database(&store).await;

        store.clear_section("database").await.unwrap();
        assert_eq!(
            backend.get("secret/database/SQL_PASSWORD").await.unwrap(),
            None
        );
        assert_eq!(backend.get("config/database").await.unwrap(), None);
    }

    #[tokio::test]
    async fn clearing_plain_field_restores_default() {
        let (store, _) = test_store();
        seed_database(&store).await;

        let edits = HashMap::from([("SQL_PORT".to_owned(), "5432".to_owned())]);
        store.apply_edits("database", &edits).await.unwrap();
        let snapshot = store.snapshot("database", false).await.unwrap();
        let port = snapshot
            .fields
            .iter()
            .find(|f| f.spec.key == "SQL_PORT")
            .unwrap();
        assert_eq!(port.display_value, "5432");

        let edits = HashMap::from([("SQL_PORT".to_owned(), String::new())]);
        store.apply_edits("database", &edits).await.unwrap();
        let snapshot = store.snapshot("database", false).await.unwrap();
        let port = snapshot
            .fields
            .iter()
            .find(|f| f.spec.key == "SQL_PORT")
            .unwrap();
        assert_eq!(port.display_value, "1433");
    }
}
