//! The configuration engine facade.
//!
//! [`ConfigEngine`] wires the registry, configuration store, status tracker,
//! connection tester, and reveal audit log together, and enforces the
//! concurrency contract: `save` and `test` on the same section are
//! serialized through a per-section lock, while operations on different
//! sections run freely in parallel. Reads never take the lock.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use atrium_storage::SecretStore;

use crate::audit::{AuditLog, AuditSink, RevealEvent};
use crate::error::ConfigError;
use crate::probe::{ConnectionTester, TestResult};
use crate::registry::{Registry, ValueType};
use crate::status::StatusTracker;
use crate::store::{ConfigStore, SectionSnapshot};

/// The engine consumed by the HTTP admin API.
pub struct ConfigEngine {
    store: ConfigStore,
    tracker: Arc<StatusTracker>,
    tester: ConnectionTester,
    audit: AuditLog,
    /// One lock per registry section, built at construction. Requests
    /// naming an unknown section never allocate anything.
    locks: HashMap<String, Arc<Mutex<()>>>,
}

impl ConfigEngine {
    /// Build an engine over the given registry, backend, and tester.
    #[must_use]
    pub fn new(
        registry: Arc<Registry>,
        backend: Arc<dyn SecretStore>,
        tester: ConnectionTester,
    ) -> Self {
        let tracker = Arc::new(StatusTracker::new());
        let locks = registry
            .iter()
            .map(|section| (section.id.clone(), Arc::new(Mutex::new(()))))
            .collect();
        let store = ConfigStore::new(registry, backend, Arc::clone(&tracker));
        Self {
            store,
            tracker,
            tester,
            audit: AuditLog::new(),
            locks,
        }
    }

    /// Register a reveal audit sink.
    pub async fn add_audit_sink(&self, sink: Arc<dyn AuditSink>) {
        self.audit.add_sink(sink).await;
    }

    /// Snapshot one section with secrets masked unless `reveal` is set.
    ///
    /// With `reveal = true` every secret field disclosed is audited; if
    /// the audit record cannot be written the snapshot is withheld.
    ///
    /// # Errors
    ///
    /// See [`ConfigStore::snapshot`], plus [`ConfigError::AuditRefused`]
    /// on a revealed snapshot whose audit events no sink accepted.
    pub async fn snapshot(
        &self,
        section_id: &str,
        reveal: bool,
    ) -> Result<SectionSnapshot, ConfigError> {
        let snapshot = self.store.snapshot(section_id, reveal).await?;
        if reveal {
            self.audit_revealed(std::slice::from_ref(&snapshot)).await?;
        }
        Ok(snapshot)
    }

    /// Snapshot every section in registry order with secrets masked,
    /// degrading per section on backend failure.
    pub async fn snapshot_all(&self) -> Vec<SectionSnapshot> {
        self.store.snapshot_all(false).await
    }

    /// Snapshot every section with real secret values.
    ///
    /// Each secret field disclosed here is audited exactly like a
    /// per-field reveal; if the audit records cannot be written, the
    /// snapshots are withheld.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::AuditRefused`] if no audit sink accepted an
    /// event.
    pub async fn snapshot_all_revealed(&self) -> Result<Vec<SectionSnapshot>, ConfigError> {
        let snapshots = self.store.snapshot_all(true).await;
        self.audit_revealed(&snapshots).await?;
        Ok(snapshots)
    }

    /// Record one reveal event per unmasked secret field, before any
    /// value leaves the engine.
    async fn audit_revealed(&self, snapshots: &[SectionSnapshot]) -> Result<(), ConfigError> {
        for snapshot in snapshots {
            for field in &snapshot.fields {
                if field.spec.value_type == ValueType::Secret && !field.is_masked {
                    self.audit
                        .record(&RevealEvent::new(&snapshot.section, &field.spec.key))
                        .await?;
                }
            }
        }
        Ok(())
    }

    /// Validate and persist edits, then return the authoritative post-save
    /// snapshot — callers never need a follow-up fetch.
    ///
    /// Persistence failures move the section to `Error` status; caller
    /// errors (unknown section or field, validation) leave status and
    /// stored values untouched.
    ///
    /// # Errors
    ///
    /// See [`ConfigStore::apply_edits`].
    pub async fn save(
        &self,
        section_id: &str,
        edits: &HashMap<String, String>,
    ) -> Result<SectionSnapshot, ConfigError> {
        let lock = self.section_lock(section_id)?;
        let _guard = lock.lock().await;

        match self.store.apply_edits(section_id, edits).await {
            Ok(()) => {
                self.tracker.record_save_success(section_id).await;
                info!(section = section_id, "configuration saved");
            }
            Err(e) => {
                match &e {
                    // Caller errors: report immediately, nothing changed.
                    ConfigError::SectionNotFound { .. }
                    | ConfigError::FieldNotFound { .. }
                    | ConfigError::FieldValidationFailed { .. }
                    | ConfigError::InvalidRequest { .. } => {}
                    // Persistence failures are section health events.
                    _ => {
                        warn!(section = section_id, error = %e, "configuration save failed");
                        self.tracker
                            .record_save_failure(section_id, e.to_string())
                            .await;
                    }
                }
                return Err(e);
            }
        }

        self.store.snapshot(section_id, false).await
    }

    /// Run the section's connectivity probe against its stored values.
    ///
    /// Masked values in any client-side edit buffer are irrelevant here:
    /// the probe always resolves the real stored credentials, uses them for
    /// the probe only, and never returns them. The outcome is recorded in
    /// the status tracker. A caller that drops the future before the probe
    /// completes leaves status unchanged.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::SectionNotFound`] for an unknown section.
    /// - [`ConfigError::SecretStoreUnavailable`] if values cannot be
    ///   resolved; status is left unchanged since no probe ran.
    pub async fn test(&self, section_id: &str) -> Result<TestResult, ConfigError> {
        let lock = self.section_lock(section_id)?;
        let _guard = lock.lock().await;

        let section = self
            .store
            .registry()
            .get(section_id)
            .ok_or_else(|| ConfigError::SectionNotFound {
                section: section_id.to_owned(),
            })?
            .clone();

        let values = self.store.resolve_all(&section).await?;
        let result = self.tester.test(&section, &values).await;

        self.tracker
            .record_test(section_id, result.success, result.message.clone())
            .await;
        info!(
            section = section_id,
            success = result.success,
            message = %result.message,
            "connectivity test finished"
        );

        Ok(result)
    }

    /// Reveal one secret field's real value.
    ///
    /// The only path by which a real secret reaches a caller. Each call is
    /// individually audited before the value is released; if the audit
    /// record cannot be written, the reveal is denied.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::FieldNotFound`] / [`ConfigError::InvalidRequest`]
    ///   for unknown or non-secret fields.
    /// - [`ConfigError::AuditRefused`] if no audit sink accepted the event.
    pub async fn reveal(&self, section_id: &str, field_key: &str) -> Result<String, ConfigError> {
        let value = self.store.read_secret_value(section_id, field_key).await?;
        self.audit
            .record(&RevealEvent::new(section_id, field_key))
            .await?;
        Ok(value)
    }

    /// Reconfigure a section from empty: delete its stored values and
    /// reset its status to `disconnected`. The only path back to the
    /// initial state.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::SecretStoreUnavailable`] if deletion fails.
    pub async fn reset(&self, section_id: &str) -> Result<SectionSnapshot, ConfigError> {
        let lock = self.section_lock(section_id)?;
        let _guard = lock.lock().await;

        self.store.clear_section(section_id).await?;
        self.tracker.reset(section_id).await;
        info!(section = section_id, "section reset to unconfigured");

        self.store.snapshot(section_id, false).await
    }

    /// The serialization lock for a registry section.
    fn section_lock(&self, section_id: &str) -> Result<Arc<Mutex<()>>, ConfigError> {
        self.locks
            .get(section_id)
            .cloned()
            .ok_or_else(|| ConfigError::SectionNotFound {
                section: section_id.to_owned(),
            })
    }
}

impl std::fmt::Debug for ConfigEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigEngine").finish_non_exhaustive()
    }
}
