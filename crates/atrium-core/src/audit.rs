//! Reveal audit log.
//!
//! Every reveal of a real secret value is an individually-recorded security
//! event. The event carries the section and field identifiers and a
//! timestamp — never the value itself. Reveals are fail-closed: if sinks
//! are registered and none of them can record the event, the reveal is
//! denied.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};
use tracing::warn;

use crate::error::AuditError;

/// A single reveal event. Contains identifiers only, never the secret.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevealEvent {
    /// Unique event id.
    pub id: String,
    /// When the reveal happened.
    pub timestamp: DateTime<Utc>,
    /// Section the revealed field belongs to.
    pub section: String,
    /// The revealed field's key.
    pub field: String,
}

impl RevealEvent {
    /// Build a new event for the given `(section, field)` pair.
    #[must_use]
    pub fn new(section: &str, field: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            section: section.to_owned(),
            field: field.to_owned(),
        }
    }
}

/// A destination for reveal events.
///
/// Implementations must be safe to share across async tasks.
#[async_trait::async_trait]
pub trait AuditSink: Send + Sync {
    /// The sink's name (for error reporting).
    fn name(&self) -> &str;

    /// Record an event. Must not silently drop events.
    ///
    /// # Errors
    ///
    /// Returns an error if the event could not be persisted.
    async fn record(&self, event: &RevealEvent) -> Result<(), AuditError>;
}

/// Fans reveal events out to all registered sinks.
///
/// With no sinks registered, events are still emitted as `tracing` records
/// and the reveal proceeds. With sinks registered, at least one must
/// succeed; if all fail the reveal must be denied.
#[derive(Default)]
pub struct AuditLog {
    sinks: RwLock<Vec<Arc<dyn AuditSink>>>,
}

impl AuditLog {
    /// Create an audit log with no sinks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sink.
    pub async fn add_sink(&self, sink: Arc<dyn AuditSink>) {
        self.sinks.write().await.push(sink);
    }

    /// Record a reveal event to every sink.
    ///
    /// # Errors
    ///
    /// Returns the last sink failure if every registered sink fails.
    pub async fn record(&self, event: &RevealEvent) -> Result<(), AuditError> {
        tracing::info!(
            section = %event.section,
            field = %event.field,
            event_id = %event.id,
            "secret value revealed"
        );

        let sinks = self.sinks.read().await;
        if sinks.is_empty() {
            return Ok(());
        }

        let mut succeeded = false;
        let mut last_err = None;
        for sink in sinks.iter() {
            match sink.record(event).await {
                Ok(()) => succeeded = true,
                Err(e) => {
                    warn!(sink = sink.name(), error = %e, "audit sink failed");
                    last_err = Some(e);
                }
            }
        }

        if succeeded {
            Ok(())
        } else {
            Err(last_err.unwrap_or(AuditError::Serialization {
                reason: "no sink outcome recorded".to_owned(),
            }))
        }
    }
}

impl std::fmt::Debug for AuditLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLog").finish_non_exhaustive()
    }
}

/// Audit sink that appends JSON-lines to a file.
///
/// The file is opened lazily in append-only mode on the first write. A
/// `tokio::sync::Mutex` serializes writes; the critical section is one
/// `write_all` plus flush, and reveals are infrequent.
pub struct FileAuditSink {
    path: PathBuf,
    writer: Mutex<Option<tokio::fs::File>>,
}

impl FileAuditSink {
    /// Create a sink writing to the given path.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            writer: Mutex::new(None),
        }
    }

    async fn get_writer(
        &self,
    ) -> Result<tokio::sync::MutexGuard<'_, Option<tokio::fs::File>>, AuditError> {
        let mut guard = self.writer.lock().await;
        if guard.is_none() {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .await
                .map_err(|e| AuditError::SinkFailure {
                    name: self.name().to_owned(),
                    reason: format!("failed to open audit file '{}': {e}", self.path.display()),
                })?;
            *guard = Some(file);
        }
        Ok(guard)
    }
}

#[async_trait::async_trait]
impl AuditSink for FileAuditSink {
    fn name(&self) -> &str {
        "file"
    }

    async fn record(&self, event: &RevealEvent) -> Result<(), AuditError> {
        let mut line = serde_json::to_vec(event).map_err(|e| AuditError::Serialization {
            reason: e.to_string(),
        })?;
        line.push(b'\n');

        let mut guard = self.get_writer().await?;
        let file = guard.as_mut().ok_or_else(|| AuditError::SinkFailure {
            name: "file".to_owned(),
            reason: "file handle unexpectedly None after open".to_owned(),
        })?;

        file.write_all(&line)
            .await
            .map_err(|e| AuditError::SinkFailure {
                name: "file".to_owned(),
                reason: format!("write failed: {e}"),
            })?;

        file.flush().await.map_err(|e| AuditError::SinkFailure {
            name: "file".to_owned(),
            reason: format!("flush failed: {e}"),
        })?;

        Ok(())
    }
}

impl std::fmt::Debug for FileAuditSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileAuditSink")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
