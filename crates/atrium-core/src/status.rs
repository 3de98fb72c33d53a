//! Per-section connection status tracking.
//!
//! The tracker owns the status state machine: it is mutated only by save and
//! test outcomes (and explicit resets), never by display reads. All fields
//! of a record are updated under one write lock so two concurrent outcomes
//! can never interleave into a status/message pair that never happened.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

/// Connection status of one configuration section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionStatus {
    /// Initial state — no save or test has happened yet.
    Disconnected,
    /// An edit is in progress. Set by UI collaborators, never by the engine.
    Configuring,
    /// The last save or test succeeded.
    Connected,
    /// The last save or test failed.
    Error,
}

/// The full status record for a section.
#[derive(Debug, Clone, Serialize)]
pub struct StatusRecord {
    /// Current status.
    pub status: SectionStatus,
    /// Failure message from the most recent failed save or test.
    pub error_message: Option<String>,
    /// When the section was last saved or tested.
    pub last_checked: Option<DateTime<Utc>>,
}

impl StatusRecord {
    fn initial() -> Self {
        Self {
            status: SectionStatus::Disconnected,
            error_message: None,
            last_checked: None,
        }
    }
}

/// Tracks status records for all sections.
///
/// Sections absent from the map are implicitly [`SectionStatus::Disconnected`].
/// No transition ever reverts to `Disconnected` on its own — only
/// [`reset`](StatusTracker::reset) does.
#[derive(Debug, Default)]
pub struct StatusTracker {
    records: RwLock<HashMap<String, StatusRecord>>,
}

impl StatusTracker {
    /// Create a tracker with every section in the initial state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current record for a section.
    pub async fn get(&self, section_id: &str) -> StatusRecord {
        let records = self.records.read().await;
        records
            .get(section_id)
            .cloned()
            .unwrap_or_else(StatusRecord::initial)
    }

    /// Record a successful save: status becomes `Connected` and any prior
    /// error message is cleared.
    pub async fn record_save_success(&self, section_id: &str) {
        self.write(section_id, SectionStatus::Connected, None).await;
    }

    /// Record a failed save persistence: status becomes `Error` with the
    /// message preserved verbatim for operator diagnosis.
    pub async fn record_save_failure(&self, section_id: &str, message: String) {
        self.write(section_id, SectionStatus::Error, Some(message))
            .await;
    }

    /// Record a test outcome.
    pub async fn record_test(&self, section_id: &str, success: bool, message: String) {
        if success {
            self.write(section_id, SectionStatus::Connected, None).await;
        } else {
            self.write(section_id, SectionStatus::Error, Some(message))
                .await;
        }
    }

    /// Explicitly reset a section to `Disconnected`, clearing its history.
    pub async fn reset(&self, section_id: &str) {
        let mut records = self.records.write().await;
        records.remove(section_id);
    }

    /// Replace the whole record atomically.
    async fn write(&self, section_id: &str, status: SectionStatus, error_message: Option<String>) {
        let mut records = self.records.write().await;
        records.insert(
            section_id.to_owned(),
            StatusRecord {
                status,
                error_message,
                last_checked: Some(Utc::now()),
            },
        );
    }
}
