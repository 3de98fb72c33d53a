//! Configuration routes: `/v1/config/*`
//!
//! The HTTP surface of the configuration engine. Snapshots are masked by
//! default; `/actual-values` and per-field reveal exist for callers the
//! surrounding platform has already authorized — the engine itself has no
//! authorization concept.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use atrium_core::probe::TestResult;
use atrium_core::SectionSnapshot;

use crate::error::AppError;
use crate::state::AppState;

/// Build the `/v1/config` router.
///
/// Paths:
/// - `GET  /v1/config` — all sections, secrets masked
/// - `GET  /v1/config/actual-values` — all sections, secrets revealed
/// - `GET  /v1/config/{section}` — one section, secrets masked
/// - `PUT  /v1/config/{section}` — save edits, returns the post-save snapshot
/// - `POST /v1/config/{section}/test` — run the connectivity probe
/// - `GET  /v1/config/{section}/reveal/{field}` — reveal one secret (audited)
/// - `POST /v1/config/{section}/reset` — clear the section and its status
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_sections))
        .route("/actual-values", get(list_actual_values))
        .route("/{section}", get(get_section).put(save_section))
        .route("/{section}/test", post(test_section))
        .route("/{section}/reveal/{field}", get(reveal_field))
        .route("/{section}/reset", post(reset_section))
}

// ── Response types ───────────────────────────────────────────────────

/// Response body for a reveal.
#[derive(Debug, Serialize)]
pub struct RevealResponse {
    /// Section the field belongs to.
    pub section: String,
    /// The revealed field's key.
    pub field: String,
    /// The real stored value. Empty string when the secret is unset — the
    /// explicit reveal path is the one place set-vs-unset may be disclosed.
    pub value: String,
}

// ── Handlers ─────────────────────────────────────────────────────────

/// All sections with secrets masked — the overview the dashboard polls.
async fn list_sections(
    State(state): State<Arc<AppState>>,
) -> Json<Vec<SectionSnapshot>> {
    Json(state.engine.snapshot_all().await)
}

/// All sections with real values. The collaborator must gate this route
/// behind its own authorization before exposing it; the engine audits
/// every secret field it discloses here, like a per-field reveal.
async fn list_actual_values(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<SectionSnapshot>>, AppError> {
    let snapshots = state.engine.snapshot_all_revealed().await?;
    Ok(Json(snapshots))
}

/// One section with secrets masked.
async fn get_section(
    State(state): State<Arc<AppState>>,
    Path(section): Path<String>,
) -> Result<Json<SectionSnapshot>, AppError> {
    let snapshot = state.engine.snapshot(&section, false).await?;
    Ok(Json(snapshot))
}

/// Apply edits to a section. Mask-token secret edits are dropped by the
/// engine; the response is the authoritative post-save snapshot, so the
/// client needs no follow-up fetch.
async fn save_section(
    State(state): State<Arc<AppState>>,
    Path(section): Path<String>,
    Json(edits): Json<HashMap<String, String>>,
) -> Result<Json<SectionSnapshot>, AppError> {
    let snapshot = state.engine.save(&section, &edits).await?;
    Ok(Json(snapshot))
}

/// Run the section's connectivity probe. Probe failures are a normal
/// outcome (`success: false`), not an HTTP error.
async fn test_section(
    State(state): State<Arc<AppState>>,
    Path(section): Path<String>,
) -> Result<Json<TestResult>, AppError> {
    let result = state.engine.test(&section).await?;
    Ok(Json(result))
}

/// Reveal a single secret field. Audited per call by the engine.
async fn reveal_field(
    State(state): State<Arc<AppState>>,
    Path((section, field)): Path<(String, String)>,
) -> Result<Json<RevealResponse>, AppError> {
    let value = state.engine.reveal(&section, &field).await?;
    Ok(Json(RevealResponse {
        section,
        field,
        value,
    }))
}

/// Clear a section's stored values and reset its status to disconnected.
async fn reset_section(
    State(state): State<Arc<AppState>>,
    Path(section): Path<String>,
) -> Result<Json<SectionSnapshot>, AppError> {
    let snapshot = state.engine.reset(&section).await?;
    Ok(Json(snapshot))
}
