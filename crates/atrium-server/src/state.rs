//! Shared application state for the Atrium server.
//!
//! A single [`AppState`] is constructed at startup and shared across all
//! Axum handlers via `Arc`. It holds the configuration engine; everything
//! a handler needs flows through it.

use std::sync::Arc;

use atrium_core::ConfigEngine;

/// Shared application state passed to all HTTP handlers.
pub struct AppState {
    /// The configuration and secret management engine.
    pub engine: Arc<ConfigEngine>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}
