//! Atrium HTTP admin API.
//!
//! Exposes the configuration engine from `atrium-core` over REST: masked
//! snapshots, authorization-gated actual values, saves that never overwrite
//! a secret with its display placeholder, connectivity tests, and audited
//! reveals.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
