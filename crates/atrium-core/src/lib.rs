//! Core library for Atrium — the configuration and secret management engine
//! behind the admin console of a multi-tenant AI assistant platform.
//!
//! The engine holds per-service configuration sections (database, model
//! provider, object storage, identity, search, document intelligence),
//! stores credentials through a pluggable secret store, masks them on every
//! display read, and tracks per-section connectivity status driven by save
//! and test outcomes. Consumers (the HTTP admin API in `atrium-server`)
//! interact through [`engine::ConfigEngine`].

pub mod audit;
pub mod engine;
pub mod error;
pub mod mask;
pub mod probe;
pub mod registry;
pub mod status;
pub mod store;

pub use engine::ConfigEngine;
pub use error::{AuditError, ConfigError};
pub use mask::MASK_TOKEN;
pub use registry::Registry;
pub use status::SectionStatus;
pub use store::SectionSnapshot;
