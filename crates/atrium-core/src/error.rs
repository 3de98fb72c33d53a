//! Error types for `atrium-core`.
//!
//! Each variant carries enough context to diagnose the problem without a
//! debugger. No error message ever includes a secret value — only section
//! ids, field keys, and backend reasons.

use atrium_storage::StoreError;

/// Errors from configuration engine operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The requested section is not in the registry.
    #[error("section not found: {section}")]
    SectionNotFound { section: String },

    /// The requested field does not exist in the section's schema.
    #[error("field '{field}' not found in section '{section}'")]
    FieldNotFound { section: String, field: String },

    /// A required field is empty after applying edits. Nothing was
    /// persisted and section status is untouched.
    #[error("validation failed for section '{section}': required field '{field}' is empty")]
    FieldValidationFailed { section: String, field: String },

    /// The request is well-formed but not allowed (e.g. revealing a
    /// non-secret field).
    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// The backing secret store is unreachable. Distinct from "field not
    /// set", which is a normal resolved state.
    #[error("secret store unavailable: {0}")]
    SecretStoreUnavailable(#[from] StoreError),

    /// A save failed partway through. `persisted` lists the field keys
    /// whose new values were committed before the failure; the caller can
    /// retry with only the remaining edits.
    #[error(
        "partial save on section '{section}': field '{failed}' failed ({reason}); \
         already persisted: [{}]", persisted.join(", ")
    )]
    PartialSave {
        section: String,
        persisted: Vec<String>,
        failed: String,
        reason: String,
    },

    /// Serialization of a section document failed.
    #[error("serialization failed for section '{section}': {reason}")]
    Serialization { section: String, reason: String },

    /// The reveal audit record could not be written. Reveals are
    /// fail-closed: no audit entry, no secret.
    #[error("reveal denied: {0}")]
    AuditRefused(#[from] AuditError),
}

/// Errors from the reveal audit log.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// A specific audit sink failed to record the event.
    #[error("audit sink '{name}' failed: {reason}")]
    SinkFailure { name: String, reason: String },

    /// Serialization of the audit event failed.
    #[error("audit serialization failed: {reason}")]
    Serialization { reason: String },
}
