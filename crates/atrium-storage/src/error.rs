//! Secret store error types.
//!
//! Every variant carries enough context to diagnose the problem without a
//! debugger. Error messages never include stored values — only keys, paths,
//! and backend reasons.

/// Errors that can occur during secret store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Failed to open or initialize the store at the given path.
    #[error("failed to open secret store at '{path}': {reason}")]
    Open { path: String, reason: String },

    /// Failed to read a value from the store.
    #[error("failed to read key '{key}': {reason}")]
    Read { key: String, reason: String },

    /// Failed to write a value to the store.
    #[error("failed to write key '{key}': {reason}")]
    Write { key: String, reason: String },

    /// Failed to delete a key from the store.
    #[error("failed to delete key '{key}': {reason}")]
    Delete { key: String, reason: String },

    /// Failed to list keys with the given prefix.
    #[error("failed to list keys with prefix '{prefix}': {reason}")]
    List { prefix: String, reason: String },

    /// The store file exists but could not be authenticated or parsed.
    /// Wrong key, corrupted ciphertext, or a tampered file all land here.
    #[error("secret store at '{path}' is corrupt or the key is wrong: {reason}")]
    Corrupt { path: String, reason: String },

    /// The supplied store key is malformed (wrong length or not hex).
    #[error("invalid store key: {reason}")]
    InvalidKey { reason: String },
}
