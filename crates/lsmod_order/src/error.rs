//! Error types for ordering and load-order state.
//!
//! Validation findings are not errors; they are returned as
//! [`Warning`](crate::Warning)s.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, OrderError>;

#[derive(Error, Debug)]
pub enum OrderError {
    /// Some mods never became free of unsorted dependencies.
    #[error("Circular dependency between: {}", ids.join(", "))]
    CycleDetected { ids: Vec<String> },

    #[error("Unknown mod: {0}")]
    UnknownMod(String),

    /// Base modules are always active and cannot be moved out of the load order.
    #[error("Base module cannot be changed: {0}")]
    BaseModule(String),

    #[error("Invalid fingerprint: {0}")]
    InvalidFingerprint(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse or serialize JSON (category overrides).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
