// ── Core error types ──
//
// Consumer-facing errors from scanfly-core. Transport and protocol
// failures during discovery never surface here: the probe sweep recovers
// from them locally, and exhaustion shows up as a silently deleted
// device. What consumers can see is "not found", "invalid option", and
// configuration/internal faults.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The named device is not listed, or is not ready to be opened.
    #[error("Device not found: {name}")]
    DeviceNotFound { name: String },

    /// The option index is outside the fixed table, or names a slot
    /// (a group marker) that has no readable value.
    #[error("Invalid option index: {index}")]
    InvalidOption { index: usize },

    /// Bad registry configuration (unusable transport settings, etc.)
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Internal invariant violation. Fatal to one device, not the process.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<scanfly_api::Error> for CoreError {
    fn from(err: scanfly_api::Error) -> Self {
        // Only client-construction failures cross this boundary; fetch
        // errors are consumed by the probe sweep.
        match err {
            scanfly_api::Error::Tls(msg) => CoreError::Config { message: msg },
            other => CoreError::Internal(other.to_string()),
        }
    }
}
