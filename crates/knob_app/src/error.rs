//! Driver error types.

use knob_sim::InvalidField;
use knob_subsystems::BuildError;

/// Errors from encoding or decoding a subsystem snapshot.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// Failed to encode a snapshot to MessagePack.
    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    /// Failed to decode a snapshot from MessagePack.
    #[error("failed to decode snapshot: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    /// Failed to encode or decode a JSON snapshot.
    #[error("JSON snapshot error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors from wiring or driving subsystem instances.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// A bundled subsystem failed to assemble.
    #[error("failed to build subsystem: {0}")]
    Build(#[from] BuildError),

    /// Two instances were added under the same name.
    #[error("instance '{0}' is already registered")]
    DuplicateInstance(String),

    /// No instance with this name is registered.
    #[error("unknown instance '{0}'")]
    UnknownInstance(String),

    /// A snapshot was taken from a different instance.
    #[error("snapshot of '{found}' cannot be imported into '{expected}'")]
    SnapshotMismatch { expected: String, found: String },

    /// A snapshot's state record failed validation.
    #[error("snapshot state is invalid: {0}")]
    InvalidState(#[from] InvalidField),

    #[error(transparent)]
    Persist(#[from] PersistError),

    /// The async runtime for a parallel run could not be started.
    #[error("failed to start the async runtime: {0}")]
    Runtime(#[from] std::io::Error),

    /// A parallel tick worker did not complete.
    #[error("tick worker failed: {0}")]
    Worker(String),
}
