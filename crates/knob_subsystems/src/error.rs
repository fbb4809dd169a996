//! Subsystem construction errors.

use knob_projector::ProjectorError;
use knob_registry::SchemaError;

/// A bundled subsystem could not be assembled.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("invalid parameter schema: {0}")]
    Schema(#[from] SchemaError),

    #[error("invalid channel set: {0}")]
    Projector(#[from] ProjectorError),
}
