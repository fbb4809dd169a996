//! Registry construction errors.

/// Errors raised while validating a [`RegistrySchema`](crate::RegistrySchema).
///
/// These only occur at start-up. Once a registry exists, updates never fail
/// with an error; they report per-entry outcomes instead.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    /// Two parameters share the same id.
    #[error("duplicate parameter id: {0}")]
    DuplicateId(String),

    /// The declared lower bound exceeds the upper bound.
    #[error("parameter '{id}' has min {min} greater than max {max}")]
    InvalidBounds { id: String, min: f64, max: f64 },

    /// A bound or default is NaN or infinite.
    #[error("parameter '{0}' declares a non-finite number")]
    NonFinite(String),

    /// The default value lies outside the declared bounds.
    #[error("parameter '{id}' default is outside [{min}, {max}]")]
    DefaultOutOfBounds { id: String, min: f64, max: f64 },

    /// An enum parameter declares no variants.
    #[error("enum parameter '{0}' declares no variants")]
    EmptyEnum(String),

    /// An enum parameter's default is not one of its variants.
    #[error("enum parameter '{id}' default '{default}' is not a declared variant")]
    UnknownEnumDefault { id: String, default: String },

    /// A structured parameter declares no sub-weights.
    #[error("structured parameter '{0}' declares no sub-weights")]
    EmptyStructure(String),

    /// The declared default does not match the declared kind.
    #[error("parameter '{0}' default does not match its kind")]
    KindMismatch(String),
}
