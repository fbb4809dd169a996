//! # knob_registry
//!
//! The parameter ("knob") registry for one simulation subsystem instance.
//!
//! A registry is built from a declared [`RegistrySchema`] at start-up and
//! then absorbs updates from external controllers (an AI director, an
//! operator console) that do not agree on a single encoding. Every write is
//! validated against the parameter's kind and clamped to its bounds, and the
//! fate of every requested entry is reported back in an [`UpdateResult`].
//!
//! This crate provides:
//!
//! - [`Parameter`] / [`ParamValue`]: one tunable control and its value.
//! - [`RegistrySchema`] / [`ParameterSpec`]: the declared, fixed schema.
//! - [`UpdateRequest`] / [`Directive`]: absolute, relative and directive writes.
//! - [`Registry`]: describe, snapshot, update, reset, restore.
//! - [`Snapshot`]: an owned copy of the current values with typed accessors.
//!
//! ## Usage
//!
//! ```rust
//! use indexmap::IndexMap;
//! use knob_registry::{Registry, RegistrySchema, ParameterSpec, UpdateRequest, OutcomeStatus};
//!
//! let schema = RegistrySchema::new("military")
//!     .param(ParameterSpec::scalar("defense_readiness_level", 0.7, "Overall readiness"));
//! let mut registry = Registry::new(schema).unwrap();
//!
//! let mut requests = IndexMap::new();
//! requests.insert("defense_readiness_level".to_string(), UpdateRequest::Relative(0.5));
//! let result = registry.update(requests, "ai");
//!
//! assert_eq!(result.outcomes["defense_readiness_level"].status, OutcomeStatus::AcceptedClamped);
//! assert_eq!(result.snapshot.scalar("defense_readiness_level"), Some(1.0));
//! ```

pub mod error;
pub mod json;
pub mod outcome;
pub mod parameter;
pub mod registry;
pub mod request;
pub mod schema;
pub mod snapshot;

pub use error::SchemaError;
pub use outcome::{OutcomeStatus, ParameterOutcome, UpdateResult};
pub use parameter::{ParamValue, Parameter, ParameterKind, ParameterMetadata, SYSTEM_DEFAULT_SOURCE};
pub use registry::{Registry, RestoreReport};
pub use request::{DIRECTIVE_STEP, Directive, UnknownDirective, UpdateRequest};
pub use schema::{ParameterSpec, RegistrySchema};
pub use snapshot::Snapshot;
