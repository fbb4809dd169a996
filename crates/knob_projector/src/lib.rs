//! # knob_projector
//!
//! Output projection for simulation subsystems.
//!
//! A [`Projector`] holds a set of named [`Channel`]s, each a pure function
//! from the subsystem state to one JSON payload shape: flat dashboard
//! metrics, derived analysis, alert feeds, the narrow cross-system payload
//! other instances consume. Channels fail independently. A channel that
//! errors or panics is replaced by its declared fallback and reported as a
//! [`ChannelFault`]; every other channel is unaffected.
//!
//! ## Usage
//!
//! ```rust
//! use knob_projector::{ChannelRole, FnChannel, ProjectionError, Projector};
//! use serde_json::{Value, json};
//!
//! fn readiness(level: &f64) -> Result<Value, ProjectionError> {
//!     Ok(json!({ "readiness": level }))
//! }
//!
//! let mut projector = Projector::new("military");
//! projector
//!     .register(FnChannel::new("readiness", ChannelRole::Metrics, readiness))
//!     .unwrap();
//!
//! let set = projector.project_all(&0.75);
//! assert_eq!(set.payload("readiness"), Some(&json!({ "readiness": 0.75 })));
//! ```

pub mod alert;
pub mod channel;
pub mod error;
pub mod projector;

pub use alert::{Alert, AlertFeed};
pub use channel::{Channel, ChannelRole, FnChannel, to_payload};
pub use error::{ChannelFault, ProjectionError, ProjectorError};
pub use projector::{ChannelInfo, Projection, ProjectionSet, Projector};
