//! # knob_subsystems
//!
//! Concrete subsystems built on the knob engine crates.
//!
//! Each subsystem module exposes a registry schema, a state record, a
//! signals record, an ordered rule pipeline and a channel set, and a
//! `build()` function that assembles them into [`Parts`]:
//!
//! - [`military`]: the reference instance, covering readiness, budget,
//!   threats, force structure, operations, cooperation and capabilities.
//! - [`treasury`]: a smaller fiscal instance that funds the military's
//!   published demand.
//!
//! The two are coupled only through the payloads in [`exchange`].

pub mod error;
pub mod exchange;
pub mod military;
pub mod treasury;

use knob_projector::Projector;
use knob_registry::Registry;
use knob_sim::Simulator;

pub use error::BuildError;
pub use exchange::{FUNDING_CHANNEL, FundingAvailability, RESOURCE_DEMAND_CHANNEL, ResourceDemand};

/// The registry, simulator and projector of one subsystem instance.
#[derive(Debug)]
pub struct Parts<S, G> {
    pub registry: Registry,
    pub simulator: Simulator<S, G>,
    pub projector: Projector<S>,
}
