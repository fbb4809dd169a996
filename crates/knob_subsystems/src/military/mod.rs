//! The military reference subsystem.
//!
//! Thirteen knobs drive a ten-rule pipeline over [`MilitaryState`]: readiness
//! convergence, budget reallocation, threat absorption, posture, force
//! structure, training and doctrine, operations, cooperation, capabilities
//! and equipment. Eleven channels project the result, including the
//! `resource_demand` cross-system payload read by the treasury.

pub mod analysis;
pub mod channels;
pub mod knobs;
pub mod rules;
pub mod signals;
pub mod state;

use knob_registry::Registry;
use knob_sim::Simulator;
use tracing::debug;

pub use signals::{ExternalThreat, MilitarySignals};
pub use state::MilitaryState;

use crate::{BuildError, Parts};

pub const NAME: &str = "military";

/// Assemble a military instance with the seed state.
///
/// # Errors
///
/// Returns [`BuildError`] if the bundled schema or channel set is invalid.
pub fn build() -> Result<Parts<MilitaryState, MilitarySignals>, BuildError> {
    let parts = Parts {
        registry: Registry::new(knobs::schema())?,
        simulator: Simulator::new(NAME, MilitaryState::default(), rules::pipeline()),
        projector: channels::projector()?,
    };
    debug!(
        subsystem = NAME,
        knobs = parts.registry.len(),
        rules = parts.simulator.pipeline().len(),
        channels = parts.projector.len(),
        "subsystem assembled"
    );
    Ok(parts)
}
