//! The treasury subsystem.
//!
//! Collects revenue, funds the defense request published by the military
//! instance and tracks reserves. Its `funding` channel feeds back into the
//! military budget on the following tick.

pub mod channels;
pub mod knobs;
pub mod rules;
pub mod state;

use knob_registry::Registry;
use knob_sim::Simulator;
use tracing::debug;

pub use state::{TreasurySignals, TreasuryState};

use crate::{BuildError, Parts};

pub const NAME: &str = "treasury";

/// Assemble a treasury instance with the seed state.
///
/// # Errors
///
/// Returns [`BuildError`] if the bundled schema or channel set is invalid.
pub fn build() -> Result<Parts<TreasuryState, TreasurySignals>, BuildError> {
    let parts = Parts {
        registry: Registry::new(knobs::schema())?,
        simulator: Simulator::new(NAME, TreasuryState::default(), rules::pipeline()),
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
