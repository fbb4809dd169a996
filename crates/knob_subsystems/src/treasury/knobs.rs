//! Treasury knob ids and the registry schema.

use knob_registry::{ParameterSpec, RegistrySchema};

pub const TAX_EFFICIENCY: &str = "tax_efficiency";
pub const SPENDING_DISCIPLINE: &str = "spending_discipline";
pub const DEFENSE_FUNDING_PRIORITY: &str = "defense_funding_priority";
pub const RESERVE_TARGET: &str = "reserve_target";

/// The treasury registry schema.
#[must_use]
pub fn schema() -> RegistrySchema {
    RegistrySchema::new("treasury")
        .param(ParameterSpec::scalar(
            TAX_EFFICIENCY,
            0.6,
            "Share of assessed taxes actually collected",
        ))
        .param(ParameterSpec::scalar(
            SPENDING_DISCIPLINE,
            0.5,
            "Restraint on civil spending",
        ))
        .param(ParameterSpec::scalar(
            DEFENSE_FUNDING_PRIORITY,
            0.5,
            "How much of the defense request is honoured; 0.5 funds it in full",
        ))
        .param(
            ParameterSpec::scalar(
                RESERVE_TARGET,
                0.2,
                "Target reserves as a fraction of annual revenue",
            )
            .with_bounds(0.0, 0.5),
        )
}
