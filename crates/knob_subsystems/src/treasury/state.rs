//! The treasury state record and signals.

use knob_sim::state::{check_non_negative, check_unit};
use knob_sim::{InvalidField, Severity, SimState};
use serde::{Deserialize, Serialize};

use crate::exchange::ResourceDemand;

/// Annual revenue at perfect collection.
pub const BASE_REVENUE: f64 = 200_000_000_000.0;

/// Everything the treasury simulator tracks between ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreasuryState {
    /// Collection quality in `[0, 1]`.
    pub revenue_index: f64,
    pub revenue: f64,
    pub civil_spending: f64,
    /// Last defense budget requested.
    pub defense_demand: f64,
    pub defense_outlay: f64,
    pub reserves: f64,
    /// Share of the defense request currently funded.
    pub funding_availability: f64,
    pub stress_level: f64,
    pub fiscal_stress: Severity,
    pub last_update_ms: u64,
}

impl Default for TreasuryState {
    fn default() -> Self {
        Self {
            revenue_index: 0.57,
            revenue: 157_000_000_000.0,
            civil_spending: 110_000_000_000.0,
            defense_demand: 50_000_000_000.0,
            defense_outlay: 50_000_000_000.0,
            reserves: 30_000_000_000.0,
            funding_availability: 1.0,
            stress_level: 0.15,
            fiscal_stress: Severity::Minimal,
            last_update_ms: 0,
        }
    }
}

impl TreasuryState {
    /// Annual surplus (negative for a deficit).
    #[must_use]
    pub fn balance(&self) -> f64 {
        self.revenue - self.civil_spending - self.defense_outlay
    }

    /// Reserves as a fraction of annual revenue.
    #[must_use]
    pub fn reserve_ratio(&self) -> f64 {
        if self.revenue > 0.0 { self.reserves / self.revenue } else { 0.0 }
    }
}

impl SimState for TreasuryState {
    fn check(&self) -> Result<(), InvalidField> {
        check_unit("revenue_index", self.revenue_index)?;
        check_unit("funding_availability", self.funding_availability)?;
        check_unit("stress_level", self.stress_level)?;
        check_non_negative("revenue", self.revenue)?;
        check_non_negative("civil_spending", self.civil_spending)?;
        check_non_negative("defense_demand", self.defense_demand)?;
        check_non_negative("defense_outlay", self.defense_outlay)?;
        check_non_negative("reserves", self.reserves)
    }
}

/// Signals for one treasury tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreasurySignals {
    /// The military's latest published demand. Absent keeps the last one.
    pub defense_demand: Option<ResourceDemand>,
}
