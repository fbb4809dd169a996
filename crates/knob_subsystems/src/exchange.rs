//! Cross-system payloads exchanged between subsystem instances.
//!
//! These are the only shapes one instance reads from another. They carry
//! plain quantities (money, headcount, unit ratios) and nothing specific to
//! the producing subsystem's internals.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Channel on which the military instance publishes [`ResourceDemand`].
pub const RESOURCE_DEMAND_CHANNEL: &str = "resource_demand";

/// Channel on which the treasury instance publishes [`FundingAvailability`].
pub const FUNDING_CHANNEL: &str = "funding";

/// What a defense establishment asks of the economy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceDemand {
    /// Requested annual budget in currency units.
    pub budget_request: f64,
    /// Active personnel drawn from the labour force.
    pub personnel: u64,
    /// Overall readiness in `[0, 1]`.
    pub readiness: f64,
    /// Assessed threat level in `[0, 1]`.
    pub threat_level: f64,
}

impl ResourceDemand {
    /// Parse a published payload, ignoring anything that does not fit.
    #[must_use]
    pub fn from_payload(payload: &Value) -> Option<Self> {
        Self::deserialize(payload).ok().filter(|d| d.budget_request.is_finite())
    }
}

/// How much of the requested defense budget the treasury can fund.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FundingAvailability {
    /// Funded share of the last request, in `[0, 1]`.
    pub funding_availability: f64,
}

impl FundingAvailability {
    #[must_use]
    pub fn from_payload(payload: &Value) -> Option<Self> {
        Self::deserialize(payload)
            .ok()
            .filter(|f| f.funding_availability.is_finite())
    }
}
