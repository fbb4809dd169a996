//! Bundled instances with their cross-system adapters.
//!
//! The military instance reads the treasury's `funding` payload and the
//! treasury reads the military's `resource_demand` payload, both from the
//! previous tick.

use knob_subsystems::military::{self, MilitarySignals, MilitaryState};
use knob_subsystems::treasury::{self, TreasurySignals, TreasuryState};
use knob_subsystems::{FUNDING_CHANNEL, FundingAvailability, RESOURCE_DEMAND_CHANNEL, ResourceDemand};

use crate::bulletin::Bulletin;
use crate::error::DriverError;
use crate::subsystem::Subsystem;
use crate::tick::{TickConfig, TickLoop};

fn read_funding(bulletin: &Bulletin, signals: &mut MilitarySignals) {
    let funding = bulletin
        .read(treasury::NAME, FUNDING_CHANNEL)
        .and_then(|payload| FundingAvailability::from_payload(&payload));
    if let Some(funding) = funding {
        signals.funding_availability = Some(funding.funding_availability);
    }
}

fn read_demand(bulletin: &Bulletin, signals: &mut TreasurySignals) {
    let demand = bulletin
        .read(military::NAME, RESOURCE_DEMAND_CHANNEL)
        .and_then(|payload| ResourceDemand::from_payload(&payload));
    if demand.is_some() {
        signals.defense_demand = demand;
    }
}

/// A military instance funded by the treasury instance.
///
/// # Errors
///
/// Returns [`DriverError::Build`] if the bundled subsystem is invalid.
pub fn military() -> Result<Subsystem<MilitaryState, MilitarySignals>, DriverError> {
    Ok(Subsystem::from_parts(military::build()?).with_adapter(read_funding))
}

/// A treasury instance funding the military instance's demand.
///
/// # Errors
///
/// Returns [`DriverError::Build`] if the bundled subsystem is invalid.
pub fn treasury() -> Result<Subsystem<TreasuryState, TreasurySignals>, DriverError> {
    Ok(Subsystem::from_parts(treasury::build()?).with_adapter(read_demand))
}

/// A tick loop running the coupled military and treasury instances.
///
/// # Errors
///
/// Returns [`DriverError`] if either instance fails to build.
pub fn coupled(config: TickConfig) -> Result<TickLoop, DriverError> {
    let mut tick_loop = TickLoop::new(config);
    tick_loop.add(military()?)?;
    tick_loop.add(treasury()?)?;
    Ok(tick_loop)
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    fn priority_zero() -> serde_json::Map<String, Value> {
        let mut map = serde_json::Map::new();
        map.insert("defense_funding_priority".to_string(), json!(0.0));
        map
    }

    #[test]
    fn test_adapters_ignore_missing_posts() {
        let bulletin = Bulletin::new();
        let mut signals = MilitarySignals::default();
        read_funding(&bulletin, &mut signals);
        assert_eq!(signals.funding_availability, None);

        bulletin.publish(treasury::NAME, FUNDING_CHANNEL, json!({ "funding_availability": "lots" }));
        read_funding(&bulletin, &mut signals);
        assert_eq!(signals.funding_availability, None);
    }

    #[test]
    fn test_low_priority_squeezes_military_budget() {
        let mut tick_loop = coupled(TickConfig::default()).unwrap();
        tick_loop
            .instance_mut(treasury::NAME)
            .unwrap()
            .update_json(&priority_zero(), "operator");
        for _ in 0..12 {
            tick_loop.tick();
        }

        let army = tick_loop.instance(military::NAME).unwrap().state_json().unwrap();
        let budget = army["budget"]["total"].as_f64().unwrap();
        assert!(budget < 0.6 * military::state::BASE_BUDGET, "budget {budget}");

        let funding = tick_loop.bulletin().read(treasury::NAME, FUNDING_CHANNEL).unwrap();
        assert!(funding["funding_availability"].as_f64().unwrap() < 0.6);
    }
}
