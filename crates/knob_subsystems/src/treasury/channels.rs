//! Treasury output channels.

use knob_projector::{AlertFeed, ChannelRole, FnChannel, ProjectionError, Projector, ProjectorError, to_payload};
use knob_sim::Severity;
use serde_json::{Value, json};

use super::state::TreasuryState;
use crate::exchange::{FUNDING_CHANNEL, FundingAvailability};

/// Build the treasury projector.
///
/// # Errors
///
/// Returns [`ProjectorError`] only if two channels share a name.
pub fn projector() -> Result<Projector<TreasuryState>, ProjectorError> {
    Projector::new("treasury")
        .with(
            FnChannel::new("metrics", ChannelRole::Metrics, metrics)
                .with_description("Revenue, spending, reserves and fiscal stress")
                .with_fallback(json!({ "stress_level": 0.0, "fiscal_stress": Severity::Minimal })),
        )?
        .with(
            FnChannel::new("alerts", ChannelRole::Alerts, alerts)
                .with_description("Fiscal alerts")
                .with_fallback(json!([])),
        )?
        .with(
            FnChannel::new(FUNDING_CHANNEL, ChannelRole::CrossSystem, funding)
                .with_description("Funded share of the defense request")
                .with_fallback(Value::Null),
        )
}

fn metrics(state: &TreasuryState) -> Result<Value, ProjectionError> {
    Ok(json!({
        "revenue_index": state.revenue_index,
        "revenue": state.revenue,
        "civil_spending": state.civil_spending,
        "defense_demand": state.defense_demand,
        "defense_outlay": state.defense_outlay,
        "balance": state.balance(),
        "reserves": state.reserves,
        "reserve_ratio": state.reserve_ratio(),
        "funding_availability": state.funding_availability,
        "stress_level": state.stress_level,
        "fiscal_stress": state.fiscal_stress,
    }))
}

/// Alerts for the current state, empty when nothing is wrong.
#[must_use]
pub fn alert_feed(state: &TreasuryState) -> AlertFeed {
    AlertFeed::new()
        .above(
            state.stress_level,
            0.6,
            "fiscal_stress",
            state.fiscal_stress,
            format!("Fiscal stress at {:.0}%", state.stress_level * 100.0),
        )
        .when(
            state.reserves <= 0.0,
            "reserves_exhausted",
            Severity::High,
            "Reserves are exhausted",
        )
        .below(
            state.funding_availability,
            0.6,
            "defense_underfunded",
            Severity::Moderate,
            format!(
                "Defense request funded at {:.0}%",
                state.funding_availability * 100.0
            ),
        )
}

fn alerts(state: &TreasuryState) -> Result<Value, ProjectionError> {
    to_payload(&alert_feed(state))
}

fn funding(state: &TreasuryState) -> Result<Value, ProjectionError> {
    to_payload(&FundingAvailability {
        funding_availability: state.funding_availability,
    })
}
