//! Military output channels.

use knob_projector::{
    AlertFeed, ChannelRole, FnChannel, ProjectionError, Projector, ProjectorError, to_payload,
};
use knob_sim::Severity;
use serde_json::{Value, json};

use super::analysis;
use super::state::MilitaryState;
use crate::exchange::{RESOURCE_DEMAND_CHANNEL, ResourceDemand};

/// Build the military projector with every channel registered.
///
/// # Errors
///
/// Returns [`ProjectorError`] only if two channels share a name.
pub fn projector() -> Result<Projector<MilitaryState>, ProjectorError> {
    Projector::new("military")
        .with(
            FnChannel::new("readiness", ChannelRole::Metrics, readiness)
                .with_description("Flat readiness, posture and force metrics")
                .with_fallback(json!({
                    "overall_readiness": 0.6,
                    "personnel_readiness": 0.6,
                    "equipment_readiness": 0.6,
                    "logistics_readiness": 0.6,
                    "intelligence_readiness": 0.6,
                    "posture": Severity::Moderate,
                })),
        )?
        .with(
            FnChannel::new("force_structure", ChannelRole::Custom, force_structure)
                .with_description("Force composition and deployment status")
                .with_fallback(json!({
                    "active_personnel": 50_000,
                    "reserve_personnel": 25_000,
                    "force_capability_index": 0.6,
                })),
        )?
        .with(
            FnChannel::new("defense_capabilities", ChannelRole::Custom, defense_capabilities)
                .with_description("Defensive capability levels")
                .with_fallback(json!({ "overall_defense_index": 0.6 })),
        )?
        .with(
            FnChannel::new("threat_analysis", ChannelRole::Analysis, threat_analysis)
                .with_description("Threat assessment and security situation")
                .with_fallback(json!({
                    "current_threat_level": 0.3,
                    "threat_category": Severity::Low,
                    "identified_threats": [],
                })),
        )?
        .with(
            FnChannel::new("operations", ChannelRole::Custom, operations)
                .with_description("Active operations, deployments and exercises")
                .with_fallback(json!({
                    "active_operations": [],
                    "operational_tempo": 0.5,
                    "mission_readiness": 0.6,
                })),
        )?
        .with(
            FnChannel::new("resource_utilization", ChannelRole::Custom, resource_utilization)
                .with_description("Budget use and resource constraints")
                .with_fallback(json!({ "budget_efficiency": 0.6, "resource_constraints": [] })),
        )?
        .with(
            FnChannel::new("training_status", ChannelRole::Custom, training_status)
                .with_description("Training programs and doctrine")
                .with_fallback(json!({
                    "training_effectiveness": 0.7,
                    "military_doctrine": "balanced_defense",
                })),
        )?
        .with(
            FnChannel::new("international_relations", ChannelRole::Custom, international_relations)
                .with_description("Alliances and cooperation")
                .with_fallback(json!({ "alliances": [], "cooperation_index": 0.4 })),
        )?
        .with(
            FnChannel::new("analysis", ChannelRole::Analysis, assessment)
                .with_description("Capability gaps, strengths, risk and investment priorities")
                .with_fallback(json!({
                    "capability_gaps": [],
                    "strength_areas": [],
                    "investment_priorities": [],
                })),
        )?
        .with(
            FnChannel::new("alerts", ChannelRole::Alerts, alerts)
                .with_description("Threshold-crossing alerts")
                .with_fallback(json!([])),
        )?
        .with(
            FnChannel::new(RESOURCE_DEMAND_CHANNEL, ChannelRole::CrossSystem, resource_demand)
                .with_description("Budget, personnel and readiness demand for other subsystems")
                .with_fallback(Value::Null),
        )
}

fn readiness(state: &MilitaryState) -> Result<Value, ProjectionError> {
    Ok(json!({
        "overall_readiness": state.overall_readiness,
        "personnel_readiness": state.personnel_readiness,
        "equipment_readiness": state.equipment_readiness,
        "logistics_readiness": state.logistics_readiness,
        "intelligence_readiness": state.intelligence_readiness,
        "posture": state.posture,
        "threat_level": state.threat_level,
        "active_personnel": state.active_personnel,
        "budget_total": state.budget.total,
        "funding_availability": state.funding_availability,
        "defense_index": state.capabilities.defense_index(),
        "force_capability_index": state.force_capability_index(),
    }))
}

fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 / whole as f64 * 1000.0).round() / 10.0
}

fn force_structure(state: &MilitaryState) -> Result<Value, ProjectionError> {
    let active = state.active_personnel;
    let distribution: serde_json::Map<String, Value> = state
        .branches
        .iter()
        .map(|(name, branch)| {
            let entry = json!({
                "personnel": branch.personnel,
                "percentage": percentage(branch.personnel, active),
                "readiness": branch.readiness,
                "equipment_status": branch.equipment_status,
                "training_level": branch.training_level,
                "capability_index": branch.capability_index,
            });
            (name.clone(), entry)
        })
        .collect();
    let deployed = state.deployed_personnel();

    Ok(json!({
        "active_personnel": active,
        "reserve_personnel": state.reserve_personnel,
        "civilian_personnel": state.civilian_personnel,
        "branch_distribution": distribution,
        "force_capability_index": state.force_capability_index(),
        "deployment_status": {
            "total_deployed": deployed,
            "deployment_percentage": percentage(deployed, active),
            "available_for_deployment": active.saturating_sub(deployed),
        },
    }))
}

fn defense_capabilities(state: &MilitaryState) -> Result<Value, ProjectionError> {
    let mut payload = to_payload(&state.capabilities)?;
    if let Value::Object(map) = &mut payload {
        map.insert(
            "overall_defense_index".to_string(),
            json!(state.capabilities.defense_index()),
        );
    }
    Ok(payload)
}

fn threat_analysis(state: &MilitaryState) -> Result<Value, ProjectionError> {
    Ok(json!({
        "current_threat_level": state.threat_level,
        "threat_category": state.threat_category,
        "alert_status": state.alert_status,
        "identified_threats": to_payload(&state.threats)?,
        "threat_sources": to_payload(&state.threat_sources)?,
        "defense_posture": state.doctrine,
    }))
}

fn operations(state: &MilitaryState) -> Result<Value, ProjectionError> {
    Ok(json!({
        "active_operations": to_payload(&state.operations)?,
        "deployments": to_payload(&state.deployments)?,
        "exercise_schedule": to_payload(&state.exercises)?,
        "operational_tempo": analysis::operational_tempo(state),
        "mission_readiness": analysis::mission_readiness(state),
    }))
}

fn resource_utilization(state: &MilitaryState) -> Result<Value, ProjectionError> {
    Ok(json!({
        "budget_allocation": to_payload(&state.budget)?,
        "funding_availability": state.funding_availability,
        "budget_efficiency": analysis::budget_efficiency(state),
        "resource_constraints": analysis::resource_constraints(state),
        "investment_priorities": to_payload(&analysis::investment_priorities(state))?,
    }))
}

fn training_status(state: &MilitaryState) -> Result<Value, ProjectionError> {
    let effectiveness = state.training_effectiveness;
    Ok(json!({
        "training_effectiveness": effectiveness,
        "training_programs": to_payload(&state.training_programs)?,
        "military_doctrine": state.doctrine,
        "professional_development": {
            "leadership_programs": state.training_programs.contains_key("leadership_development"),
            "technical_training": state.training_programs.contains_key("technical_specialization"),
            "career_progression": effectiveness,
            "retention_rate": (0.7 + effectiveness * 0.2).min(1.0),
        },
    }))
}

fn international_relations(state: &MilitaryState) -> Result<Value, ProjectionError> {
    let cooperation = analysis::cooperation_index(state);
    Ok(json!({
        "alliances": to_payload(&state.alliances)?,
        "military_agreements": to_payload(&state.agreements)?,
        "cooperation_index": cooperation,
        "diplomatic_military_status": {
            "alliance_strength": cooperation,
            "international_standing": (0.5 + cooperation * 0.3).min(1.0),
            "conflict_risk": state.threat_level,
            "cooperation_opportunities": state.alliances.len() + state.agreements.len(),
        },
    }))
}

fn assessment(state: &MilitaryState) -> Result<Value, ProjectionError> {
    Ok(json!({
        "capability_gaps": to_payload(&analysis::capability_gaps(state))?,
        "strength_areas": to_payload(&analysis::strengths(state))?,
        "risk_assessment": to_payload(&analysis::risk_assessment(state))?,
        "investment_priorities": to_payload(&analysis::investment_priorities(state))?,
    }))
}

/// Alerts for the current state, empty when nothing is wrong.
#[must_use]
pub fn alert_feed(state: &MilitaryState) -> AlertFeed {
    let mut feed = AlertFeed::new()
        .below(
            state.overall_readiness,
            0.5,
            "low_readiness",
            Severity::High,
            format!("Overall readiness at {:.0}%", state.overall_readiness * 100.0),
        )
        .above(
            state.threat_level,
            0.6,
            "elevated_threat",
            state.threat_category,
            format!("Threat level at {:.0}%", state.threat_level * 100.0),
        )
        .below(
            state.funding_availability,
            0.6,
            "underfunded",
            Severity::High,
            format!(
                "Only {:.0}% of the defense budget is funded",
                state.funding_availability * 100.0
            ),
        )
        .below(
            state.equipment_readiness,
            0.4,
            "equipment_degraded",
            Severity::Moderate,
            format!("Equipment readiness at {:.0}%", state.equipment_readiness * 100.0),
        );

    for gap in analysis::capability_gaps(state).iter().filter(|g| g.current_level < 0.3) {
        feed = feed.when(
            true,
            "capability_gap",
            Severity::Moderate,
            format!("{} capability at {:.0}%", gap.capability, gap.current_level * 100.0),
        );
    }
    for threat in state.threats.iter().filter(|t| t.severity > 0.8) {
        feed = feed.when(
            true,
            "critical_threat",
            Severity::Critical,
            format!("{} threat '{}' from {}", threat.kind, threat.id, threat.source),
        );
    }
    feed
}

fn alerts(state: &MilitaryState) -> Result<Value, ProjectionError> {
    to_payload(&alert_feed(state))
}

/// The cross-system demand payload.
#[must_use]
pub fn demand(state: &MilitaryState) -> ResourceDemand {
    ResourceDemand {
        budget_request: analysis::budget_request(state),
        personnel: state.active_personnel,
        readiness: state.overall_readiness,
        threat_level: state.threat_level,
    }
}

fn resource_demand(state: &MilitaryState) -> Result<Value, ProjectionError> {
    to_payload(&demand(state))
}
