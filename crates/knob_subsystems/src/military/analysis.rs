//! Derived military assessments.
//!
//! Everything here is a pure function of [`MilitaryState`] and is recomputed
//! on every projection, so none of it is stored in the state record.

use knob_sim::rules::{clamp_to, clamp_unit, mean};
use serde::{Deserialize, Serialize};

use super::state::{BASE_BUDGET, MilitaryState};

/// Capabilities below this level are reported as gaps.
pub const GAP_FLOOR: f64 = 0.5;
/// Capabilities above this level are reported as strengths.
pub const STRENGTH_FLOOR: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityGap {
    pub capability: String,
    pub current_level: f64,
    pub gap_severity: f64,
    pub priority: Priority,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strength {
    pub capability: String,
    pub strength_level: f64,
    pub advantage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub overall_risk: f64,
    pub readiness_risk: f64,
    pub capability_risk: f64,
    pub resource_risk: f64,
    pub mitigation_strategies: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentPriority {
    pub area: String,
    pub priority: Priority,
    pub investment_type: String,
}

/// Capabilities below [`GAP_FLOOR`], widest gap first.
#[must_use]
pub fn capability_gaps(state: &MilitaryState) -> Vec<CapabilityGap> {
    let mut gaps: Vec<CapabilityGap> = state
        .capabilities
        .levels()
        .into_iter()
        .filter(|(_, level)| *level < GAP_FLOOR)
        .map(|(name, level)| CapabilityGap {
            capability: name.to_string(),
            current_level: level,
            gap_severity: GAP_FLOOR - level,
            priority: if level < 0.3 { Priority::High } else { Priority::Medium },
        })
        .collect();
    gaps.sort_by(|a, b| b.gap_severity.total_cmp(&a.gap_severity));
    gaps
}

/// Capabilities above [`STRENGTH_FLOOR`], strongest first.
#[must_use]
pub fn strengths(state: &MilitaryState) -> Vec<Strength> {
    let mut strengths: Vec<Strength> = state
        .capabilities
        .levels()
        .into_iter()
        .filter(|(_, level)| *level > STRENGTH_FLOOR)
        .map(|(name, level)| Strength {
            capability: name.to_string(),
            strength_level: level,
            advantage: level - STRENGTH_FLOOR,
        })
        .collect();
    strengths.sort_by(|a, b| b.strength_level.total_cmp(&a.strength_level));
    strengths
}

/// Risk from thin personnel or equipment budgets and from underfunding.
#[must_use]
pub fn resource_risk(state: &MilitaryState) -> f64 {
    let mut risk = 0.0;
    if state.budget.share("personnel") < 0.3 {
        risk += 0.3;
    }
    if state.budget.share("equipment") < 0.2 {
        risk += 0.2;
    }
    risk += (1.0 - state.funding_availability) * 0.5;
    clamp_unit(risk)
}

#[must_use]
pub fn mitigation_strategies(state: &MilitaryState) -> Vec<String> {
    let mut strategies = Vec::new();
    if state.overall_readiness < 0.6 {
        strategies.push("Increase training intensity and frequency".to_string());
    }
    if state.threat_level > 0.6 {
        strategies.push("Enhance intelligence gathering and threat monitoring".to_string());
    }
    if state.equipment_readiness < 0.6 {
        strategies.push("Accelerate equipment modernization program".to_string());
    }
    if state.funding_availability < 0.8 {
        strategies.push("Negotiate supplementary defense appropriations".to_string());
    }
    strategies
}

#[must_use]
pub fn risk_assessment(state: &MilitaryState) -> RiskAssessment {
    RiskAssessment {
        overall_risk: state.threat_level,
        readiness_risk: 1.0 - state.overall_readiness,
        capability_risk: 1.0 - state.capabilities.defense_index(),
        resource_risk: resource_risk(state),
        mitigation_strategies: mitigation_strategies(state),
    }
}

/// Up to three capability gaps, then modernization if equipment is lagging.
#[must_use]
pub fn investment_priorities(state: &MilitaryState) -> Vec<InvestmentPriority> {
    let mut priorities: Vec<InvestmentPriority> = capability_gaps(state)
        .into_iter()
        .take(3)
        .map(|gap| InvestmentPriority {
            area: gap.capability,
            priority: gap.priority,
            investment_type: "capability_improvement".to_string(),
        })
        .collect();
    if state.equipment_readiness < 0.6 {
        priorities.push(InvestmentPriority {
            area: "equipment_modernization".to_string(),
            priority: Priority::High,
            investment_type: "modernization".to_string(),
        });
    }
    priorities
}

#[must_use]
pub fn resource_constraints(state: &MilitaryState) -> Vec<String> {
    let mut constraints = Vec::new();
    if state.budget.share("personnel") < 0.35 {
        constraints.push("Insufficient personnel funding".to_string());
    }
    if state.budget.share("equipment") < 0.2 {
        constraints.push("Limited equipment procurement budget".to_string());
    }
    if state.budget.share("research") < 0.08 {
        constraints.push("Inadequate R&D investment".to_string());
    }
    if state.funding_availability < 1.0 {
        constraints.push("Defense budget not fully funded".to_string());
    }
    constraints
}

/// Readiness bought per billion spent, normalised to `[0, 1]`.
#[must_use]
pub fn budget_efficiency(state: &MilitaryState) -> f64 {
    let billions = state.budget.total / 1_000_000_000.0;
    if billions <= 0.0 {
        return 0.0;
    }
    clamp_unit(state.overall_readiness / billions * 10.0)
}

#[must_use]
pub fn operational_tempo(state: &MilitaryState) -> f64 {
    let load = state.operations.len() as f64 * 0.4
        + state.deployments.len() as f64 * 0.3
        + state.exercises.len() as f64 * 0.3;
    clamp_unit(load / 10.0)
}

#[must_use]
pub fn mission_readiness(state: &MilitaryState) -> f64 {
    mean(&[state.overall_readiness, state.capabilities.defense_index()])
}

#[must_use]
pub fn cooperation_index(state: &MilitaryState) -> f64 {
    let strengths: Vec<f64> = state.alliances.iter().map(|a| a.strength).collect();
    let agreements = state.agreements.len() as f64 / 5.0;
    clamp_unit((mean(&strengths) + agreements) / 2.0)
}

/// Budget the military asks for: full base budget at default readiness and
/// threat, more as either rises.
#[must_use]
pub fn budget_request(state: &MilitaryState) -> f64 {
    let pressure = 0.5 + state.overall_readiness * 0.5 + state.threat_level * 0.5;
    BASE_BUDGET * clamp_to(pressure, 0.5, 1.5)
}
