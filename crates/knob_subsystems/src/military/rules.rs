//! The military tick pipeline.
//!
//! Rules run in the order [`pipeline`] registers them. Each state field has
//! exactly one owning rule, named in that rule's doc comment; other rules
//! only read it. Knobs are read through the tick context, falling back to
//! the schema default if a knob is missing.

use indexmap::IndexMap;
use knob_sim::rules::{clamp_to, clamp_unit, mean, reallocate, reallocate_units, smooth_toward};
use knob_sim::{CutPoints, FnRule, Pipeline, RuleError, Severity, TickContext};

use super::knobs::{
    BORDER_SECURITY_EMPHASIS, BUDGET_CATEGORIES, CYBER_DEFENSE_PRIORITY, DEFENSE_READINESS_LEVEL,
    FORCE_MODERNIZATION_RATE, INTELLIGENCE_GATHERING_INTENSITY, INTERNAL_SECURITY_FOCUS,
    INTERNATIONAL_COOPERATION_LEVEL, MILITARY_BUDGET_ALLOCATION, RESERVE_ACTIVATION_LEVEL, STRATEGIC_DOCTRINE,
    THREAT_ASSESSMENT_LEVEL, TRAINING_INTENSITY,
};
use super::signals::MilitarySignals;
use super::state::{
    Agreement, Alliance, AlertStatus, BASE_ACTIVE_PERSONNEL, BASE_BUDGET, BRANCH_DISTRIBUTION, Budget, Capabilities,
    Deployment, Doctrine, Exercise, MilitaryState, Operation, Threat, ThreatOrigin, ThreatSource, TrainingProgram,
};

type Ctx<'a> = TickContext<'a, MilitarySignals>;

const READINESS_RATE: f64 = 0.1;
const THREAT_RATE: f64 = 0.2;
const ALERT_RATE: f64 = 0.2;
const TRAINING_RATE: f64 = 0.05;

/// Tension above which a country is tracked as a threat.
pub const TENSION_THRESHOLD: f64 = 0.7;

pub const DIPLOMATIC_TENSION: &str = "diplomatic_tension";

/// Ticks a threat source is remembered after its last report.
pub const SOURCE_MEMORY_TICKS: u64 = 30;

const ALERT_CUTS: CutPoints<'static, AlertStatus> = CutPoints::new(
    &[
        (0.8, AlertStatus::HighAlert),
        (0.6, AlertStatus::Elevated),
        (0.4, AlertStatus::Normal),
    ],
    AlertStatus::Peacetime,
);

const TRAINING_PROGRAMS: [&str; 6] = [
    "basic_combat_training",
    "advanced_tactical_training",
    "leadership_development",
    "technical_specialization",
    "joint_operations_training",
    "cyber_warfare_training",
];

/// The ordered military pipeline.
#[must_use]
pub fn pipeline() -> Pipeline<MilitaryState, MilitarySignals> {
    Pipeline::new()
        .rule(FnRule::new("readiness", converge_readiness))
        .rule(FnRule::new("budget", reallocate_budget))
        .rule(FnRule::new("threat_assessment", assess_threats))
        .rule(FnRule::new("posture", categorize_posture))
        .rule(FnRule::new("force_structure", structure_forces))
        .rule(FnRule::new("training_doctrine", train_and_select_doctrine))
        .rule(FnRule::new("operations", plan_operations))
        .rule(FnRule::new("cooperation", update_cooperation))
        .rule(FnRule::new("capabilities", compute_capabilities))
        .rule(FnRule::new("equipment", maintain_equipment))
}

fn fraction_of(total: u64, fraction: f64) -> u64 {
    (total as f64 * clamp_unit(fraction)).floor() as u64
}

fn readiness_of(state: &MilitaryState, branch: &str) -> f64 {
    state.branch(branch).map_or(0.0, |b| b.readiness)
}

/// Writes `overall_readiness`, `logistics_readiness`,
/// `intelligence_readiness` and `last_update_ms`.
pub fn converge_readiness(state: &mut MilitaryState, ctx: &Ctx<'_>) -> Result<(), RuleError> {
    let target = ctx.knob(DEFENSE_READINESS_LEVEL, 0.7);
    let intelligence = ctx.knob(INTELLIGENCE_GATHERING_INTENSITY, 0.6);

    state.overall_readiness = clamp_unit(smooth_toward(state.overall_readiness, target, READINESS_RATE));
    state.logistics_readiness = clamp_unit(0.5 + state.budget.share("operations") * 2.0);
    state.intelligence_readiness = clamp_unit(0.4 + intelligence * 0.5);
    state.last_update_ms = ctx.now_ms;
    Ok(())
}

/// Writes `budget`, `funding_availability` and `personnel_readiness`, which
/// blends training intensity with the funded personnel share.
pub fn reallocate_budget(state: &mut MilitaryState, ctx: &Ctx<'_>) -> Result<(), RuleError> {
    let weights = ctx.params.weights(MILITARY_BUDGET_ALLOCATION).cloned().unwrap_or_else(|| {
        BUDGET_CATEGORIES
            .iter()
            .map(|(k, v)| ((*k).to_string(), *v))
            .collect()
    });
    if let Some(funding) = ctx.signals.funding_availability {
        state.funding_availability = clamp_unit(funding);
    }

    let total = BASE_BUDGET * state.funding_availability;
    state.budget = Budget {
        total,
        shares: reallocate(1.0, &weights),
        funds: reallocate(total, &weights),
    };

    let training = ctx.knob(TRAINING_INTENSITY, 0.7);
    let funded = state.funding_availability;
    state.personnel_readiness =
        clamp_unit(0.6 + training * 0.3 + state.budget.share("personnel") * 0.15 * funded);
    Ok(())
}

/// Response actions for a threat type.
#[must_use]
pub fn countermeasures(kind: &str) -> Vec<String> {
    let actions: [&str; 3] = match kind {
        "cyber_attack" => ["enhance_cyber_defense", "incident_response", "attribution_investigation"],
        "territorial_dispute" => ["border_reinforcement", "diplomatic_negotiation", "international_mediation"],
        "terrorist_threat" => [
            "intelligence_gathering",
            "security_screening",
            "counter_terrorism_operations",
        ],
        "military_buildup" => ["force_readiness_increase", "alliance_coordination", "deterrent_positioning"],
        _ => ["threat_monitoring", "contingency_planning", "force_preparation"],
    };
    actions.iter().map(|a| (*a).to_string()).collect()
}

/// Writes `threat_level`, `threats`, `threat_sources`, `alert_status` and
/// branch readiness.
///
/// A non-empty external threat list replaces the previously absorbed
/// external threats. Each reported country's diplomatic threat is replaced
/// or dropped according to its current tension. Sources not reported for
/// [`SOURCE_MEMORY_TICKS`] are forgotten. Branch readiness is drilled by
/// training intensity, capped by equipment, then brought toward the alert
/// status target.
pub fn assess_threats(state: &mut MilitaryState, ctx: &Ctx<'_>) -> Result<(), RuleError> {
    let assessed = ctx.knob(THREAT_ASSESSMENT_LEVEL, 0.3);
    let training = ctx.knob(TRAINING_INTENSITY, 0.7);
    state.threat_level = clamp_unit(smooth_toward(state.threat_level, assessed, THREAT_RATE));

    let signals = ctx.signals;
    if !signals.external_threats.is_empty() {
        state.threats.retain(|t| t.origin == ThreatOrigin::Diplomatic);
        for reported in &signals.external_threats {
            let severity = clamp_unit(reported.severity);
            state.threats.push(Threat {
                id: reported.id.clone(),
                kind: reported.kind.clone(),
                severity,
                source: reported.source.clone(),
                timeframe: reported.timeframe.clone(),
                countermeasures: countermeasures(&reported.kind),
                origin: ThreatOrigin::External,
            });
            state.threat_sources.insert(
                reported.source.clone(),
                ThreatSource {
                    severity,
                    last_seen_tick: ctx.tick_id,
                },
            );
        }
    }
    let tick_id = ctx.tick_id;
    state
        .threat_sources
        .retain(|_, source| tick_id.saturating_sub(source.last_seen_tick) <= SOURCE_MEMORY_TICKS);

    for (country, tension) in &signals.diplomatic_tensions {
        let id = format!("diplomatic_{country}");
        state
            .threats
            .retain(|t| !(t.origin == ThreatOrigin::Diplomatic && t.id == id));
        if *tension > TENSION_THRESHOLD {
            state.threats.push(Threat {
                id,
                kind: DIPLOMATIC_TENSION.to_string(),
                severity: clamp_unit(*tension),
                source: country.clone(),
                timeframe: "ongoing".to_string(),
                countermeasures: vec!["diplomatic_engagement".to_string(), "defensive_preparations".to_string()],
                origin: ThreatOrigin::Diplomatic,
            });
        }
    }

    state.alert_status = ALERT_CUTS.categorize(state.threat_level);
    let target = state.alert_status.readiness_target();
    for branch in state.branches.values_mut() {
        // Training lifts readiness against a fixed decay; equipment caps it.
        let drilled = (branch.readiness + training * 0.2 - 0.05).min(branch.equipment_status + 0.1);
        branch.readiness = clamp_unit(smooth_toward(clamp_unit(drilled), target, ALERT_RATE));
    }
    Ok(())
}

/// Writes `posture` and `threat_category`.
pub fn categorize_posture(state: &mut MilitaryState, _ctx: &Ctx<'_>) -> Result<(), RuleError> {
    state.posture = Severity::from_level(state.overall_readiness);
    state.threat_category = Severity::from_level(state.threat_level);
    Ok(())
}

/// Writes `active_personnel` and branch personnel and capability indices.
pub fn structure_forces(state: &mut MilitaryState, ctx: &Ctx<'_>) -> Result<(), RuleError> {
    let activation = ctx.knob(RESERVE_ACTIVATION_LEVEL, 0.1);
    state.active_personnel = BASE_ACTIVE_PERSONNEL + fraction_of(state.reserve_personnel, activation);

    let distribution: IndexMap<String, f64> = BRANCH_DISTRIBUTION
        .iter()
        .map(|(k, v)| ((*k).to_string(), *v))
        .collect();
    for (name, personnel) in reallocate_units(state.active_personnel, &distribution) {
        let branch = state
            .branches
            .get_mut(&name)
            .ok_or_else(|| RuleError::new(format!("branch '{name}' is missing")))?;
        branch.personnel = personnel;
    }

    for branch in state.branches.values_mut() {
        let headcount = branch.personnel as f64 / 10_000.0;
        branch.capability_index =
            clamp_unit(headcount * 0.4 + branch.equipment_status * 0.4 + branch.training_level * 0.2);
    }
    Ok(())
}

/// Picks the doctrine: a dominant focus area wins, otherwise the
/// `strategic_doctrine` knob applies.
#[must_use]
pub fn select_doctrine(internal_focus: f64, cooperation: f64, threat_level: f64, baseline: Doctrine) -> Doctrine {
    if internal_focus > 0.7 {
        Doctrine::HomelandDefense
    } else if cooperation > 0.7 {
        Doctrine::CoalitionBased
    } else if threat_level > 0.6 {
        Doctrine::ForwardDefense
    } else {
        baseline
    }
}

/// Writes `training_effectiveness`, `training_programs`, branch training
/// levels and `doctrine`.
pub fn train_and_select_doctrine(state: &mut MilitaryState, ctx: &Ctx<'_>) -> Result<(), RuleError> {
    let training = ctx.knob(TRAINING_INTENSITY, 0.7);
    state.training_effectiveness = clamp_unit(0.5 + training * 0.4);

    let participants = fraction_of(state.active_personnel, 0.1);
    state.training_programs = TRAINING_PROGRAMS
        .iter()
        .map(|name| {
            let program = TrainingProgram {
                intensity: training,
                effectiveness: clamp_unit(0.4 + training * 0.6),
                participants,
            };
            ((*name).to_string(), program)
        })
        .collect();

    for branch in state.branches.values_mut() {
        branch.training_level =
            clamp_unit(smooth_toward(branch.training_level, state.training_effectiveness, TRAINING_RATE));
    }

    let baseline = ctx
        .params
        .choice(STRATEGIC_DOCTRINE)
        .and_then(Doctrine::parse)
        .unwrap_or(Doctrine::BalancedDefense);
    state.doctrine = select_doctrine(
        ctx.knob(INTERNAL_SECURITY_FOCUS, 0.5),
        ctx.knob(INTERNATIONAL_COOPERATION_LEVEL, 0.5),
        state.threat_level,
        baseline,
    );
    Ok(())
}

/// Writes `operations`, `deployments` and `exercises`.
pub fn plan_operations(state: &mut MilitaryState, ctx: &Ctx<'_>) -> Result<(), RuleError> {
    let internal = ctx.knob(INTERNAL_SECURITY_FOCUS, 0.5);
    let border = ctx.knob(BORDER_SECURITY_EMPHASIS, 0.7);
    let cyber = ctx.knob(CYBER_DEFENSE_PRIORITY, 0.8);
    let cooperation = ctx.knob(INTERNATIONAL_COOPERATION_LEVEL, 0.5);
    let training = ctx.knob(TRAINING_INTENSITY, 0.7);
    let active = state.active_personnel;

    state.operations.clear();
    if border > 0.6 {
        state.operations.push(Operation {
            name: "Border Security Patrol".to_string(),
            kind: "border_security".to_string(),
            personnel: fraction_of(active, 0.1),
            status: "ongoing".to_string(),
            effectiveness: border,
        });
    }
    if internal > 0.6 {
        state.operations.push(Operation {
            name: "Homeland Security Operations".to_string(),
            kind: "internal_security".to_string(),
            personnel: fraction_of(active, 0.05),
            status: "ongoing".to_string(),
            effectiveness: internal,
        });
    }
    if cyber > 0.5 {
        state.operations.push(Operation {
            name: "Cyber Defense Operations".to_string(),
            kind: "cyber_defense".to_string(),
            personnel: state.branch("cyber_command").map_or(0, |b| b.personnel),
            status: "continuous".to_string(),
            effectiveness: cyber,
        });
    }

    state.deployments.clear();
    if cooperation > 0.6 {
        state.deployments.push(Deployment {
            name: "peacekeeping_mission".to_string(),
            personnel: fraction_of(active, 0.02),
            location: "international".to_string(),
            duration_days: 365,
            purpose: "peacekeeping".to_string(),
        });
    }
    state.deployments.push(Deployment {
        name: "training_exercises".to_string(),
        personnel: fraction_of(active, 0.05),
        location: "various".to_string(),
        duration_days: 30,
        purpose: "training".to_string(),
    });

    state.exercises.clear();
    let domestic = (clamp_unit(training) * 12.0).floor() as u32;
    for i in 1..=domestic {
        state.exercises.push(Exercise {
            name: format!("Domestic Exercise {i}"),
            kind: "domestic".to_string(),
            participants: fraction_of(active, 0.1),
            duration_days: 7,
            effectiveness: training,
        });
    }
    if cooperation > 0.5 {
        let joint = (clamp_unit(cooperation) * 6.0).floor() as u32;
        for i in 1..=joint {
            state.exercises.push(Exercise {
                name: format!("Joint Exercise {i}"),
                kind: "international".to_string(),
                participants: fraction_of(active, 0.05),
                duration_days: 14,
                effectiveness: cooperation,
            });
        }
    }
    Ok(())
}

/// Writes `alliances` and `agreements`.
pub fn update_cooperation(state: &mut MilitaryState, ctx: &Ctx<'_>) -> Result<(), RuleError> {
    let cooperation = ctx.knob(INTERNATIONAL_COOPERATION_LEVEL, 0.5);

    let alliance = |name: &str, strength: f64, members: u32| Alliance {
        name: name.to_string(),
        strength,
        members,
    };
    state.alliances = if cooperation > 0.7 {
        vec![
            alliance("Defense Alliance Alpha", 0.8, 5),
            alliance("Security Partnership Beta", 0.6, 3),
        ]
    } else if cooperation > 0.4 {
        vec![alliance("Security Partnership Beta", 0.6, 3)]
    } else {
        Vec::new()
    };

    let agreement = |kind: &str, partners: u32, effectiveness: f64| Agreement {
        kind: kind.to_string(),
        partners,
        effectiveness,
    };
    state.agreements = if cooperation > 0.6 {
        vec![
            agreement("intelligence_sharing", 4, 0.7),
            agreement("joint_training", 3, 0.8),
            agreement("equipment_standardization", 2, 0.6),
        ]
    } else if cooperation > 0.3 {
        vec![agreement("intelligence_sharing", 2, 0.5)]
    } else {
        Vec::new()
    };
    Ok(())
}

/// Writes `capabilities`.
pub fn compute_capabilities(state: &mut MilitaryState, ctx: &Ctx<'_>) -> Result<(), RuleError> {
    let border = ctx.knob(BORDER_SECURITY_EMPHASIS, 0.7);
    let cyber = ctx.knob(CYBER_DEFENSE_PRIORITY, 0.8);
    let internal = ctx.knob(INTERNAL_SECURITY_FOCUS, 0.5);

    state.capabilities = Capabilities {
        border_security: clamp_unit(0.4 + border * 0.5 + readiness_of(state, "army") * 0.1),
        air_defense: clamp_unit(0.4 + readiness_of(state, "air_force") * 0.4 + state.equipment_readiness * 0.2),
        naval_defense: clamp_unit(0.4 + readiness_of(state, "navy") * 0.4 + state.logistics_readiness * 0.2),
        cyber_defense: clamp_unit(0.5 + cyber * 0.3 + readiness_of(state, "cyber_command") * 0.2),
        space_defense: clamp_unit(
            0.2 + readiness_of(state, "space_force") * 0.6 + state.intelligence_readiness * 0.2,
        ),
        homeland_security: clamp_unit(0.5 + internal * 0.3 + state.overall_readiness * 0.2),
    };
    Ok(())
}

/// Writes branch equipment status and `equipment_readiness`.
///
/// Upkeep is funded from the operations and equipment budget shares.
pub fn maintain_equipment(state: &mut MilitaryState, ctx: &Ctx<'_>) -> Result<(), RuleError> {
    let modernization = ctx.knob(FORCE_MODERNIZATION_RATE, 0.3);
    let upkeep = (state.budget.share("operations") + state.budget.share("equipment")) * state.funding_availability;
    let wear = ctx.signals.equipment_wear.map_or(0.0, clamp_unit);

    for branch in state.branches.values_mut() {
        let next = branch.equipment_status + upkeep * 0.1 + modernization * 0.05 - 0.02 - wear;
        branch.equipment_status = clamp_to(next, 0.1, 1.0);
    }
    let statuses: Vec<f64> = state.branches.values().map(|b| b.equipment_status).collect();
    state.equipment_readiness = clamp_unit(mean(&statuses));
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use knob_registry::Snapshot;
    use serde_json::Value;

    use super::*;
    use crate::military::signals::ExternalThreat;

    type RuleFn = fn(&mut MilitaryState, &Ctx<'_>) -> Result<(), RuleError>;

    fn run(rule: RuleFn, state: &mut MilitaryState, params: &Snapshot, signals: &MilitarySignals) {
        run_at(1, rule, state, params, signals);
    }

    fn run_at(tick_id: u64, rule: RuleFn, state: &mut MilitaryState, params: &Snapshot, signals: &MilitarySignals) {
        let ctx = TickContext::new(tick_id, 42, params, signals);
        rule(state, &ctx).unwrap();
    }

    fn reported(id: &str, kind: &str, source: &str) -> ExternalThreat {
        ExternalThreat {
            id: id.to_string(),
            kind: kind.to_string(),
            severity: 0.6,
            source: source.to_string(),
            timeframe: "weeks".to_string(),
        }
    }

    /// Top-level fields that differ, with branch fields as `branches.*.<field>`.
    fn changed_fields(before: &MilitaryState, after: &MilitaryState) -> BTreeSet<String> {
        let before = serde_json::to_value(before).unwrap();
        let after = serde_json::to_value(after).unwrap();
        let mut changed = BTreeSet::new();
        for (key, old) in before.as_object().unwrap() {
            let new = &after[key];
            if key == "branches" {
                for (name, branch) in old.as_object().unwrap() {
                    for (field, value) in branch.as_object().unwrap() {
                        if new[name][field] != *value {
                            changed.insert(format!("branches.*.{field}"));
                        }
                    }
                }
            } else if new != old {
                changed.insert(key.clone());
            }
        }
        changed
    }

    type Ownership = (&'static str, RuleFn, &'static [&'static str]);

    fn owns(name: &'static str, rule: RuleFn, fields: &'static [&'static str]) -> Ownership {
        (name, rule, fields)
    }

    #[test]
    fn test_readiness_converges_without_overshoot() {
        let mut state = MilitaryState::default();
        let params = Snapshot::new().with(DEFENSE_READINESS_LEVEL, 0.95);
        let mut previous = state.overall_readiness;
        for _ in 0..50 {
            run(converge_readiness, &mut state, &params, &MilitarySignals::default());
            assert!(state.overall_readiness > previous);
            assert!(state.overall_readiness <= 0.95);
            previous = state.overall_readiness;
        }
        assert_eq!(state.last_update_ms, 42);
    }

    #[test]
    fn test_budget_preserves_total_and_scales_with_funding() {
        let mut state = MilitaryState::default();
        let mut weights = IndexMap::new();
        weights.insert("personnel".to_string(), 0.9);
        weights.insert("equipment".to_string(), 0.9);
        weights.insert("operations".to_string(), 0.0);
        let params = Snapshot::new().with(MILITARY_BUDGET_ALLOCATION, knob_registry::ParamValue::Structured(weights));
        let signals = MilitarySignals::default().with_funding(0.5);

        run(reallocate_budget, &mut state, &params, &signals);
        assert_eq!(state.funding_availability, 0.5);
        assert_eq!(state.budget.total, BASE_BUDGET * 0.5);
        let sum: f64 = state.budget.funds.values().sum();
        assert!((sum - state.budget.total).abs() < 1e-3);
        assert!(state.budget.funds.values().all(|f| *f >= 0.0));
        assert!((state.budget.share("personnel") - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_absent_funding_signal_keeps_last_value() {
        let mut state = MilitaryState::default();
        state.funding_availability = 0.8;
        run(reallocate_budget, &mut state, &Snapshot::new(), &MilitarySignals::default());
        assert_eq!(state.funding_availability, 0.8);
        assert_eq!(state.budget.funds.len(), BUDGET_CATEGORIES.len());
    }

    #[test]
    fn test_threats_absorbed_with_countermeasures() {
        let mut state = MilitaryState::default();
        let signals = MilitarySignals::default()
            .with_threat(ExternalThreat {
                id: "t1".to_string(),
                kind: "cyber_attack".to_string(),
                severity: 0.9,
                source: "apt-41".to_string(),
                timeframe: "immediate".to_string(),
            })
            .with_tension("northland", 0.85)
            .with_tension("southland", 0.2);

        run(assess_threats, &mut state, &Snapshot::new(), &signals);
        assert_eq!(state.threats.len(), 2);
        assert_eq!(state.threats[0].countermeasures[0], "enhance_cyber_defense");
        assert_eq!(state.threats[1].id, "diplomatic_northland");
        assert_eq!(state.threat_sources["apt-41"].last_seen_tick, 1);

        // Repeating the same signals does not duplicate entries.
        run(assess_threats, &mut state, &Snapshot::new(), &signals);
        assert_eq!(state.threats.len(), 2);

        // Tension easing drops the diplomatic threat.
        let eased = MilitarySignals::default().with_tension("northland", 0.3);
        run(assess_threats, &mut state, &Snapshot::new(), &eased);
        assert_eq!(state.threats.len(), 1);
        assert_eq!(state.threats[0].id, "t1");
    }

    #[test]
    fn test_reported_diplomatic_type_is_replaced_each_tick() {
        let mut state = MilitaryState::default();
        let signals = MilitarySignals::default()
            .with_threat(reported("x1", DIPLOMATIC_TENSION, "westland"))
            .with_tension("northland", 0.9);

        for tick in 1..=5 {
            run_at(tick, assess_threats, &mut state, &Snapshot::new(), &signals);
            let external = state.threats.iter().filter(|t| t.origin == ThreatOrigin::External).count();
            assert_eq!((state.threats.len(), external), (2, 1), "tick {tick}");
        }
        let mut origins: Vec<_> = state.threats.iter().map(|t| (t.id.as_str(), t.origin)).collect();
        origins.sort_by_key(|(id, _)| *id);
        assert_eq!(
            origins,
            vec![("diplomatic_northland", ThreatOrigin::Diplomatic), ("x1", ThreatOrigin::External)]
        );
    }

    #[test]
    fn test_stale_threat_sources_are_forgotten() {
        let mut state = MilitaryState::default();
        let params = Snapshot::new();
        let first = MilitarySignals::default().with_threat(reported("a1", "cyber_attack", "apt-41"));
        run_at(1, assess_threats, &mut state, &params, &first);

        let other = MilitarySignals::default().with_threat(reported("b1", "military_buildup", "eastland"));
        run_at(1 + SOURCE_MEMORY_TICKS, assess_threats, &mut state, &params, &other);
        assert!(state.threat_sources.contains_key("apt-41"));

        run_at(2 + SOURCE_MEMORY_TICKS, assess_threats, &mut state, &params, &MilitarySignals::default());
        let sources: Vec<_> = state.threat_sources.keys().map(String::as_str).collect();
        assert_eq!(sources, vec!["eastland"]);
    }

    #[test]
    fn test_each_field_has_one_owning_rule() {
        let table = [
            owns("readiness", converge_readiness, &[
                "overall_readiness",
                "logistics_readiness",
                "intelligence_readiness",
                "last_update_ms",
            ]),
            owns("budget", reallocate_budget, &["budget", "funding_availability", "personnel_readiness"]),
            owns("threat_assessment", assess_threats, &[
                "threat_level",
                "threats",
                "threat_sources",
                "alert_status",
                "branches.*.readiness",
            ]),
            owns("posture", categorize_posture, &["posture", "threat_category"]),
            owns("force_structure", structure_forces, &[
                "active_personnel",
                "branches.*.personnel",
                "branches.*.capability_index",
            ]),
            owns("training_doctrine", train_and_select_doctrine, &[
                "training_effectiveness",
                "training_programs",
                "branches.*.training_level",
                "doctrine",
            ]),
            owns("operations", plan_operations, &["operations", "deployments", "exercises"]),
            owns("cooperation", update_cooperation, &["alliances", "agreements"]),
            owns("capabilities", compute_capabilities, &["capabilities"]),
            owns("equipment", maintain_equipment, &["branches.*.equipment_status", "equipment_readiness"]),
        ];
        assert_eq!(table.len(), pipeline().len());

        let mut claimed = BTreeSet::new();
        for (name, _, fields) in &table {
            for field in *fields {
                assert!(claimed.insert(*field), "{field} claimed again by {name}");
            }
        }

        let mut state = MilitaryState::default();
        state.overall_readiness = 0.4;
        state.threat_level = 0.9;
        let params = Snapshot::new()
            .with(DEFENSE_READINESS_LEVEL, 0.95)
            .with(TRAINING_INTENSITY, 0.9)
            .with(RESERVE_ACTIVATION_LEVEL, 0.5)
            .with(INTERNATIONAL_COOPERATION_LEVEL, 0.8)
            .with(THREAT_ASSESSMENT_LEVEL, 0.9);
        let signals = MilitarySignals {
            equipment_wear: Some(0.1),
            ..MilitarySignals::default()
                .with_funding(0.6)
                .with_threat(reported("t1", "cyber_attack", "apt-41"))
                .with_tension("northland", 0.85)
        };

        for (name, rule, fields) in &table {
            let mut next = state.clone();
            run(*rule, &mut next, &params, &signals);
            let changed = changed_fields(&state, &next);
            assert!(!changed.is_empty(), "{name} changed nothing");
            for field in &changed {
                assert!(fields.contains(&field.as_str()), "{name} wrote {field}");
            }
        }
    }

    #[test]
    fn test_unknown_threat_type_gets_default_countermeasures() {
        assert_eq!(
            countermeasures("sea_monster"),
            vec!["threat_monitoring", "contingency_planning", "force_preparation"]
        );
    }

    #[test]
    fn test_force_structure_preserves_headcount() {
        let mut state = MilitaryState::default();
        let params = Snapshot::new().with(RESERVE_ACTIVATION_LEVEL, 0.5);
        run(structure_forces, &mut state, &params, &MilitarySignals::default());
        assert_eq!(state.active_personnel, 62_500);
        let sum: u64 = state.branches.values().map(|b| b.personnel).sum();
        assert_eq!(sum, 62_500);
        assert_eq!(state.branches["army"].personnel, 31_250);
    }

    #[test]
    fn test_force_structure_fails_on_missing_branch() {
        let mut state = MilitaryState::default();
        state.branches.shift_remove("navy");
        let params = Snapshot::new();
        let signals = MilitarySignals::default();
        let ctx = TickContext::new(1, 0, &params, &signals);
        assert!(structure_forces(&mut state, &ctx).is_err());
    }

    #[test]
    fn test_doctrine_selection() {
        assert_eq!(select_doctrine(0.8, 0.9, 0.9, Doctrine::BalancedDefense), Doctrine::HomelandDefense);
        assert_eq!(select_doctrine(0.5, 0.8, 0.9, Doctrine::BalancedDefense), Doctrine::CoalitionBased);
        assert_eq!(select_doctrine(0.5, 0.5, 0.7, Doctrine::BalancedDefense), Doctrine::ForwardDefense);
        assert_eq!(select_doctrine(0.5, 0.5, 0.3, Doctrine::CoalitionBased), Doctrine::CoalitionBased);
    }

    #[test]
    fn test_operations_follow_knobs() {
        let mut state = MilitaryState::default();
        let params = Snapshot::new()
            .with(BORDER_SECURITY_EMPHASIS, 0.7)
            .with(INTERNAL_SECURITY_FOCUS, 0.5)
            .with(CYBER_DEFENSE_PRIORITY, 0.8)
            .with(INTERNATIONAL_COOPERATION_LEVEL, 0.65)
            .with(TRAINING_INTENSITY, 0.5);
        run(plan_operations, &mut state, &params, &MilitarySignals::default());

        let kinds: Vec<_> = state.operations.iter().map(|o| o.kind.as_str()).collect();
        assert_eq!(kinds, vec!["border_security", "cyber_defense"]);
        assert_eq!(state.deployments.len(), 2);
        // 6 domestic + 3 joint
        assert_eq!(state.exercises.len(), 9);
    }

    #[test]
    fn test_cooperation_tiers() {
        let mut state = MilitaryState::default();
        run(
            update_cooperation,
            &mut state,
            &Snapshot::new().with(INTERNATIONAL_COOPERATION_LEVEL, 0.8),
            &MilitarySignals::default(),
        );
        assert_eq!((state.alliances.len(), state.agreements.len()), (2, 3));

        run(
            update_cooperation,
            &mut state,
            &Snapshot::new().with(INTERNATIONAL_COOPERATION_LEVEL, 0.2),
            &MilitarySignals::default(),
        );
        assert!(state.alliances.is_empty());
        assert!(state.agreements.is_empty());
    }

    #[test]
    fn test_equipment_wear_signal() {
        let params = Snapshot::new();
        let mut calm = MilitaryState::default();
        let mut worn = MilitaryState::default();
        run(maintain_equipment, &mut calm, &params, &MilitarySignals::default());
        let signals = MilitarySignals {
            equipment_wear: Some(0.2),
            ..MilitarySignals::default()
        };
        run(maintain_equipment, &mut worn, &params, &signals);
        assert!(worn.equipment_readiness < calm.equipment_readiness);
        assert!(worn.branches.values().all(|b| b.equipment_status >= 0.1));
    }
}
