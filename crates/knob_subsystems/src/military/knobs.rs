//! Military knob ids and the registry schema.

use knob_registry::{ParameterSpec, RegistrySchema};

pub const DEFENSE_READINESS_LEVEL: &str = "defense_readiness_level";
pub const MILITARY_BUDGET_ALLOCATION: &str = "military_budget_allocation";
pub const THREAT_ASSESSMENT_LEVEL: &str = "threat_assessment_level";
pub const INTERNAL_SECURITY_FOCUS: &str = "internal_security_focus";
pub const BORDER_SECURITY_EMPHASIS: &str = "border_security_emphasis";
pub const CYBER_DEFENSE_PRIORITY: &str = "cyber_defense_priority";
pub const INTELLIGENCE_GATHERING_INTENSITY: &str = "intelligence_gathering_intensity";
pub const TRAINING_INTENSITY: &str = "training_intensity";
pub const INTERNATIONAL_COOPERATION_LEVEL: &str = "international_cooperation_level";
pub const FORCE_MODERNIZATION_RATE: &str = "force_modernization_rate";
pub const RESERVE_ACTIVATION_LEVEL: &str = "reserve_activation_level";
pub const MILITARY_TRANSPARENCY: &str = "military_transparency";
pub const STRATEGIC_DOCTRINE: &str = "strategic_doctrine";

/// Budget categories of [`MILITARY_BUDGET_ALLOCATION`] with their default shares.
pub const BUDGET_CATEGORIES: [(&str, f64); 5] = [
    ("personnel", 0.4),
    ("equipment", 0.25),
    ("operations", 0.2),
    ("research", 0.1),
    ("infrastructure", 0.05),
];

/// The military registry schema.
#[must_use]
pub fn schema() -> RegistrySchema {
    RegistrySchema::new("military")
        .param(
            ParameterSpec::scalar(
                DEFENSE_READINESS_LEVEL,
                0.7,
                "Overall military readiness and alert status",
            )
            .with_bounds(0.3, 1.0),
        )
        .param(ParameterSpec::structured(
            MILITARY_BUDGET_ALLOCATION,
            BUDGET_CATEGORIES,
            "Budget allocation across military categories",
        ))
        .param(ParameterSpec::scalar(
            THREAT_ASSESSMENT_LEVEL,
            0.3,
            "Current threat level assessment",
        ))
        .param(ParameterSpec::scalar(
            INTERNAL_SECURITY_FOCUS,
            0.5,
            "Focus on internal vs external security",
        ))
        .param(ParameterSpec::scalar(
            BORDER_SECURITY_EMPHASIS,
            0.7,
            "Emphasis on border and perimeter security",
        ))
        .param(ParameterSpec::scalar(
            CYBER_DEFENSE_PRIORITY,
            0.8,
            "Priority level for cyber defense capabilities",
        ))
        .param(ParameterSpec::scalar(
            INTELLIGENCE_GATHERING_INTENSITY,
            0.6,
            "Intensity of intelligence and surveillance operations",
        ))
        .param(ParameterSpec::scalar(
            TRAINING_INTENSITY,
            0.7,
            "Intensity and frequency of military training",
        ))
        .param(ParameterSpec::scalar(
            INTERNATIONAL_COOPERATION_LEVEL,
            0.5,
            "Level of international military cooperation",
        ))
        .param(ParameterSpec::scalar(
            FORCE_MODERNIZATION_RATE,
            0.3,
            "Rate of military equipment and doctrine modernization",
        ))
        .param(ParameterSpec::scalar(
            RESERVE_ACTIVATION_LEVEL,
            0.1,
            "Level of reserve force activation",
        ))
        .param(ParameterSpec::scalar(
            MILITARY_TRANSPARENCY,
            0.4,
            "Level of military transparency and public disclosure",
        ))
        .param(ParameterSpec::choice(
            STRATEGIC_DOCTRINE,
            [
                "balanced_defense",
                "homeland_defense",
                "coalition_based",
                "forward_defense",
            ],
            "balanced_defense",
            "Baseline doctrine when no focus area dominates",
        ))
}
