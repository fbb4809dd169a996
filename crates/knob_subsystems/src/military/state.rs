//! The military state record.

use std::fmt;

use indexmap::IndexMap;
use knob_sim::state::{check_non_negative, check_unit};
use knob_sim::{InvalidField, Severity, SimState};
use serde::{Deserialize, Serialize};

/// Total annual defense budget at full funding.
pub const BASE_BUDGET: f64 = 50_000_000_000.0;
/// Active-duty headcount before any reserve activation.
pub const BASE_ACTIVE_PERSONNEL: u64 = 50_000;
pub const RESERVE_PERSONNEL: u64 = 25_000;
pub const CIVILIAN_PERSONNEL: u64 = 15_000;

/// Standard share of active personnel per branch.
pub const BRANCH_DISTRIBUTION: [(&str, f64); 5] = [
    ("army", 0.5),
    ("navy", 0.24),
    ("air_force", 0.16),
    ("space_force", 0.06),
    ("cyber_command", 0.04),
];

/// One service branch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    pub personnel: u64,
    pub readiness: f64,
    pub equipment_status: f64,
    pub training_level: f64,
    /// Blend of headcount, equipment and training.
    pub capability_index: f64,
}

impl Branch {
    fn seed(personnel: u64, readiness: f64, equipment_status: f64, training_level: f64) -> Self {
        Self {
            personnel,
            readiness,
            equipment_status,
            training_level,
            capability_index: 0.5,
        }
    }
}

/// Defensive capability levels, each in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capabilities {
    pub border_security: f64,
    pub air_defense: f64,
    pub naval_defense: f64,
    pub cyber_defense: f64,
    pub space_defense: f64,
    pub homeland_security: f64,
}

impl Capabilities {
    /// Returns `(name, level)` for every capability in a fixed order.
    #[must_use]
    pub fn levels(&self) -> [(&'static str, f64); 6] {
        [
            ("border_security", self.border_security),
            ("air_defense", self.air_defense),
            ("naval_defense", self.naval_defense),
            ("cyber_defense", self.cyber_defense),
            ("space_defense", self.space_defense),
            ("homeland_security", self.homeland_security),
        ]
    }

    /// Mean of all capability levels.
    #[must_use]
    pub fn defense_index(&self) -> f64 {
        let levels: Vec<f64> = self.levels().iter().map(|(_, v)| *v).collect();
        knob_sim::rules::mean(&levels)
    }
}

/// Budget split for the current tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    /// Funds available this tick (base budget scaled by funding availability).
    pub total: f64,
    /// Normalised share per category, summing to one.
    pub shares: IndexMap<String, f64>,
    /// Funds per category, summing to `total`.
    pub funds: IndexMap<String, f64>,
}

impl Budget {
    /// Returns the share of `category`, or zero.
    #[must_use]
    pub fn share(&self, category: &str) -> f64 {
        self.shares.get(category).copied().unwrap_or(0.0)
    }
}

/// Where a tracked threat came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatOrigin {
    /// Reported through the external threat signal.
    #[default]
    External,
    /// Raised internally from a diplomatic tension above threshold.
    Diplomatic,
}

/// A tracked threat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Threat {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub severity: f64,
    pub source: String,
    pub timeframe: String,
    pub countermeasures: Vec<String>,
    #[serde(default)]
    pub origin: ThreatOrigin,
}

/// Latest severity seen from one threat source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreatSource {
    pub severity: f64,
    pub last_seen_tick: u64,
}

/// Alert status derived from the threat level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Peacetime,
    Normal,
    Elevated,
    HighAlert,
}

impl AlertStatus {
    /// Branch readiness level the forces are brought toward at this status.
    #[must_use]
    pub fn readiness_target(self) -> f64 {
        match self {
            Self::Peacetime => 0.6,
            Self::Normal => 0.7,
            Self::Elevated => 0.8,
            Self::HighAlert => 0.9,
        }
    }
}

/// Operating doctrine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Doctrine {
    BalancedDefense,
    HomelandDefense,
    CoalitionBased,
    ForwardDefense,
}

impl Doctrine {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BalancedDefense => "balanced_defense",
            Self::HomelandDefense => "homeland_defense",
            Self::CoalitionBased => "coalition_based",
            Self::ForwardDefense => "forward_defense",
        }
    }

    /// Parse a `strategic_doctrine` knob value.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "balanced_defense" => Some(Self::BalancedDefense),
            "homeland_defense" => Some(Self::HomelandDefense),
            "coalition_based" => Some(Self::CoalitionBased),
            "forward_defense" => Some(Self::ForwardDefense),
            _ => None,
        }
    }
}

impl fmt::Display for Doctrine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub personnel: u64,
    pub status: String,
    pub effectiveness: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deployment {
    pub name: String,
    pub personnel: u64,
    pub location: String,
    pub duration_days: u32,
    pub purpose: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub name: String,
    /// `domestic` or `international`.
    #[serde(rename = "type")]
    pub kind: String,
    pub participants: u64,
    pub duration_days: u32,
    pub effectiveness: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingProgram {
    pub intensity: f64,
    pub effectiveness: f64,
    pub participants: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alliance {
    pub name: String,
    pub strength: f64,
    pub members: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agreement {
    #[serde(rename = "type")]
    pub kind: String,
    pub partners: u32,
    pub effectiveness: f64,
}

/// Everything the military simulator tracks between ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilitaryState {
    pub overall_readiness: f64,
    pub personnel_readiness: f64,
    pub equipment_readiness: f64,
    pub logistics_readiness: f64,
    pub intelligence_readiness: f64,
    /// Categorical posture, recomputed from `overall_readiness` every tick.
    pub posture: Severity,

    pub threat_level: f64,
    pub threat_category: Severity,
    pub alert_status: AlertStatus,
    pub threats: Vec<Threat>,
    pub threat_sources: IndexMap<String, ThreatSource>,

    pub active_personnel: u64,
    pub reserve_personnel: u64,
    pub civilian_personnel: u64,
    pub branches: IndexMap<String, Branch>,

    pub capabilities: Capabilities,
    pub budget: Budget,
    /// Funded share of the defense budget last reported by the treasury.
    pub funding_availability: f64,

    pub doctrine: Doctrine,
    pub training_effectiveness: f64,
    pub training_programs: IndexMap<String, TrainingProgram>,

    pub operations: Vec<Operation>,
    pub deployments: Vec<Deployment>,
    pub exercises: Vec<Exercise>,

    pub alliances: Vec<Alliance>,
    pub agreements: Vec<Agreement>,

    /// Timestamp of the last completed tick.
    pub last_update_ms: u64,
}

impl Default for MilitaryState {
    fn default() -> Self {
        let branches = [
            ("army", Branch::seed(25_000, 0.75, 0.7, 0.8)),
            ("navy", Branch::seed(12_000, 0.7, 0.65, 0.75)),
            ("air_force", Branch::seed(8_000, 0.8, 0.6, 0.85)),
            ("space_force", Branch::seed(3_000, 0.6, 0.5, 0.7)),
            ("cyber_command", Branch::seed(2_000, 0.85, 0.9, 0.9)),
        ]
        .into_iter()
        .map(|(name, branch)| (name.to_string(), branch))
        .collect();

        let shares: IndexMap<String, f64> = super::knobs::BUDGET_CATEGORIES
            .iter()
            .map(|(k, v)| ((*k).to_string(), *v))
            .collect();
        let funds = knob_sim::rules::reallocate(BASE_BUDGET, &shares);

        Self {
            overall_readiness: 0.7,
            personnel_readiness: 0.75,
            equipment_readiness: 0.65,
            logistics_readiness: 0.7,
            intelligence_readiness: 0.6,
            posture: Severity::High,
            threat_level: 0.3,
            threat_category: Severity::Low,
            alert_status: AlertStatus::Peacetime,
            threats: Vec::new(),
            threat_sources: IndexMap::new(),
            active_personnel: BASE_ACTIVE_PERSONNEL,
            reserve_personnel: RESERVE_PERSONNEL,
            civilian_personnel: CIVILIAN_PERSONNEL,
            branches,
            capabilities: Capabilities {
                border_security: 0.7,
                air_defense: 0.65,
                naval_defense: 0.6,
                cyber_defense: 0.8,
                space_defense: 0.4,
                homeland_security: 0.75,
            },
            budget: Budget {
                total: BASE_BUDGET,
                shares,
                funds,
            },
            funding_availability: 1.0,
            doctrine: Doctrine::BalancedDefense,
            training_effectiveness: 0.75,
            training_programs: IndexMap::new(),
            operations: Vec::new(),
            deployments: Vec::new(),
            exercises: Vec::new(),
            alliances: Vec::new(),
            agreements: Vec::new(),
            last_update_ms: 0,
        }
    }
}

impl MilitaryState {
    /// Returns the branch `name`, if present.
    #[must_use]
    pub fn branch(&self, name: &str) -> Option<&Branch> {
        self.branches.get(name)
    }

    /// Mean branch capability index.
    #[must_use]
    pub fn force_capability_index(&self) -> f64 {
        let indices: Vec<f64> = self.branches.values().map(|b| b.capability_index).collect();
        knob_sim::rules::mean(&indices)
    }

    /// Personnel currently away on deployments.
    #[must_use]
    pub fn deployed_personnel(&self) -> u64 {
        self.deployments.iter().map(|d| d.personnel).sum()
    }
}

impl SimState for MilitaryState {
    fn check(&self) -> Result<(), InvalidField> {
        check_unit("overall_readiness", self.overall_readiness)?;
        check_unit("personnel_readiness", self.personnel_readiness)?;
        check_unit("equipment_readiness", self.equipment_readiness)?;
        check_unit("logistics_readiness", self.logistics_readiness)?;
        check_unit("intelligence_readiness", self.intelligence_readiness)?;
        check_unit("threat_level", self.threat_level)?;
        check_unit("funding_availability", self.funding_availability)?;
        check_unit("training_effectiveness", self.training_effectiveness)?;

        for (name, branch) in &self.branches {
            check_unit(&format!("branches.{name}.readiness"), branch.readiness)?;
            check_unit(&format!("branches.{name}.equipment_status"), branch.equipment_status)?;
            check_unit(&format!("branches.{name}.training_level"), branch.training_level)?;
            check_unit(&format!("branches.{name}.capability_index"), branch.capability_index)?;
        }
        for (name, level) in self.capabilities.levels() {
            check_unit(&format!("capabilities.{name}"), level)?;
        }

        check_non_negative("budget.total", self.budget.total)?;
        for (category, funds) in &self.budget.funds {
            check_non_negative(&format!("budget.funds.{category}"), *funds)?;
        }
        for threat in &self.threats {
            check_unit(&format!("threats.{}.severity", threat.id), threat.severity)?;
        }
        Ok(())
    }
}
