//! External inputs to one military tick.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A threat reported by the driver (intelligence feed, scenario script).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalThreat {
    pub id: String,
    /// `cyber_attack`, `territorial_dispute`, `terrorist_threat`,
    /// `military_buildup` or anything else.
    #[serde(rename = "type")]
    pub kind: String,
    pub severity: f64,
    pub source: String,
    #[serde(default = "ongoing")]
    pub timeframe: String,
}

fn ongoing() -> String {
    "ongoing".to_string()
}

/// Signals for one military tick. Every field is optional; an empty value
/// means "nothing observed".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MilitarySignals {
    /// Threats observed this tick. When non-empty, replaces the absorbed
    /// external threat list.
    pub external_threats: Vec<ExternalThreat>,
    /// Diplomatic tension per country in `[0, 1]`.
    pub diplomatic_tensions: IndexMap<String, f64>,
    /// Funded share of the defense budget, from the treasury.
    pub funding_availability: Option<f64>,
    /// Extra equipment wear this tick. Absent means no wear beyond the
    /// fixed degradation.
    pub equipment_wear: Option<f64>,
}

impl MilitarySignals {
    #[must_use]
    pub fn with_threat(mut self, threat: ExternalThreat) -> Self {
        self.external_threats.push(threat);
        self
    }

    #[must_use]
    pub fn with_tension(mut self, country: impl Into<String>, level: f64) -> Self {
        self.diplomatic_tensions.insert(country.into(), level);
        self
    }

    #[must_use]
    pub fn with_funding(mut self, availability: f64) -> Self {
        self.funding_availability = Some(availability);
        self
    }
}
