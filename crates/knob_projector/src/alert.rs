//! Alert feeds.

use knob_sim::Severity;
use serde::{Deserialize, Serialize};

/// One raised alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// Stable machine-readable condition key, e.g. `"low_readiness"`.
    pub condition: String,
    pub severity: Severity,
    pub message: String,
}

/// An ordered list of alerts, populated only for thresholds that are crossed.
///
/// ```rust
/// use knob_projector::AlertFeed;
/// use knob_sim::Severity;
///
/// let readiness = 0.45;
/// let feed = AlertFeed::new()
///     .below(readiness, 0.5, "low_readiness", Severity::High, "Readiness below 50%")
///     .above(readiness, 0.8, "high_threat", Severity::Critical, "Threat above 80%");
/// assert_eq!(feed.len(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlertFeed(Vec<Alert>);

impl AlertFeed {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise an alert when `crossed` holds.
    #[must_use]
    pub fn when(mut self, crossed: bool, condition: &str, severity: Severity, message: impl Into<String>) -> Self {
        if crossed {
            self.push(Alert {
                condition: condition.to_string(),
                severity,
                message: message.into(),
            });
        }
        self
    }

    /// Raise an alert when `value > threshold`.
    #[must_use]
    pub fn above(self, value: f64, threshold: f64, condition: &str, severity: Severity, message: impl Into<String>) -> Self {
        self.when(value > threshold, condition, severity, message)
    }

    /// Raise an alert when `value < threshold`.
    #[must_use]
    pub fn below(self, value: f64, threshold: f64, condition: &str, severity: Severity, message: impl Into<String>) -> Self {
        self.when(value < threshold, condition, severity, message)
    }

    pub fn push(&mut self, alert: Alert) {
        self.0.push(alert);
    }

    /// Returns the most severe alert level raised, if any.
    #[must_use]
    pub fn highest(&self) -> Option<Severity> {
        self.0.iter().map(|a| a.severity).max()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Alert> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<Alert> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_empty_when_nothing_crossed() {
        let feed = AlertFeed::new()
            .below(0.9, 0.5, "low_readiness", Severity::High, "low")
            .above(0.1, 0.8, "high_threat", Severity::Critical, "high");
        assert!(feed.is_empty());
        assert_eq!(feed.highest(), None);
        assert_eq!(serde_json::to_value(&feed).unwrap(), json!([]));
    }

    #[test]
    fn test_highest_severity() {
        let feed = AlertFeed::new()
            .when(true, "a", Severity::Moderate, "a")
            .when(true, "b", Severity::Critical, "b")
            .when(false, "c", Severity::Low, "c");
        assert_eq!(feed.len(), 2);
        assert_eq!(feed.highest(), Some(Severity::Critical));
        let conditions: Vec<_> = feed.iter().map(|a| a.condition.as_str()).collect();
        assert_eq!(conditions, vec!["a", "b"]);
    }
}
