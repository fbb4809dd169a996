//! Per-entry update outcomes.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::parameter::ParamValue;
use crate::snapshot::Snapshot;

/// What happened to one requested entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutcomeStatus {
    Accepted,
    /// Accepted after clamping into the declared bounds.
    AcceptedClamped,
    RejectedUnknownId,
    /// The request did not fit the parameter's kind (wrong value type,
    /// non-finite number, unknown variant or directive).
    RejectedWrongKind,
}

impl OutcomeStatus {
    #[must_use]
    pub fn is_accepted(self) -> bool {
        matches!(self, Self::Accepted | Self::AcceptedClamped)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::AcceptedClamped => "accepted-clamped",
            Self::RejectedUnknownId => "rejected-unknown-id",
            Self::RejectedWrongKind => "rejected-wrong-kind",
        }
    }
}

/// The outcome of one entry of an update call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterOutcome {
    pub status: OutcomeStatus,
    /// The stored value, for accepted entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<ParamValue>,
    /// The value as requested before clamping, for clamped entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested: Option<ParamValue>,
    /// Why the entry was rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ParameterOutcome {
    pub(crate) fn accepted(value: ParamValue, clamped_from: Option<ParamValue>) -> Self {
        let status = if clamped_from.is_some() {
            OutcomeStatus::AcceptedClamped
        } else {
            OutcomeStatus::Accepted
        };
        Self {
            status,
            value: Some(value),
            requested: clamped_from,
            reason: None,
        }
    }

    pub(crate) fn unknown_id() -> Self {
        Self {
            status: OutcomeStatus::RejectedUnknownId,
            value: None,
            requested: None,
            reason: Some("no parameter with this id".to_string()),
        }
    }

    pub(crate) fn wrong_kind(reason: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::RejectedWrongKind,
            value: None,
            requested: None,
            reason: Some(reason.into()),
        }
    }
}

/// The result of one [`Registry::update`](crate::Registry::update) call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateResult {
    /// Provenance tag the update was made under.
    pub source: String,
    /// One outcome per requested id, in request order.
    pub outcomes: IndexMap<String, ParameterOutcome>,
    /// The registry's full snapshot after the update.
    pub snapshot: Snapshot,
}

impl UpdateResult {
    /// Returns the number of accepted entries (clamped or not).
    #[must_use]
    pub fn accepted_count(&self) -> usize {
        self.outcomes.values().filter(|o| o.status.is_accepted()).count()
    }

    /// Returns the ids of all rejected entries.
    #[must_use]
    pub fn rejected(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, o)| !o.status.is_accepted())
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// Returns `true` when every entry was accepted without clamping.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.outcomes.values().all(|o| o.status == OutcomeStatus::Accepted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_kebab_case() {
        let json = serde_json::to_value(OutcomeStatus::RejectedUnknownId).unwrap();
        assert_eq!(json, serde_json::json!("rejected-unknown-id"));
        assert_eq!(OutcomeStatus::AcceptedClamped.as_str(), "accepted-clamped");
    }

    #[test]
    fn test_accepted_with_clamp_reports_requested() {
        let outcome = ParameterOutcome::accepted(ParamValue::Scalar(1.0), Some(ParamValue::Scalar(1.3)));
        assert_eq!(outcome.status, OutcomeStatus::AcceptedClamped);
        assert_eq!(outcome.requested, Some(ParamValue::Scalar(1.3)));
    }
}
