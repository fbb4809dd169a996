//! The parameter registry for one subsystem instance.
//!
//! The registry is the only owner of its parameters. External callers read
//! through [`Registry::describe`] and [`Registry::snapshot`] (both return
//! copies) and write through [`Registry::update`], which never fails as a
//! whole: every entry gets its own [`ParameterOutcome`].

use std::time::{SystemTime, UNIX_EPOCH};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::SchemaError;
use crate::json;
use crate::outcome::{ParameterOutcome, UpdateResult};
use crate::parameter::{Parameter, ParameterMetadata, SYSTEM_DEFAULT_SOURCE};
use crate::request::UpdateRequest;
use crate::schema::RegistrySchema;
use crate::snapshot::Snapshot;

/// Milliseconds since the Unix epoch, saturating to zero before it.
fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// What [`Registry::restore`] could not apply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RestoreReport {
    /// Number of parameters restored.
    pub restored: usize,
    /// Persisted ids that are not part of this registry's schema.
    pub unknown: Vec<String>,
    /// Persisted ids whose value no longer fits the declared kind.
    pub mismatched: Vec<String>,
}

/// An insertion-ordered set of parameters scoped to one subsystem instance.
#[derive(Debug, Clone)]
pub struct Registry {
    name: String,
    params: IndexMap<String, Parameter>,
}

impl Registry {
    /// Build a registry from a declared schema.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] if any declaration is invalid.
    pub fn new(schema: RegistrySchema) -> Result<Self, SchemaError> {
        let name = schema.name.clone();
        let params = schema.build()?;
        debug!(registry = %name, parameters = params.len(), "registry created");
        Ok(Self { name, params })
    }

    /// Returns the subsystem name this registry belongs to.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the number of declared parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Returns a parameter record by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Parameter> {
        self.params.get(id)
    }

    /// Returns every parameter's metadata, in schema order.
    #[must_use]
    pub fn describe(&self) -> IndexMap<String, ParameterMetadata> {
        self.params
            .iter()
            .map(|(id, p)| (id.clone(), p.metadata()))
            .collect()
    }

    /// Returns a copy of every parameter's current value.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.params
            .iter()
            .map(|(id, p)| (id.clone(), p.value.clone()))
            .collect()
    }

    /// Apply a batch of update requests, stamped with the current time.
    pub fn update(&mut self, requests: IndexMap<String, UpdateRequest>, source: &str) -> UpdateResult {
        self.update_at(requests, source, now_ms())
    }

    /// Apply a batch of update requests with an explicit timestamp.
    ///
    /// Entries are processed in order and independently: an unknown id or
    /// ill-fitting request is reported as rejected and the remaining entries
    /// are still applied.
    pub fn update_at(
        &mut self,
        requests: IndexMap<String, UpdateRequest>,
        source: &str,
        now_ms: u64,
    ) -> UpdateResult {
        let mut outcomes = IndexMap::with_capacity(requests.len());
        for (id, request) in requests {
            let outcome = self.apply(&id, &request, source, now_ms);
            outcomes.insert(id, outcome);
        }
        UpdateResult {
            source: source.to_string(),
            outcomes,
            snapshot: self.snapshot(),
        }
    }

    /// Apply a loosely-typed JSON payload, stamped with the current time.
    ///
    /// See [`json::interpret`] for the accepted entry shapes.
    pub fn update_json(&mut self, payload: &Map<String, Value>, source: &str) -> UpdateResult {
        self.update_json_at(payload, source, now_ms())
    }

    /// Apply a loosely-typed JSON payload with an explicit timestamp.
    pub fn update_json_at(&mut self, payload: &Map<String, Value>, source: &str, now_ms: u64) -> UpdateResult {
        let mut outcomes = IndexMap::with_capacity(payload.len());
        for (id, raw) in payload {
            let outcome = match self.params.get(id) {
                None => self.reject_unknown(id, source),
                Some(param) => match json::interpret(raw, param.kind) {
                    Ok(request) => self.apply(id, &request, source, now_ms),
                    Err(reason) => self.reject_kind(id, source, reason),
                },
            };
            outcomes.insert(id.clone(), outcome);
        }
        UpdateResult {
            source: source.to_string(),
            outcomes,
            snapshot: self.snapshot(),
        }
    }

    fn apply(&mut self, id: &str, request: &UpdateRequest, source: &str, now_ms: u64) -> ParameterOutcome {
        let Some(param) = self.params.get_mut(id) else {
            return self.reject_unknown(id, source);
        };
        match param.resolve(request) {
            Ok(resolved) => {
                param.value = resolved.value.clone();
                param.last_updated = Some(now_ms);
                param.last_source = source.to_string();
                if resolved.clamped_from.is_some() {
                    warn!(registry = %self.name, param = id, source, "parameter update clamped");
                } else {
                    debug!(registry = %self.name, param = id, source, "parameter updated");
                }
                ParameterOutcome::accepted(resolved.value, resolved.clamped_from)
            }
            Err(reason) => self.reject_kind(id, source, reason),
        }
    }

    fn reject_unknown(&self, id: &str, source: &str) -> ParameterOutcome {
        warn!(registry = %self.name, param = id, source, "update rejected: unknown parameter id");
        ParameterOutcome::unknown_id()
    }

    fn reject_kind(&self, id: &str, source: &str, reason: String) -> ParameterOutcome {
        warn!(registry = %self.name, param = id, source, %reason, "update rejected: wrong kind");
        ParameterOutcome::wrong_kind(reason)
    }

    /// Restore the named parameters to their defaults.
    ///
    /// Returns the ids that are not part of this registry.
    pub fn reset(&mut self, ids: &[&str]) -> Vec<String> {
        let now = now_ms();
        let mut unknown = Vec::new();
        for id in ids {
            match self.params.get_mut(*id) {
                Some(param) => Self::reset_param(param, now),
                None => unknown.push((*id).to_string()),
            }
        }
        debug!(registry = %self.name, count = ids.len() - unknown.len(), "parameters reset");
        unknown
    }

    /// Restore every parameter to its default.
    pub fn reset_all(&mut self) {
        let now = now_ms();
        for param in self.params.values_mut() {
            Self::reset_param(param, now);
        }
        debug!(registry = %self.name, "all parameters reset");
    }

    fn reset_param(param: &mut Parameter, now: u64) {
        param.value = param.default.clone();
        param.last_updated = Some(now);
        param.last_source = SYSTEM_DEFAULT_SOURCE.to_string();
    }

    /// Returns an iterator over every parameter record, in schema order.
    pub fn parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.params.values()
    }

    /// Re-apply persisted parameter records onto this registry's schema.
    ///
    /// Only the value and provenance are taken from the persisted records;
    /// bounds, defaults and descriptions always come from the schema. Values
    /// are clamped into the current bounds.
    pub fn restore<I>(&mut self, persisted: I) -> RestoreReport
    where
        I: IntoIterator<Item = Parameter>,
    {
        let mut report = RestoreReport::default();
        for saved in persisted {
            let Some(param) = self.params.get_mut(&saved.id) else {
                report.unknown.push(saved.id);
                continue;
            };
            match param.resolve(&UpdateRequest::Absolute(saved.value)) {
                Ok(resolved) if param.admits(&resolved.value) => {
                    param.value = resolved.value;
                    param.last_updated = saved.last_updated;
                    param.last_source = saved.last_source;
                    report.restored += 1;
                }
                _ => report.mismatched.push(saved.id),
            }
        }
        if !report.unknown.is_empty() || !report.mismatched.is_empty() {
            warn!(
                registry = %self.name,
                unknown = report.unknown.len(),
                mismatched = report.mismatched.len(),
                "restore skipped persisted parameters"
            );
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::outcome::OutcomeStatus;
    use crate::parameter::ParamValue;
    use crate::request::Directive;
    use crate::schema::ParameterSpec;

    fn make_registry() -> Registry {
        let schema = RegistrySchema::new("military")
            .param(
                ParameterSpec::scalar("defense_readiness_level", 0.7, "Overall readiness")
                    .with_bounds(0.3, 1.0),
            )
            .param(ParameterSpec::scalar("training_intensity", 0.7, "Training intensity"))
            .param(ParameterSpec::structured(
                "military_budget_allocation",
                [("personnel", 0.4), ("equipment", 0.25), ("operations", 0.35)],
                "Budget split",
            ))
            .param(ParameterSpec::choice(
                "strategic_doctrine",
                ["balanced_defense", "forward_defense"],
                "balanced_defense",
                "Doctrine",
            ));
        Registry::new(schema).unwrap()
    }

    fn requests(entries: Vec<(&str, UpdateRequest)>) -> IndexMap<String, UpdateRequest> {
        entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    #[test]
    fn test_describe_lists_schema_in_order() {
        let registry = make_registry();
        let described = registry.describe();
        let ids: Vec<_> = described.keys().map(String::as_str).collect();
        assert_eq!(
            ids,
            vec![
                "defense_readiness_level",
                "training_intensity",
                "military_budget_allocation",
                "strategic_doctrine"
            ]
        );
        assert_eq!(described["defense_readiness_level"].min, 0.3);
        assert_eq!(described["strategic_doctrine"].variants.len(), 2);
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let registry = make_registry();
        let snap = registry.snapshot().with("defense_readiness_level", 0.1);
        assert_eq!(snap.scalar("defense_readiness_level"), Some(0.1));
        assert_eq!(registry.snapshot().scalar("defense_readiness_level"), Some(0.7));
    }

    #[test]
    fn test_partial_success() {
        let mut registry = make_registry();
        let result = registry.update_at(
            requests(vec![
                ("training_intensity", UpdateRequest::from(0.9)),
                ("unknown_param", UpdateRequest::from(1.0)),
            ]),
            "ai",
            42,
        );
        assert_eq!(result.outcomes["training_intensity"].status, OutcomeStatus::Accepted);
        assert_eq!(result.outcomes["unknown_param"].status, OutcomeStatus::RejectedUnknownId);
        assert_eq!(result.snapshot.scalar("training_intensity"), Some(0.9));
        assert_eq!(result.rejected(), vec!["unknown_param"]);

        let param = registry.get("training_intensity").unwrap();
        assert_eq!(param.last_updated, Some(42));
        assert_eq!(param.last_source, "ai");
    }

    #[test]
    fn test_unknown_only_leaves_snapshot_unchanged() {
        let mut registry = make_registry();
        let before = registry.snapshot();
        let result = registry.update(requests(vec![("unknown_param", UpdateRequest::from(1.0))]), "ai");
        assert_eq!(result.outcomes.len(), 1);
        assert_eq!(result.outcomes["unknown_param"].status, OutcomeStatus::RejectedUnknownId);
        assert_eq!(result.snapshot, before);
    }

    #[test]
    fn test_scalar_bounds_hold_after_any_update() {
        let mut registry = make_registry();
        let inputs = [
            UpdateRequest::from(-5.0),
            UpdateRequest::from(5.0),
            UpdateRequest::Relative(0.45),
            UpdateRequest::Relative(-2.0),
            UpdateRequest::Directive(Directive::Increase),
            UpdateRequest::Directive(Directive::Decrease),
            UpdateRequest::Directive(Directive::Reset),
        ];
        for input in inputs {
            let result = registry.update(requests(vec![("defense_readiness_level", input)]), "operator");
            let v = result.snapshot.scalar("defense_readiness_level").unwrap();
            assert!((0.3..=1.0).contains(&v), "value {v} escaped its bounds");
        }
    }

    #[test]
    fn test_clamp_is_reported() {
        let mut registry = make_registry();
        let result = registry.update(requests(vec![("defense_readiness_level", UpdateRequest::from(1.7))]), "ai");
        let outcome = &result.outcomes["defense_readiness_level"];
        assert_eq!(outcome.status, OutcomeStatus::AcceptedClamped);
        assert_eq!(outcome.value, Some(ParamValue::Scalar(1.0)));
        assert_eq!(outcome.requested, Some(ParamValue::Scalar(1.7)));
    }

    #[test]
    fn test_wrong_kind_rejected_without_mutation() {
        let mut registry = make_registry();
        let result = registry.update(
            requests(vec![
                ("strategic_doctrine", UpdateRequest::from(0.5)),
                ("military_budget_allocation", UpdateRequest::Directive(Directive::Increase)),
            ]),
            "ai",
        );
        assert!(result.outcomes.values().all(|o| o.status == OutcomeStatus::RejectedWrongKind));
        assert_eq!(result.snapshot.choice("strategic_doctrine"), Some("balanced_defense"));
        assert_eq!(registry.get("strategic_doctrine").unwrap().last_updated, None);
    }

    #[test]
    fn test_update_json_mixed_payload() {
        let mut registry = make_registry();
        let payload = json!({
            "defense_readiness_level": 0.95,
            "training_intensity": "-0.2",
            "military_budget_allocation": { "personnel": 0.5 },
            "strategic_doctrine": "forward_defense",
            "unknown_param": 1.0,
        });
        let result = registry.update_json(payload.as_object().unwrap(), "ai");

        assert_eq!(result.accepted_count(), 4);
        assert_eq!(result.outcomes["unknown_param"].status, OutcomeStatus::RejectedUnknownId);
        assert_eq!(result.snapshot.scalar("defense_readiness_level"), Some(0.95));
        assert!((result.snapshot.scalar("training_intensity").unwrap() - 0.5).abs() < 1e-9);
        assert_eq!(result.snapshot.weights("military_budget_allocation").unwrap()["personnel"], 0.5);
        assert_eq!(result.snapshot.choice("strategic_doctrine"), Some("forward_defense"));
    }

    #[test]
    fn test_update_json_out_of_vocabulary_directive() {
        let mut registry = make_registry();
        let payload = json!({ "training_intensity": "maximize" });
        let result = registry.update_json(payload.as_object().unwrap(), "ai");
        let outcome = &result.outcomes["training_intensity"];
        assert_eq!(outcome.status, OutcomeStatus::RejectedWrongKind);
        assert!(outcome.reason.as_deref().unwrap().contains("maximize"));
    }

    #[test]
    fn test_reset_named_and_all() {
        let mut registry = make_registry();
        registry.update(
            requests(vec![
                ("training_intensity", UpdateRequest::from(0.1)),
                ("defense_readiness_level", UpdateRequest::from(0.9)),
            ]),
            "ai",
        );

        let unknown = registry.reset(&["training_intensity", "nope"]);
        assert_eq!(unknown, vec!["nope".to_string()]);
        let param = registry.get("training_intensity").unwrap();
        assert_eq!(param.value, ParamValue::Scalar(0.7));
        assert_eq!(param.last_source, SYSTEM_DEFAULT_SOURCE);
        assert_eq!(registry.snapshot().scalar("defense_readiness_level"), Some(0.9));

        registry.reset_all();
        assert_eq!(registry.snapshot().scalar("defense_readiness_level"), Some(0.7));
    }

    #[test]
    fn test_restore_applies_values_onto_schema() {
        let mut source = make_registry();
        source.update_at(requests(vec![("training_intensity", UpdateRequest::from(0.2))]), "operator", 7);
        let mut persisted: Vec<Parameter> = source.parameters().cloned().collect();
        persisted.push(Parameter {
            id: "retired_knob".to_string(),
            ..persisted[0].clone()
        });

        let mut target = make_registry();
        let report = target.restore(persisted);
        assert_eq!(report.restored, 4);
        assert_eq!(report.unknown, vec!["retired_knob".to_string()]);
        let param = target.get("training_intensity").unwrap();
        assert_eq!(param.value, ParamValue::Scalar(0.2));
        assert_eq!(param.last_source, "operator");
        assert_eq!(param.last_updated, Some(7));
    }
}
