//! Driver configuration.

use indexmap::IndexMap;
use knob_registry::UpdateResult;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::error::DriverError;
use crate::tick::{TickConfig, TickLoop};

/// Provenance recorded for knobs set from a configuration file.
pub const CONFIG_SOURCE: &str = "config";

/// Knob updates applied to instances before the first tick, keyed by
/// instance name. Each entry is a loosely-typed JSON payload as accepted by
/// `update_json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InitialKnobs {
    instances: IndexMap<String, Map<String, Value>>,
}

impl InitialKnobs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `{ "instance": { "knob": value, ... }, ... }`.
    ///
    /// # Errors
    ///
    /// Returns the parse error if the text is not an object of objects.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// Add (or replace) the payload for one instance.
    #[must_use]
    pub fn with(mut self, instance: impl Into<String>, payload: Map<String, Value>) -> Self {
        self.instances.insert(instance.into(), payload);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Apply every payload to the matching instance of `tick_loop`.
    ///
    /// Rejected entries are logged and reported in the results; they do not
    /// stop the remaining updates.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::UnknownInstance`] if a payload names an
    /// instance the loop does not run. Payloads before it have been applied.
    pub fn apply(&self, tick_loop: &mut TickLoop) -> Result<IndexMap<String, UpdateResult>, DriverError> {
        let mut results = IndexMap::with_capacity(self.instances.len());
        for (name, payload) in &self.instances {
            let result = tick_loop.instance_mut(name)?.update_json(payload, CONFIG_SOURCE);
            for id in result.rejected() {
                warn!(instance = %name, param = id, "initial knob rejected");
            }
            info!(instance = %name, accepted = result.accepted_count(), "initial knobs applied");
            results.insert(name.clone(), result);
        }
        Ok(results)
    }
}

/// Configuration for one driver run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppConfig {
    pub tick: TickConfig,
    /// Advance instances concurrently instead of one after another.
    pub parallel: bool,
    pub knobs: InitialKnobs,
}

impl AppConfig {
    #[must_use]
    pub fn with_tick(mut self, tick: TickConfig) -> Self {
        self.tick = tick;
        self
    }

    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    #[must_use]
    pub fn with_knobs(mut self, knobs: InitialKnobs) -> Self {
        self.knobs = knobs;
        self
    }
}

#[cfg(test)]
mod tests {
    use knob_registry::OutcomeStatus;

    use super::*;
    use crate::wiring;

    #[test]
    fn test_parse_and_apply() {
        let knobs = InitialKnobs::from_json(
            r#"{
                "military": { "defense_readiness_level": 0.9, "morale": 1.0 },
                "treasury": { "tax_efficiency": "increase" }
            }"#,
        )
        .unwrap();
        let mut tick_loop = wiring::coupled(TickConfig::default()).unwrap();
        let results = knobs.apply(&mut tick_loop).unwrap();

        assert_eq!(results["military"].accepted_count(), 1);
        assert_eq!(
            results["military"].outcomes["morale"].status,
            OutcomeStatus::RejectedUnknownId
        );
        let military = tick_loop.instance("military").unwrap();
        assert_eq!(military.snapshot().scalar("defense_readiness_level"), Some(0.9));
        let treasury = tick_loop.instance("treasury").unwrap();
        assert!((treasury.snapshot().scalar("tax_efficiency").unwrap() - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_instance() {
        let knobs = InitialKnobs::new().with("navy", Map::new());
        let mut tick_loop = wiring::coupled(TickConfig::default()).unwrap();
        assert!(matches!(knobs.apply(&mut tick_loop), Err(DriverError::UnknownInstance(name)) if name == "navy"));
    }

    #[test]
    fn test_rejects_non_object_payload() {
        assert!(InitialKnobs::from_json(r#"{ "military": 0.5 }"#).is_err());
    }

    #[test]
    fn test_builder() {
        let config = AppConfig::default()
            .with_tick(TickConfig::default().with_max_ticks(3))
            .with_parallel(true);
        assert_eq!(config.tick.max_ticks, 3);
        assert!(config.parallel);
        assert!(config.knobs.is_empty());
    }
}
