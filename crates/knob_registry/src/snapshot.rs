//! Owned copies of a registry's current values.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::parameter::ParamValue;

/// The current value of every parameter, keyed by id in schema order.
///
/// A snapshot is a copy: mutating it never reaches back into the registry
/// that produced it. Simulators read their knobs exclusively through one.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(IndexMap<String, ParamValue>);

impl Snapshot {
    /// Create an empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// Set a value, returning the snapshot. Mostly useful in tests.
    #[must_use]
    pub fn with(mut self, id: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.0.insert(id.into(), value.into());
        self
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ParamValue> {
        self.0.get(id)
    }

    /// Returns the scalar value of `id`, if present and scalar.
    #[must_use]
    pub fn scalar(&self, id: &str) -> Option<f64> {
        self.0.get(id).and_then(ParamValue::as_scalar)
    }

    /// Returns the scalar value of `id`, or `fallback` when it is missing.
    #[must_use]
    pub fn scalar_or(&self, id: &str, fallback: f64) -> f64 {
        self.scalar(id).unwrap_or(fallback)
    }

    #[must_use]
    pub fn weights(&self, id: &str) -> Option<&IndexMap<String, f64>> {
        self.0.get(id).and_then(ParamValue::as_weights)
    }

    #[must_use]
    pub fn choice(&self, id: &str) -> Option<&str> {
        self.0.get(id).and_then(ParamValue::as_choice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
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
    pub fn into_inner(self) -> IndexMap<String, ParamValue> {
        self.0
    }
}

impl FromIterator<(String, ParamValue)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (String, ParamValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_accessors() {
        let snap = Snapshot::new()
            .with("readiness", 0.7)
            .with("doctrine", "balanced_defense");
        assert_eq!(snap.scalar("readiness"), Some(0.7));
        assert_eq!(snap.scalar("doctrine"), None);
        assert_eq!(snap.choice("doctrine"), Some("balanced_defense"));
        assert_eq!(snap.scalar_or("missing", 0.25), 0.25);
    }

    #[test]
    fn test_serializes_as_plain_map() {
        let snap = Snapshot::new().with("readiness", 0.5);
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json, serde_json::json!({ "readiness": 0.5 }));
    }
}
