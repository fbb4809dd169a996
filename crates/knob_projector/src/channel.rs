//! Output channels.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProjectionError;

/// The declared purpose of a channel, used by consumers to pick payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChannelRole {
    /// Flat numeric dashboard values.
    Metrics,
    /// Derived analysis: gaps, strengths, recommendations.
    Analysis,
    /// Threshold-crossing alerts.
    Alerts,
    /// The narrow payload other subsystem instances consume.
    CrossSystem,
    Custom,
}

impl ChannelRole {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Metrics => "metrics",
            Self::Analysis => "analysis",
            Self::Alerts => "alerts",
            Self::CrossSystem => "cross-system",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for ChannelRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, pure projection of a state into one output shape.
///
/// A channel never mutates the state. When it cannot produce a payload it
/// returns an error (or panics) and the projector substitutes
/// [`Channel::fallback`].
pub trait Channel<S>: Send + Sync {
    /// Unique name within a projector.
    fn name(&self) -> &str;

    fn role(&self) -> ChannelRole;

    /// Human-readable summary of the payload.
    fn description(&self) -> &str {
        ""
    }

    /// Build the payload for `state`.
    ///
    /// # Errors
    ///
    /// Returns a [`ProjectionError`] when the payload cannot be built.
    fn project(&self, state: &S) -> Result<Value, ProjectionError>;

    /// The payload used in place of a failed projection.
    fn fallback(&self) -> Value {
        Value::Object(serde_json::Map::new())
    }
}

/// A [`Channel`] backed by a function or closure.
pub struct FnChannel<F> {
    name: &'static str,
    role: ChannelRole,
    description: &'static str,
    fallback: Value,
    f: F,
}

impl<F> FnChannel<F> {
    /// Wrap `f` as the channel `name`. The fallback defaults to `{}`.
    #[must_use]
    pub fn new(name: &'static str, role: ChannelRole, f: F) -> Self {
        Self {
            name,
            role,
            description: "",
            fallback: Value::Object(serde_json::Map::new()),
            f,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    #[must_use]
    pub fn with_fallback(mut self, fallback: Value) -> Self {
        self.fallback = fallback;
        self
    }
}

impl<F> fmt::Debug for FnChannel<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnChannel")
            .field("name", &self.name)
            .field("role", &self.role)
            .finish()
    }
}

impl<S, F> Channel<S> for FnChannel<F>
where
    F: Fn(&S) -> Result<Value, ProjectionError> + Send + Sync,
{
    fn name(&self) -> &str {
        self.name
    }

    fn role(&self) -> ChannelRole {
        self.role
    }

    fn description(&self) -> &str {
        self.description
    }

    fn project(&self, state: &S) -> Result<Value, ProjectionError> {
        (self.f)(state)
    }

    fn fallback(&self) -> Value {
        self.fallback.clone()
    }
}

/// Serialize a typed payload into a channel value.
///
/// # Errors
///
/// Returns [`ProjectionError::Serialize`] if `payload` cannot be represented
/// as JSON (e.g. a map with non-string keys).
pub fn to_payload<T: Serialize>(payload: &T) -> Result<Value, ProjectionError> {
    Ok(serde_json::to_value(payload)?)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn level(state: &f64) -> Result<Value, ProjectionError> {
        Ok(json!({ "level": state }))
    }

    #[test]
    fn test_fn_channel() {
        let channel = FnChannel::new("readiness", ChannelRole::Metrics, level)
            .with_description("Current readiness")
            .with_fallback(json!({ "level": 0.0 }));
        assert_eq!(Channel::<f64>::name(&channel), "readiness");
        assert_eq!(Channel::<f64>::description(&channel), "Current readiness");
        assert_eq!(Channel::<f64>::project(&channel, &0.8).unwrap(), json!({ "level": 0.8 }));
        assert_eq!(Channel::<f64>::fallback(&channel), json!({ "level": 0.0 }));
    }

    #[test]
    fn test_role_serializes_kebab_case() {
        assert_eq!(serde_json::to_value(ChannelRole::CrossSystem).unwrap(), json!("cross-system"));
        assert_eq!(ChannelRole::CrossSystem.to_string(), "cross-system");
    }
}
