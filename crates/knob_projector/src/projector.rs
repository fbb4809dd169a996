//! The channel set for one subsystem instance.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::channel::{Channel, ChannelRole};
use crate::error::{ChannelFault, ProjectorError};

/// Introspection view of a registered channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub name: String,
    pub role: ChannelRole,
    pub description: String,
}

/// One channel's output for one state.
#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub role: ChannelRole,
    /// The channel payload, or its fallback if `fault` is set.
    pub payload: Value,
    pub fault: Option<ChannelFault>,
}

/// Every channel's output for one state, in registration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectionSet {
    projections: IndexMap<String, Projection>,
}

impl ProjectionSet {
    #[must_use]
    pub fn get(&self, channel: &str) -> Option<&Projection> {
        self.projections.get(channel)
    }

    /// Returns the payload of `channel`, fallback included.
    #[must_use]
    pub fn payload(&self, channel: &str) -> Option<&Value> {
        self.projections.get(channel).map(|p| &p.payload)
    }

    /// Returns the payloads of every channel with the given role.
    pub fn by_role(&self, role: ChannelRole) -> impl Iterator<Item = (&str, &Value)> {
        self.projections
            .iter()
            .filter(move |(_, p)| p.role == role)
            .map(|(name, p)| (name.as_str(), &p.payload))
    }

    pub fn faults(&self) -> impl Iterator<Item = &ChannelFault> {
        self.projections.values().filter_map(|p| p.fault.as_ref())
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.faults().next().is_none()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Projection)> {
        self.projections.iter().map(|(name, p)| (name.as_str(), p))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.projections.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.projections.is_empty()
    }

    /// Returns `{ channel: payload, ... }` as a single JSON object.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.projections
                .iter()
                .map(|(name, p)| (name.clone(), p.payload.clone()))
                .collect(),
        )
    }
}

/// A named set of channels over the state type `S`.
pub struct Projector<S> {
    name: String,
    channels: IndexMap<String, Box<dyn Channel<S>>>,
}

impl<S> std::fmt::Debug for Projector<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Projector")
            .field("name", &self.name)
            .field("channels", &self.channels.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<S> Projector<S> {
    /// Create an empty projector.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            channels: IndexMap::new(),
        }
    }

    /// Register a channel.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectorError::DuplicateChannel`] if a channel with the same
    /// name is already registered.
    pub fn register(&mut self, channel: impl Channel<S> + 'static) -> Result<(), ProjectorError> {
        let name = channel.name().to_string();
        if self.channels.contains_key(&name) {
            return Err(ProjectorError::DuplicateChannel(name));
        }
        debug!(projector = %self.name, channel = %name, role = %channel.role(), "channel registered");
        self.channels.insert(name, Box::new(channel));
        Ok(())
    }

    /// Register a channel, returning the projector.
    ///
    /// # Errors
    ///
    /// See [`Projector::register`].
    pub fn with(mut self, channel: impl Channel<S> + 'static) -> Result<Self, ProjectorError> {
        self.register(channel)?;
        Ok(self)
    }

    /// Returns the registered channels in registration order.
    #[must_use]
    pub fn channels(&self) -> Vec<ChannelInfo> {
        self.channels
            .values()
            .map(|c| ChannelInfo {
                name: c.name().to_string(),
                role: c.role(),
                description: c.description().to_string(),
            })
            .collect()
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Project `state` through the channel `name`.
    ///
    /// A failing channel still yields a [`Projection`], carrying the fallback
    /// payload and the fault.
    ///
    /// # Errors
    ///
    /// Returns [`ProjectorError::UnknownChannel`] if no such channel exists.
    pub fn project(&self, state: &S, name: &str) -> Result<Projection, ProjectorError> {
        let channel = self
            .channels
            .get(name)
            .ok_or_else(|| ProjectorError::UnknownChannel(name.to_string()))?;
        Ok(self.run(channel.as_ref(), state))
    }

    /// Project `state` through every channel.
    ///
    /// Channels are isolated from each other: one failing channel never
    /// affects another's payload.
    #[must_use]
    pub fn project_all(&self, state: &S) -> ProjectionSet {
        let projections: IndexMap<_, _> = self
            .channels
            .iter()
            .map(|(name, channel)| (name.clone(), self.run(channel.as_ref(), state)))
            .collect();
        let set = ProjectionSet { projections };
        debug!(
            projector = %self.name,
            channels = set.len(),
            faults = set.faults().count(),
            "projected all channels"
        );
        set
    }

    fn run(&self, channel: &dyn Channel<S>, state: &S) -> Projection {
        let outcome = catch_unwind(AssertUnwindSafe(|| channel.project(state)));
        let fault = match outcome {
            Ok(Ok(payload)) => {
                return Projection {
                    role: channel.role(),
                    payload,
                    fault: None,
                };
            }
            Ok(Err(err)) => ChannelFault::Failed {
                channel: channel.name().to_string(),
                reason: err.to_string(),
            },
            Err(payload) => ChannelFault::Panicked {
                channel: channel.name().to_string(),
                message: panic_message(payload.as_ref()),
            },
        };
        warn!(projector = %self.name, %fault, "channel fell back");
        let payload = catch_unwind(AssertUnwindSafe(|| channel.fallback())).unwrap_or_else(|payload| {
            warn!(
                projector = %self.name,
                channel = channel.name(),
                message = %panic_message(payload.as_ref()),
                "channel fallback panicked"
            );
            Value::Object(Map::new())
        });
        Projection {
            role: channel.role(),
            payload,
            fault: Some(fault),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::channel::FnChannel;
    use crate::error::ProjectionError;

    #[derive(Debug)]
    struct Gauge {
        readiness: f64,
    }

    fn metrics(state: &Gauge) -> Result<Value, ProjectionError> {
        Ok(json!({ "readiness": state.readiness }))
    }

    fn broken(_state: &Gauge) -> Result<Value, ProjectionError> {
        Err(ProjectionError::failed("capabilities not computed"))
    }

    fn explosive(_state: &Gauge) -> Result<Value, ProjectionError> {
        panic!("division by zero")
    }

    fn demand(state: &Gauge) -> Result<Value, ProjectionError> {
        Ok(json!({ "readiness": state.readiness, "budget_request": 1.0 }))
    }

    fn projector() -> Projector<Gauge> {
        Projector::new("military")
            .with(FnChannel::new("readiness", ChannelRole::Metrics, metrics))
            .and_then(|p| {
                p.with(
                    FnChannel::new("analysis", ChannelRole::Analysis, broken)
                        .with_fallback(json!({ "gaps": [] })),
                )
            })
            .and_then(|p| p.with(FnChannel::new("force_structure", ChannelRole::Custom, explosive)))
            .and_then(|p| p.with(FnChannel::new("resource_demand", ChannelRole::CrossSystem, demand)))
            .unwrap()
    }

    #[test]
    fn test_duplicate_channel_rejected() {
        let mut p = projector();
        let err = p
            .register(FnChannel::new("readiness", ChannelRole::Metrics, metrics))
            .unwrap_err();
        assert_eq!(err, ProjectorError::DuplicateChannel("readiness".to_string()));
        assert_eq!(p.len(), 4);
    }

    #[test]
    fn test_channels_in_registration_order() {
        let names: Vec<_> = projector().channels().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["readiness", "analysis", "force_structure", "resource_demand"]);
    }

    #[test]
    fn test_project_single_channel() {
        let p = projector();
        let state = Gauge { readiness: 0.8 };
        let projection = p.project(&state, "readiness").unwrap();
        assert_eq!(projection.payload, json!({ "readiness": 0.8 }));
        assert!(projection.fault.is_none());

        let projection = p.project(&state, "analysis").unwrap();
        assert_eq!(projection.payload, json!({ "gaps": [] }));
        assert!(projection.fault.is_some());

        assert_eq!(
            p.project(&state, "nope").unwrap_err(),
            ProjectorError::UnknownChannel("nope".to_string())
        );
    }

    #[test]
    fn test_failing_channels_isolated() {
        let p = projector();
        let set = p.project_all(&Gauge { readiness: 0.6 });
        assert_eq!(set.len(), 4);
        assert_eq!(set.payload("readiness"), Some(&json!({ "readiness": 0.6 })));
        assert_eq!(set.payload("analysis"), Some(&json!({ "gaps": [] })));
        assert_eq!(set.payload("force_structure"), Some(&json!({})));
        assert_eq!(
            set.payload("resource_demand"),
            Some(&json!({ "readiness": 0.6, "budget_request": 1.0 }))
        );

        let faulted: Vec<_> = set.faults().map(ChannelFault::channel).collect();
        assert_eq!(faulted, vec!["analysis", "force_structure"]);
        assert!(!set.is_clean());
    }

    /// Fails to project and has no usable fallback either.
    struct Hollow;

    impl Channel<Gauge> for Hollow {
        fn name(&self) -> &str {
            "hollow"
        }

        fn role(&self) -> ChannelRole {
            ChannelRole::Alerts
        }

        fn project(&self, _state: &Gauge) -> Result<Value, ProjectionError> {
            Err(ProjectionError::failed("no alert thresholds"))
        }

        fn fallback(&self) -> Value {
            panic!("fallback template missing")
        }
    }

    #[test]
    fn test_panicking_fallback_isolated() {
        let mut p = projector();
        p.register(Hollow).unwrap();
        let set = p.project_all(&Gauge { readiness: 0.7 });

        assert_eq!(set.len(), 5);
        assert_eq!(set.payload("hollow"), Some(&json!({})));
        assert_eq!(set.get("hollow").unwrap().role, ChannelRole::Alerts);
        assert_eq!(set.payload("readiness"), Some(&json!({ "readiness": 0.7 })));
        let faulted: Vec<_> = set.faults().map(ChannelFault::channel).collect();
        assert_eq!(faulted, vec!["analysis", "force_structure", "hollow"]);
    }

    #[test]
    fn test_by_role() {
        let set = projector().project_all(&Gauge { readiness: 0.5 });
        let cross: Vec<_> = set.by_role(ChannelRole::CrossSystem).map(|(name, _)| name).collect();
        assert_eq!(cross, vec!["resource_demand"]);
        assert_eq!(set.to_value()["readiness"], json!({ "readiness": 0.5 }));
    }
}
