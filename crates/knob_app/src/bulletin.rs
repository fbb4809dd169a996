//! Cross-system bulletin board.
//!
//! After every tick the driver posts each instance's cross-system channel
//! payloads here. On the next tick other instances read them when building
//! their signals. Instances never see each other's state, only these
//! payloads.

use dashmap::DashMap;
use serde_json::Value;

/// Latest cross-system payloads, keyed by instance name then channel name.
#[derive(Debug, Default)]
pub struct Bulletin {
    posts: DashMap<String, DashMap<String, Value>>,
}

impl Bulletin {
    /// Create an empty board.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Post `payload` as the latest value of `instance`'s `channel`.
    pub fn publish(&self, instance: &str, channel: &str, payload: Value) {
        self.posts
            .entry(instance.to_string())
            .or_default()
            .insert(channel.to_string(), payload);
    }

    /// Returns a copy of the latest payload posted on `instance`'s `channel`.
    #[must_use]
    pub fn read(&self, instance: &str, channel: &str) -> Option<Value> {
        let channels = self.posts.get(instance)?;
        channels.get(channel).map(|payload| payload.value().clone())
    }

    /// Drop everything `instance` has posted.
    pub fn retract(&self, instance: &str) {
        self.posts.remove(instance);
    }

    /// Returns the names of instances that have posted, in no particular order.
    #[must_use]
    pub fn publishers(&self) -> Vec<String> {
        self.posts.iter().map(|entry| entry.key().clone()).collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_latest_post_wins() {
        let bulletin = Bulletin::new();
        bulletin.publish("treasury", "funding", json!({ "funding_availability": 1.0 }));
        bulletin.publish("treasury", "funding", json!({ "funding_availability": 0.4 }));
        assert_eq!(
            bulletin.read("treasury", "funding"),
            Some(json!({ "funding_availability": 0.4 }))
        );
    }

    #[test]
    fn test_read_missing() {
        let bulletin = Bulletin::new();
        assert!(bulletin.read("treasury", "funding").is_none());
        bulletin.publish("treasury", "funding", json!(1));
        assert!(bulletin.read("treasury", "alerts").is_none());
        assert!(bulletin.read("military", "funding").is_none());
    }

    #[test]
    fn test_retract() {
        let bulletin = Bulletin::new();
        bulletin.publish("military", "resource_demand", json!({}));
        assert_eq!(bulletin.publishers(), vec!["military".to_string()]);
        bulletin.retract("military");
        assert!(bulletin.is_empty());
    }
}
