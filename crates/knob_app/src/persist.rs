//! Snapshot codec for persistence collaborators.
//!
//! A [`SubsystemSnapshot`] carries everything needed to resume an instance:
//! its knob records and its state as of a completed tick. Snapshots are
//! encoded with MessagePack for storage, or JSON when a human needs to read
//! them. Writing the bytes anywhere is the caller's business.

use knob_registry::Parameter;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::PersistError;

/// Persisted form of one subsystem instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsystemSnapshot<S> {
    /// Instance name the snapshot was taken from.
    pub name: String,
    /// Last completed tick.
    pub tick_id: u64,
    pub parameters: Vec<Parameter>,
    pub state: S,
}

/// Encode a value to MessagePack bytes.
///
/// Structs are written as maps so snapshots survive field reordering.
///
/// # Errors
///
/// Returns [`PersistError::Encode`] if serialisation fails.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, PersistError> {
    rmp_serde::to_vec_named(value).map_err(PersistError::Encode)
}

/// Decode a value from MessagePack bytes.
///
/// # Errors
///
/// Returns [`PersistError::Decode`] if deserialisation fails.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, PersistError> {
    rmp_serde::from_slice(bytes).map_err(PersistError::Decode)
}

/// Encode a value as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`PersistError::Json`] if serialisation fails.
pub fn to_json<T: Serialize>(value: &T) -> Result<String, PersistError> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Decode a value from JSON text.
///
/// # Errors
///
/// Returns [`PersistError::Json`] if the text does not parse.
pub fn from_json<T: DeserializeOwned>(text: &str) -> Result<T, PersistError> {
    Ok(serde_json::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use knob_subsystems::military::{self, MilitaryState};

    use super::*;

    fn military_snapshot() -> SubsystemSnapshot<MilitaryState> {
        let parts = military::build().unwrap();
        SubsystemSnapshot {
            name: "military".to_string(),
            tick_id: 3,
            parameters: parts.registry.parameters().cloned().collect(),
            state: parts.simulator.state().clone(),
        }
    }

    #[test]
    fn test_msgpack_snapshot_restores_equal() {
        let snapshot = military_snapshot();
        let bytes = encode(&snapshot).unwrap();
        let restored: SubsystemSnapshot<MilitaryState> = decode(&bytes).unwrap();
        assert_eq!(restored, snapshot);
    }

    #[test]
    fn test_json_snapshot_is_readable() {
        let snapshot = military_snapshot();
        let text = to_json(&snapshot).unwrap();
        assert!(text.contains("\"defense_readiness_level\""));
        let restored: SubsystemSnapshot<MilitaryState> = from_json(&text).unwrap();
        assert_eq!(restored.parameters, snapshot.parameters);
    }

    #[test]
    fn test_decode_invalid_bytes() {
        let result: Result<SubsystemSnapshot<MilitaryState>, _> = decode(&[0xFF, 0xFF]);
        assert!(matches!(result, Err(PersistError::Decode(_))));
    }
}
