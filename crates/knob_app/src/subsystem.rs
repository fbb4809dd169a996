//! One running subsystem instance.
//!
//! A [`Subsystem`] bundles a registry, a simulator and a projector with the
//! glue the driver needs: staged external signals, an adapter that fills
//! cross-system signals from the [`Bulletin`], and snapshot export/import.
//! [`Instance`] erases the state and signal types so instances of different
//! subsystems can share one tick loop.

use indexmap::IndexMap;
use knob_projector::{ChannelRole, ProjectionSet, Projector};
use knob_registry::{ParameterMetadata, Registry, RestoreReport, Snapshot, UpdateRequest, UpdateResult};
use knob_sim::{SimState, Simulator, TickReport};
use knob_subsystems::Parts;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use crate::bulletin::Bulletin;
use crate::error::{DriverError, PersistError};
use crate::persist::{self, SubsystemSnapshot};

/// Fills cross-system fields of a signal record from the bulletin.
pub type SignalAdapter<G> = Box<dyn Fn(&Bulletin, &mut G) + Send + Sync>;

/// A registry, simulator and projector driven together.
pub struct Subsystem<S, G> {
    id: Uuid,
    registry: Registry,
    simulator: Simulator<S, G>,
    projector: Projector<S>,
    adapter: Option<SignalAdapter<G>>,
    staged: G,
}

impl<S, G: std::fmt::Debug> std::fmt::Debug for Subsystem<S, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subsystem")
            .field("id", &self.id)
            .field("name", &self.simulator.name())
            .field("tick_id", &self.simulator.tick_id())
            .field("projector", &self.projector)
            .field("staged", &self.staged)
            .finish_non_exhaustive()
    }
}

impl<S: SimState, G: Default> Subsystem<S, G> {
    /// Wrap freshly built parts under a new instance id.
    #[must_use]
    pub fn from_parts(parts: Parts<S, G>) -> Self {
        let id = Uuid::new_v4();
        info!(instance = %parts.simulator.name(), %id, "subsystem instance created");
        Self {
            id,
            registry: parts.registry,
            simulator: parts.simulator,
            projector: parts.projector,
            adapter: None,
            staged: G::default(),
        }
    }

    /// Set the adapter run at the start of every tick.
    #[must_use]
    pub fn with_adapter<F>(mut self, adapter: F) -> Self
    where
        F: Fn(&Bulletin, &mut G) + Send + Sync + 'static,
    {
        self.adapter = Some(Box::new(adapter));
        self
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.simulator.name()
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    #[must_use]
    pub fn simulator(&self) -> &Simulator<S, G> {
        &self.simulator
    }

    #[must_use]
    pub fn state(&self) -> &S {
        self.simulator.state()
    }

    /// Mutable access to the projector, for registering extra channels.
    pub fn projector_mut(&mut self) -> &mut Projector<S> {
        &mut self.projector
    }

    /// Replace the external signals consumed by the next tick.
    ///
    /// Staged signals are used once; a tick with nothing staged sees
    /// `G::default()` plus whatever the adapter fills in.
    pub fn stage(&mut self, signals: G) {
        self.staged = signals;
    }

    pub fn update(&mut self, requests: IndexMap<String, UpdateRequest>, source: &str) -> UpdateResult {
        self.registry.update(requests, source)
    }

    pub fn update_json(&mut self, payload: &Map<String, Value>, source: &str) -> UpdateResult {
        self.registry.update_json(payload, source)
    }

    #[must_use]
    pub fn describe(&self) -> IndexMap<String, ParameterMetadata> {
        self.registry.describe()
    }

    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.registry.snapshot()
    }

    /// Advance one tick with the staged signals and the bulletin's view of
    /// the other instances.
    pub fn tick(&mut self, bulletin: &Bulletin, now_ms: u64) -> TickReport {
        let mut signals = std::mem::take(&mut self.staged);
        if let Some(adapter) = &self.adapter {
            adapter(bulletin, &mut signals);
        }
        let params = self.registry.snapshot();
        self.simulator.tick(&params, &signals, now_ms)
    }

    #[must_use]
    pub fn project_all(&self) -> ProjectionSet {
        self.projector.project_all(self.simulator.state())
    }

    /// Post every cross-system channel's payload to the bulletin.
    ///
    /// Returns the number of payloads posted.
    pub fn publish(&self, bulletin: &Bulletin) -> usize {
        let mut posted = 0;
        for info in self.projector.channels() {
            if info.role != ChannelRole::CrossSystem {
                continue;
            }
            if let Ok(projection) = self.projector.project(self.simulator.state(), &info.name) {
                bulletin.publish(self.name(), &info.name, projection.payload);
                posted += 1;
            }
        }
        debug!(instance = %self.name(), tick_id = self.simulator.tick_id(), posted, "published cross-system payloads");
        posted
    }

    /// Capture knobs and state as of the last completed tick.
    #[must_use]
    pub fn export(&self) -> SubsystemSnapshot<S> {
        SubsystemSnapshot {
            name: self.name().to_string(),
            tick_id: self.simulator.tick_id(),
            parameters: self.registry.parameters().cloned().collect(),
            state: self.simulator.state().clone(),
        }
    }

    /// Resume from a snapshot taken from an instance with the same name.
    ///
    /// The state is validated before anything is replaced; on error the
    /// instance is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::SnapshotMismatch`] for a snapshot of another
    /// instance and [`DriverError::InvalidState`] for an out-of-domain state.
    pub fn import(&mut self, snapshot: SubsystemSnapshot<S>) -> Result<RestoreReport, DriverError> {
        if snapshot.name != self.name() {
            return Err(DriverError::SnapshotMismatch {
                expected: self.name().to_string(),
                found: snapshot.name,
            });
        }
        self.simulator.restore(snapshot.state, snapshot.tick_id)?;
        let report = self.registry.restore(snapshot.parameters);
        info!(
            instance = %self.name(),
            tick_id = snapshot.tick_id,
            restored = report.restored,
            unknown = report.unknown.len(),
            mismatched = report.mismatched.len(),
            "snapshot imported"
        );
        Ok(report)
    }
}

/// A subsystem instance with its state and signal types erased.
pub trait Instance: Send {
    fn id(&self) -> Uuid;

    fn name(&self) -> &str;

    /// Last completed tick.
    fn tick_id(&self) -> u64;

    fn describe(&self) -> IndexMap<String, ParameterMetadata>;

    fn snapshot(&self) -> Snapshot;

    fn update_json(&mut self, payload: &Map<String, Value>, source: &str) -> UpdateResult;

    fn tick(&mut self, bulletin: &Bulletin, now_ms: u64) -> TickReport;

    fn project_all(&self) -> ProjectionSet;

    fn publish(&self, bulletin: &Bulletin) -> usize;

    /// The current state as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError::Json`] if the state does not serialise.
    fn state_json(&self) -> Result<Value, PersistError>;

    /// Encode a snapshot as MessagePack.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError`] if encoding fails.
    fn export_bytes(&self) -> Result<Vec<u8>, PersistError>;

    /// Decode and import a MessagePack snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError`] if decoding or importing fails.
    fn import_bytes(&mut self, bytes: &[u8]) -> Result<RestoreReport, DriverError>;
}

impl<S, G> Instance for Subsystem<S, G>
where
    S: SimState + Serialize + DeserializeOwned + Send + 'static,
    G: Default + Send + 'static,
{
    fn id(&self) -> Uuid {
        self.id
    }

    fn name(&self) -> &str {
        self.simulator.name()
    }

    fn tick_id(&self) -> u64 {
        self.simulator.tick_id()
    }

    fn describe(&self) -> IndexMap<String, ParameterMetadata> {
        Subsystem::describe(self)
    }

    fn snapshot(&self) -> Snapshot {
        Subsystem::snapshot(self)
    }

    fn update_json(&mut self, payload: &Map<String, Value>, source: &str) -> UpdateResult {
        Subsystem::update_json(self, payload, source)
    }

    fn tick(&mut self, bulletin: &Bulletin, now_ms: u64) -> TickReport {
        Subsystem::tick(self, bulletin, now_ms)
    }

    fn project_all(&self) -> ProjectionSet {
        Subsystem::project_all(self)
    }

    fn publish(&self, bulletin: &Bulletin) -> usize {
        Subsystem::publish(self, bulletin)
    }

    fn state_json(&self) -> Result<Value, PersistError> {
        Ok(serde_json::to_value(self.simulator.state())?)
    }

    fn export_bytes(&self) -> Result<Vec<u8>, PersistError> {
        persist::encode(&self.export())
    }

    fn import_bytes(&mut self, bytes: &[u8]) -> Result<RestoreReport, DriverError> {
        let snapshot: SubsystemSnapshot<S> = persist::decode(bytes)?;
        self.import(snapshot)
    }
}
