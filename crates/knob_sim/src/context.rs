//! Per-tick context handed to every rule.

use knob_registry::Snapshot;

/// Ephemeral inputs for one tick. Never persisted.
#[derive(Debug)]
pub struct TickContext<'a, G> {
    /// The tick being computed.
    pub tick_id: u64,
    /// Driver-supplied timestamp, milliseconds since the Unix epoch.
    pub now_ms: u64,
    /// Registry snapshot taken for this tick.
    pub params: &'a Snapshot,
    /// External signals for this tick only.
    pub signals: &'a G,
}

impl<'a, G> TickContext<'a, G> {
    #[must_use]
    pub fn new(tick_id: u64, now_ms: u64, params: &'a Snapshot, signals: &'a G) -> Self {
        Self {
            tick_id,
            now_ms,
            params,
            signals,
        }
    }

    /// Returns the scalar knob `id`, or `fallback` if it is not in the snapshot.
    #[must_use]
    pub fn knob(&self, id: &str, fallback: f64) -> f64 {
        self.params.scalar_or(id, fallback)
    }
}
