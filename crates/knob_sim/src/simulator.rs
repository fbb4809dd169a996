//! The per-subsystem simulator.

use knob_registry::Snapshot;
use tracing::{debug, warn};

use crate::context::TickContext;
use crate::pipeline::Pipeline;
use crate::rule::RuleFault;
use crate::state::{InvalidField, SimState};

/// Outcome of one [`Simulator::tick`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// The tick that was just computed.
    pub tick_id: u64,
    /// Rules that were rolled back during this tick.
    pub faults: Vec<RuleFault>,
}

impl TickReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.faults.is_empty()
    }
}

/// Owns one subsystem's state and advances it one tick at a time.
#[derive(Debug)]
pub struct Simulator<S, G> {
    name: String,
    state: S,
    pipeline: Pipeline<S, G>,
    tick_id: u64,
    last_faults: Vec<RuleFault>,
}

impl<S: SimState, G> Simulator<S, G> {
    /// Create a simulator from a seed state and its rule pipeline.
    #[must_use]
    pub fn new(name: impl Into<String>, seed: S, pipeline: Pipeline<S, G>) -> Self {
        Self {
            name: name.into(),
            state: seed,
            pipeline,
            tick_id: 0,
            last_faults: Vec::new(),
        }
    }

    /// Compute the state following `state` under `ctx`. Pure.
    #[must_use]
    pub fn step(&self, state: &S, ctx: &TickContext<'_, G>) -> (S, Vec<RuleFault>) {
        self.pipeline.advance(state, ctx)
    }

    /// Advance the owned state by one tick.
    ///
    /// The next state is computed on a working copy and swapped in once every
    /// rule has run, so the tick is all-or-nothing from a reader's point of
    /// view.
    pub fn tick(&mut self, params: &Snapshot, signals: &G, now_ms: u64) -> TickReport {
        let tick_id = self.tick_id + 1;
        let ctx = TickContext::new(tick_id, now_ms, params, signals);
        let (next, faults) = self.step(&self.state, &ctx);

        self.state = next;
        self.tick_id = tick_id;
        self.last_faults.clone_from(&faults);

        if faults.is_empty() {
            debug!(simulator = %self.name, tick_id, "tick complete");
        } else {
            warn!(
                simulator = %self.name,
                tick_id,
                faults = faults.len(),
                "tick complete with rolled-back rules"
            );
        }

        TickReport { tick_id, faults }
    }

    /// Replace the owned state, e.g. from a persisted snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidField`] if `state` fails its domain check; the
    /// simulator is left untouched in that case.
    pub fn restore(&mut self, state: S, tick_id: u64) -> Result<(), InvalidField> {
        state.check()?;
        self.state = state;
        self.tick_id = tick_id;
        self.last_faults.clear();
        debug!(simulator = %self.name, tick_id, "state restored");
        Ok(())
    }
}

impl<S, G> Simulator<S, G> {
    #[must_use]
    pub fn state(&self) -> &S {
        &self.state
    }

    /// Returns the id of the last completed tick (0 before the first).
    #[must_use]
    pub fn tick_id(&self) -> u64 {
        self.tick_id
    }

    #[must_use]
    pub fn last_faults(&self) -> &[RuleFault] {
        &self.last_faults
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn pipeline(&self) -> &Pipeline<S, G> {
        &self.pipeline
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;
    use crate::rule::{FnRule, RuleError};
    use crate::rules::smooth_toward;
    use crate::severity::Severity;
    use crate::state::check_unit;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Readiness {
        level: f64,
        posture: Severity,
    }

    impl SimState for Readiness {
        fn check(&self) -> Result<(), InvalidField> {
            check_unit("level", self.level)
        }
    }

    #[derive(Default)]
    struct Noise {
        jitter: Option<f64>,
    }

    fn converge(state: &mut Readiness, ctx: &TickContext<'_, Noise>) -> Result<(), RuleError> {
        let target = ctx.knob("target", 0.7);
        state.level = smooth_toward(state.level, target, 0.1) + ctx.signals.jitter.unwrap_or(0.0);
        Ok(())
    }

    fn posture(state: &mut Readiness, _ctx: &TickContext<'_, Noise>) -> Result<(), RuleError> {
        state.posture = Severity::from_level(state.level);
        Ok(())
    }

    fn simulator() -> Simulator<Readiness, Noise> {
        let pipeline = Pipeline::new()
            .rule(FnRule::new("converge", converge))
            .rule(FnRule::new("posture", posture));
        let seed = Readiness {
            level: 0.7,
            posture: Severity::High,
        };
        Simulator::new("readiness", seed, pipeline)
    }

    #[test]
    fn test_tick_advances_and_counts() {
        let mut sim = simulator();
        let params = Snapshot::new().with("target", 0.95);
        let report = sim.tick(&params, &Noise::default(), 1_000);
        assert_eq!(report.tick_id, 1);
        assert!(report.is_clean());
        assert_eq!(sim.tick_id(), 1);
        assert!(sim.state().level > 0.7);
        assert!(sim.state().level < 0.95);
    }

    #[test]
    fn test_repeated_runs_are_identical() {
        let params = Snapshot::new().with("target", 0.95);
        let mut a = simulator();
        let mut b = simulator();
        for t in 0..25 {
            a.tick(&params, &Noise::default(), t);
            b.tick(&params, &Noise::default(), t);
        }
        assert_eq!(a.state(), b.state());
        assert_eq!(a.tick_id(), b.tick_id());
    }

    #[test]
    fn test_signal_perturbation_only_when_present() {
        let params = Snapshot::new().with("target", 0.5);
        let sim = simulator();
        let seed = sim.state().clone();

        let quiet = Noise::default();
        let (calm, _) = sim.step(&seed, &TickContext::new(1, 0, &params, &quiet));
        let noisy = Noise { jitter: Some(0.05) };
        let (shaken, _) = sim.step(&seed, &TickContext::new(1, 0, &params, &noisy));
        assert!((shaken.level - calm.level - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_out_of_domain_write_keeps_last_valid_value() {
        let mut sim = simulator();
        let params = Snapshot::new().with("target", 0.7);
        let report = sim.tick(&params, &Noise { jitter: Some(5.0) }, 0);
        assert_eq!(report.faults.len(), 1);
        assert_eq!(report.faults[0].rule(), "converge");
        assert_eq!(sim.state().level, 0.7);
        assert_eq!(sim.last_faults().len(), 1);

        sim.tick(&params, &Noise::default(), 1);
        assert!(sim.last_faults().is_empty());
    }

    #[test]
    fn test_restore_rejects_invalid_state() {
        let mut sim = simulator();
        let bad = Readiness {
            level: 1.5,
            posture: Severity::Critical,
        };
        assert!(sim.restore(bad, 9).is_err());
        assert_eq!(sim.tick_id(), 0);

        let good = Readiness {
            level: 0.9,
            posture: Severity::Critical,
        };
        sim.restore(good.clone(), 9).unwrap();
        assert_eq!(sim.state(), &good);
        assert_eq!(sim.tick_id(), 9);
    }
}
