//! Driver tick loop.
//!
//! Every tick follows the same lifecycle:
//!
//! 1. Each instance builds its signals from staged input and the bulletin
//!    as it stood after the previous tick.
//! 2. Each instance advances its simulator one tick.
//! 3. Once every instance has ticked, each one posts its cross-system
//!    payloads to the bulletin.
//! 4. The tick counter advances.
//!
//! Because nothing is posted until all instances have ticked, the order in
//! which instances run never changes the outcome, and they can run in
//! parallel. An instance that panics keeps its pre-tick state and reports
//! the panic as a fault; the tick completes for everyone else.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use knob_sim::{RuleFault, TickReport, panic_message};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::bulletin::Bulletin;
use crate::error::DriverError;
use crate::subsystem::Instance;

/// Configuration for the driver tick loop.
#[derive(Debug, Clone, PartialEq)]
pub struct TickConfig {
    /// Target ticks per second.
    pub tick_rate: f64,
    /// Maximum number of ticks to run (0 = unlimited).
    pub max_ticks: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate: 10.0,
            max_ticks: 0,
        }
    }
}

impl TickConfig {
    #[must_use]
    pub fn with_tick_rate(mut self, tick_rate: f64) -> Self {
        self.tick_rate = tick_rate;
        self
    }

    #[must_use]
    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    /// Wall-clock length of one tick. Non-positive rates run unpaced.
    #[must_use]
    pub fn period(&self) -> Duration {
        if self.tick_rate.is_finite() && self.tick_rate > 0.0 {
            Duration::from_secs_f64(1.0 / self.tick_rate)
        } else {
            Duration::ZERO
        }
    }

    /// Logical timestamp of `tick` in milliseconds, rounded to the nearest
    /// millisecond. Unpaced loops report 0.
    #[must_use]
    pub fn timestamp_ms(&self, tick: u64) -> u64 {
        if self.tick_rate.is_finite() && self.tick_rate > 0.0 {
            (tick as f64 * 1000.0 / self.tick_rate).round() as u64
        } else {
            0
        }
    }

    fn is_done(&self, ticks: u64) -> bool {
        self.max_ticks > 0 && ticks >= self.max_ticks
    }
}

/// Per-instance reports for one driver tick, in instance order.
pub type TickSummary = IndexMap<String, TickReport>;

/// Rule name reported when an instance panics outside its rule pipeline.
pub const INSTANCE_PANIC: &str = "instance";

/// Tick one instance, turning a panic into a faulted report.
fn tick_guarded(instance: &mut dyn Instance, bulletin: &Bulletin, now_ms: u64) -> TickReport {
    match catch_unwind(AssertUnwindSafe(|| instance.tick(bulletin, now_ms))) {
        Ok(report) => report,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!(instance = %instance.name(), %message, "instance tick panicked");
            TickReport {
                tick_id: instance.tick_id(),
                faults: vec![RuleFault::Panicked {
                    rule: INSTANCE_PANIC.to_string(),
                    message,
                }],
            }
        }
    }
}

/// The driver: a set of instances, their shared bulletin and a tick counter.
pub struct TickLoop {
    tick_id: u64,
    config: TickConfig,
    instances: Vec<Box<dyn Instance>>,
    bulletin: Arc<Bulletin>,
}

impl std::fmt::Debug for TickLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickLoop")
            .field("tick_id", &self.tick_id)
            .field("config", &self.config)
            .field("instances", &self.names())
            .finish_non_exhaustive()
    }
}

impl TickLoop {
    /// Create an empty tick loop with the given configuration.
    #[must_use]
    pub fn new(config: TickConfig) -> Self {
        Self {
            tick_id: 0,
            config,
            instances: Vec::new(),
            bulletin: Arc::new(Bulletin::new()),
        }
    }

    /// Add an instance and post its initial cross-system payloads.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::DuplicateInstance`] if the name is taken.
    pub fn add(&mut self, instance: impl Instance + 'static) -> Result<Uuid, DriverError> {
        if self.instance(instance.name()).is_some() {
            return Err(DriverError::DuplicateInstance(instance.name().to_string()));
        }
        let id = instance.id();
        instance.publish(&self.bulletin);
        info!(instance = %instance.name(), %id, "instance added");
        self.instances.push(Box::new(instance));
        Ok(id)
    }

    /// Remove an instance and everything it posted.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::UnknownInstance`] if no such instance exists.
    pub fn remove(&mut self, name: &str) -> Result<Box<dyn Instance>, DriverError> {
        let index = self
            .instances
            .iter()
            .position(|i| i.name() == name)
            .ok_or_else(|| DriverError::UnknownInstance(name.to_string()))?;
        self.bulletin.retract(name);
        info!(instance = name, "instance removed");
        Ok(self.instances.remove(index))
    }

    #[must_use]
    pub fn instance(&self, name: &str) -> Option<&dyn Instance> {
        self.instances.iter().find(|i| i.name() == name).map(|i| &**i)
    }

    /// Mutable access to an instance, e.g. to apply knob updates between ticks.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::UnknownInstance`] if no such instance exists.
    pub fn instance_mut(&mut self, name: &str) -> Result<&mut (dyn Instance + 'static), DriverError> {
        self.instances
            .iter_mut()
            .find(|i| i.name() == name)
            .map(|i| &mut **i)
            .ok_or_else(|| DriverError::UnknownInstance(name.to_string()))
    }

    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.instances.iter().map(|i| i.name()).collect()
    }

    /// Returns the current tick counter.
    #[must_use]
    pub fn tick_id(&self) -> u64 {
        self.tick_id
    }

    #[must_use]
    pub fn config(&self) -> &TickConfig {
        &self.config
    }

    #[must_use]
    pub fn bulletin(&self) -> &Bulletin {
        &self.bulletin
    }

    /// Logical timestamp of the next tick, derived from the tick counter so
    /// runs are reproducible.
    fn next_now_ms(&self) -> u64 {
        self.config.timestamp_ms(self.tick_id + 1)
    }

    fn finish_tick(&mut self, summary: &TickSummary) {
        for instance in &self.instances {
            instance.publish(&self.bulletin);
        }
        self.tick_id += 1;

        let faults: usize = summary.values().map(|r| r.faults.len()).sum();
        if faults > 0 {
            warn!(tick_id = self.tick_id, faults, "tick completed with rule faults");
        }
        debug!(tick_id = self.tick_id, instances = summary.len(), "tick complete");
    }

    /// Advance every instance once, one after another.
    pub fn tick(&mut self) -> TickSummary {
        let now_ms = self.next_now_ms();
        let mut summary = TickSummary::new();
        for instance in &mut self.instances {
            let report = tick_guarded(&mut **instance, &self.bulletin, now_ms);
            summary.insert(instance.name().to_string(), report);
        }
        self.finish_tick(&summary);
        summary
    }

    /// Advance every instance once, concurrently on the blocking pool.
    ///
    /// Produces the same states as [`TickLoop::tick`].
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Worker`] if a worker task is cancelled before
    /// it completes. Its instance is dropped from the loop; the tick still
    /// completes for the others.
    pub async fn tick_parallel(&mut self) -> Result<TickSummary, DriverError> {
        let now_ms = self.next_now_ms();
        let mut workers = JoinSet::new();
        for (index, mut instance) in std::mem::take(&mut self.instances).into_iter().enumerate() {
            let bulletin = Arc::clone(&self.bulletin);
            workers.spawn_blocking(move || {
                let report = tick_guarded(&mut *instance, &bulletin, now_ms);
                (index, instance, report)
            });
        }

        let mut finished = Vec::with_capacity(workers.len());
        let mut failure = None;
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(done) => finished.push(done),
                Err(e) => {
                    warn!(tick_id = self.tick_id + 1, error = %e, "tick worker failed");
                    failure = Some(DriverError::Worker(e.to_string()));
                }
            }
        }
        finished.sort_by_key(|(index, _, _)| *index);

        let mut summary = TickSummary::new();
        for (_, instance, report) in finished {
            summary.insert(instance.name().to_string(), report);
            self.instances.push(instance);
        }
        self.finish_tick(&summary);
        match failure {
            Some(e) => Err(e),
            None => Ok(summary),
        }
    }

    fn pace(&self, start: Instant) -> Option<Duration> {
        let period = self.config.period();
        let elapsed = start.elapsed();
        if elapsed < period {
            Some(period - elapsed)
        } else {
            if !period.is_zero() {
                warn!(
                    tick_id = self.tick_id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    budget_ms = period.as_millis() as u64,
                    "tick exceeded time budget"
                );
            }
            None
        }
    }

    /// Run the tick loop for the configured number of ticks, or indefinitely.
    ///
    /// This is a blocking loop; see [`TickLoop::run_parallel`] for the async
    /// variant.
    pub fn run(&mut self) {
        info!(
            tick_rate = self.config.tick_rate,
            max_ticks = self.config.max_ticks,
            instances = self.instances.len(),
            "starting tick loop"
        );

        let mut tick_count = 0u64;
        loop {
            let start = Instant::now();
            self.tick();

            tick_count += 1;
            if self.config.is_done(tick_count) {
                info!(ticks = tick_count, "tick loop complete");
                break;
            }
            if let Some(rest) = self.pace(start) {
                std::thread::sleep(rest);
            }
        }
    }

    /// Run to completion from synchronous code.
    ///
    /// The parallel mode gets its own multi-threaded runtime; the sequential
    /// mode runs on the calling thread. Must not be called from async code.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Runtime`] if the runtime cannot be built, or
    /// the first worker failure of a parallel run.
    pub fn run_blocking(&mut self, parallel: bool) -> Result<(), DriverError> {
        if !parallel {
            self.run();
            return Ok(());
        }
        let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
        runtime.block_on(self.run_parallel())
    }

    /// Run the tick loop with instances advanced in parallel.
    ///
    /// # Errors
    ///
    /// Stops at the first tick whose workers fail.
    pub async fn run_parallel(&mut self) -> Result<(), DriverError> {
        info!(
            tick_rate = self.config.tick_rate,
            max_ticks = self.config.max_ticks,
            instances = self.instances.len(),
            "starting parallel tick loop"
        );

        let mut tick_count = 0u64;
        loop {
            let start = Instant::now();
            self.tick_parallel().await?;

            tick_count += 1;
            if self.config.is_done(tick_count) {
                info!(ticks = tick_count, "tick loop complete");
                return Ok(());
            }
            if let Some(rest) = self.pace(start) {
                tokio::time::sleep(rest).await;
            }
        }
    }
}
