//! # knob_app: driver binary
//!
//! Runs the coupled military and treasury instances for a fixed number of
//! ticks, then prints every instance's channel payloads as JSON.
//!
//! ## Startup Sequence
//!
//! 1. Build the instances and wire their cross-system adapters.
//! 2. Apply the optional JSON file of initial knob updates.
//! 3. Enter the fixed-timestep tick loop (sequential or parallel).
//! 4. Optionally write a MessagePack snapshot of each instance.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::{Map, Value};
use tracing::info;
use tracing_subscriber::EnvFilter;

use knob_app::{AppConfig, InitialKnobs, TickConfig, wiring};

#[derive(Parser)]
#[command(name = "knob_app", about = "Drive knob-controlled simulation subsystems")]
struct Args {
    /// Target ticks per second
    #[arg(short = 'r', long, default_value_t = 10.0)]
    tick_rate: f64,

    /// Number of ticks to run (0 = unlimited)
    #[arg(short, long, default_value_t = 20)]
    ticks: u64,

    /// Advance instances concurrently
    #[arg(short, long)]
    parallel: bool,

    /// JSON file of initial knob updates keyed by instance name
    #[arg(short, long)]
    knobs: Option<PathBuf>,

    /// Directory to write `<instance>.msgpack` snapshots into after the run
    #[arg(short, long)]
    export_dir: Option<PathBuf>,
}

impl Args {
    fn app_config(&self) -> Result<AppConfig> {
        let knobs = match &self.knobs {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading knob file {}", path.display()))?;
                InitialKnobs::from_json(&text).with_context(|| format!("parsing knob file {}", path.display()))?
            }
            None => InitialKnobs::new(),
        };
        Ok(AppConfig::default()
            .with_tick(
                TickConfig::default()
                    .with_tick_rate(self.tick_rate)
                    .with_max_ticks(self.ticks),
            )
            .with_parallel(self.parallel)
            .with_knobs(knobs))
    }
}

fn main() -> Result<()> {
    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("knob_app=info".parse()?))
        .init();

    let args = Args::parse();
    let config = args.app_config()?;
    info!(
        tick_rate = config.tick.tick_rate,
        max_ticks = config.tick.max_ticks,
        parallel = config.parallel,
        "knob driver starting"
    );

    let mut tick_loop = wiring::coupled(config.tick.clone())?;
    config.knobs.apply(&mut tick_loop)?;

    tick_loop.run_blocking(config.parallel)?;

    let mut report = Map::new();
    for name in tick_loop.names() {
        if let Some(instance) = tick_loop.instance(name) {
            report.insert(name.to_string(), instance.project_all().to_value());
        }
    }
    println!("{}", serde_json::to_string_pretty(&Value::Object(report))?);

    if let Some(dir) = &args.export_dir {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        for name in tick_loop.names() {
            let Some(instance) = tick_loop.instance(name) else {
                continue;
            };
            let path = dir.join(format!("{name}.msgpack"));
            std::fs::write(&path, instance.export_bytes()?)
                .with_context(|| format!("writing snapshot {}", path.display()))?;
            info!(instance = name, path = %path.display(), "snapshot written");
        }
    }

    info!(tick_id = tick_loop.tick_id(), "knob driver shut down");
    Ok(())
}
