//! # knob_app
//!
//! The driver for knob-driven subsystems.
//!
//! Each running [`Subsystem`] owns a parameter registry, a deterministic
//! simulator and an output projector. The [`TickLoop`] advances every
//! instance once per tick, sequentially or in parallel, and passes
//! cross-system payloads between them through the [`Bulletin`]. Snapshots
//! of an instance's knobs and state are encoded by [`persist`] for whoever
//! stores them.
//!
//! ## Usage
//!
//! ```rust
//! use knob_app::{TickConfig, wiring};
//!
//! let mut tick_loop = wiring::coupled(TickConfig::default()).unwrap();
//! let summary = tick_loop.tick();
//!
//! assert_eq!(tick_loop.tick_id(), 1);
//! assert!(summary["military"].is_clean());
//! assert!(tick_loop.bulletin().read("treasury", "funding").is_some());
//! ```

pub mod bulletin;
pub mod config;
pub mod error;
pub mod persist;
pub mod subsystem;
pub mod tick;
pub mod wiring;

pub use bulletin::Bulletin;
pub use config::{AppConfig, InitialKnobs};
pub use error::{DriverError, PersistError};
pub use persist::SubsystemSnapshot;
pub use subsystem::{Instance, SignalAdapter, Subsystem};
pub use tick::{TickConfig, TickLoop, TickSummary};
