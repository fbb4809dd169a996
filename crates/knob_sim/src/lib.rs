//! # knob_sim
//!
//! Deterministic state simulation for knob-driven subsystems.
//!
//! A [`Simulator`] owns one subsystem's state record and advances it one
//! tick at a time as a pure function of (previous state, parameter
//! [`Snapshot`](knob_registry::Snapshot), external signals). The transition
//! is an ordered [`Pipeline`] of named [`Rule`]s; each rule reads only what
//! it needs and writes only the fields it owns, so rules can be tested on
//! their own.
//!
//! Faults are contained at the rule boundary. A rule that returns an error,
//! panics, or leaves the state out of domain (see [`SimState::check`]) is
//! rolled back and reported as a [`RuleFault`]; the tick still completes.
//!
//! This crate provides:
//!
//! - [`rules`]: pure helpers: smoothing, composites, reallocation, clamping.
//! - [`Severity`] / [`CutPoints`]: total, monotonic threshold categorization.
//! - [`Rule`] / [`FnRule`] / [`Pipeline`]: the ordered update rules.
//! - [`Simulator`] / [`TickContext`] / [`TickReport`]: the tick itself.

pub mod context;
pub mod pipeline;
pub mod rule;
pub mod rules;
pub mod severity;
pub mod simulator;
pub mod state;

pub use context::TickContext;
pub use pipeline::{Pipeline, panic_message};
pub use rule::{FnRule, Rule, RuleError, RuleFault};
pub use severity::{CutPoints, Severity};
pub use simulator::{Simulator, TickReport};
pub use state::{InvalidField, SimState};
