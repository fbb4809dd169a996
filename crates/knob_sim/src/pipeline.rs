//! The ordered rule pipeline.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use tracing::warn;

use crate::context::TickContext;
use crate::rule::{Rule, RuleFault};
use crate::state::SimState;

/// An ordered list of rules, run front to back once per tick.
pub struct Pipeline<S, G> {
    rules: Vec<Box<dyn Rule<S, G>>>,
}

impl<S, G> std::fmt::Debug for Pipeline<S, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline").field("rules", &self.names()).finish()
    }
}

impl<S, G> Default for Pipeline<S, G> {
    fn default() -> Self {
        Self { rules: Vec::new() }
    }
}

impl<S: SimState, G> Pipeline<S, G> {
    /// Create an empty pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule, returning the pipeline.
    #[must_use]
    pub fn rule(mut self, rule: impl Rule<S, G> + 'static) -> Self {
        self.push(rule);
        self
    }

    /// Append a rule.
    pub fn push(&mut self, rule: impl Rule<S, G> + 'static) {
        self.rules.push(Box::new(rule));
    }

    /// Compute the next state from `state` without touching it.
    ///
    /// Each rule runs against a working copy. When a rule errors, panics or
    /// leaves the copy failing [`SimState::check`], the copy is restored to
    /// its value before that rule and a [`RuleFault`] is recorded.
    #[must_use]
    pub fn advance(&self, state: &S, ctx: &TickContext<'_, G>) -> (S, Vec<RuleFault>) {
        let mut working = state.clone();
        let mut faults = Vec::new();

        for rule in &self.rules {
            let before = working.clone();
            let outcome = catch_unwind(AssertUnwindSafe(|| rule.apply(&mut working, ctx)));
            let fault = match outcome {
                Ok(Ok(())) => working.check().err().map(|source| RuleFault::Invalid {
                    rule: rule.name().to_string(),
                    source,
                }),
                Ok(Err(source)) => Some(RuleFault::Failed {
                    rule: rule.name().to_string(),
                    source,
                }),
                Err(payload) => Some(RuleFault::Panicked {
                    rule: rule.name().to_string(),
                    message: panic_message(payload.as_ref()),
                }),
            };
            if let Some(fault) = fault {
                warn!(tick_id = ctx.tick_id, rule = rule.name(), %fault, "rule rolled back");
                working = before;
                faults.push(fault);
            }
        }

        (working, faults)
    }
}

impl<S, G> Pipeline<S, G> {
    /// Returns the rule names in execution order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Text of a caught panic payload.
#[must_use]
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
