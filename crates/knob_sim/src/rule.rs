//! Update rules and rule faults.

use crate::context::TickContext;
use crate::state::InvalidField;

/// An error returned by a rule that could not compute its fields.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct RuleError(pub String);

impl RuleError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// A fault contained at a rule boundary during a tick.
///
/// The rule's writes were rolled back; every other rule still ran.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuleFault {
    /// The rule returned an error.
    #[error("rule '{rule}' failed: {source}")]
    Failed {
        rule: String,
        #[source]
        source: RuleError,
    },

    /// The rule panicked.
    #[error("rule '{rule}' panicked: {message}")]
    Panicked { rule: String, message: String },

    /// The rule left the state out of domain.
    #[error("rule '{rule}' produced an invalid state: {source}")]
    Invalid {
        rule: String,
        #[source]
        source: InvalidField,
    },
}

impl RuleFault {
    /// Returns the name of the rule that faulted.
    #[must_use]
    pub fn rule(&self) -> &str {
        match self {
            Self::Failed { rule, .. } | Self::Panicked { rule, .. } | Self::Invalid { rule, .. } => rule,
        }
    }
}

/// One step of a subsystem's tick pipeline.
///
/// A rule reads the fields and knobs it needs and writes only the fields it
/// owns. Rules must be deterministic: the same state, snapshot and signals
/// always produce the same writes.
pub trait Rule<S, G>: Send + Sync {
    /// A short, stable name used in logs and fault reports.
    fn name(&self) -> &str;

    /// Apply the rule to `state` in place.
    ///
    /// # Errors
    ///
    /// Returns a [`RuleError`] when the rule cannot compute its fields; the
    /// pipeline then restores the state as it was before this rule.
    fn apply(&self, state: &mut S, ctx: &TickContext<'_, G>) -> Result<(), RuleError>;
}

/// A [`Rule`] backed by a function or closure.
pub struct FnRule<F> {
    name: &'static str,
    f: F,
}

impl<F> FnRule<F> {
    /// Wrap `f` as a rule called `name`.
    #[must_use]
    pub fn new(name: &'static str, f: F) -> Self {
        Self { name, f }
    }
}

impl<F> std::fmt::Debug for FnRule<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnRule").field("name", &self.name).finish()
    }
}

impl<S, G, F> Rule<S, G> for FnRule<F>
where
    F: Fn(&mut S, &TickContext<'_, G>) -> Result<(), RuleError> + Send + Sync,
{
    fn name(&self) -> &str {
        self.name
    }

    fn apply(&self, state: &mut S, ctx: &TickContext<'_, G>) -> Result<(), RuleError> {
        (self.f)(state, ctx)
    }
}
