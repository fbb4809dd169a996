//! Update requests accepted by [`Registry::update`](crate::Registry::update).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::parameter::ParamValue;

/// Fixed delta applied by [`Directive::Increase`] and [`Directive::Decrease`].
pub const DIRECTIVE_STEP: f64 = 0.1;

/// A semantic instruction from the closed directive vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Directive {
    /// Add [`DIRECTIVE_STEP`] to a scalar.
    Increase,
    /// Subtract [`DIRECTIVE_STEP`] from a scalar.
    Decrease,
    /// Restore the declared default (any kind).
    Reset,
}

impl Directive {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Increase => "increase",
            Self::Decrease => "decrease",
            Self::Reset => "reset",
        }
    }
}

/// A word outside the directive vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown directive '{0}' (expected increase, decrease or reset)")]
pub struct UnknownDirective(pub String);

impl FromStr for Directive {
    type Err = UnknownDirective;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "increase" => Ok(Self::Increase),
            "decrease" => Ok(Self::Decrease),
            "reset" => Ok(Self::Reset),
            _ => Err(UnknownDirective(s.to_string())),
        }
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One requested write to one parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateRequest {
    /// Replace the value (structured values merge by sub-weight name).
    Absolute(ParamValue),
    /// Add a signed delta to a scalar's current value.
    Relative(f64),
    Directive(Directive),
}

impl From<f64> for UpdateRequest {
    fn from(v: f64) -> Self {
        Self::Absolute(ParamValue::Scalar(v))
    }
}

impl From<Directive> for UpdateRequest {
    fn from(d: Directive) -> Self {
        Self::Directive(d)
    }
}
