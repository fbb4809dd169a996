//! Threshold categorization.
//!
//! [`CutPoints`] maps a continuous value onto a small ordered set of
//! categories. Cut points are listed in descending order and compared with a
//! strict `>`; anything not above the lowest cut (including non-finite
//! input) falls to the floor category. The mapping is therefore total, and
//! it is monotonic as long as higher cuts name higher categories.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Fixed cut points for categorizing a continuous value.
#[derive(Debug, Clone, Copy)]
pub struct CutPoints<'a, C> {
    /// `(threshold, category)` pairs in descending threshold order.
    cuts: &'a [(f64, C)],
    floor: C,
}

impl<'a, C: Copy> CutPoints<'a, C> {
    /// Create cut points. `cuts` must be sorted by descending threshold.
    #[must_use]
    pub const fn new(cuts: &'a [(f64, C)], floor: C) -> Self {
        Self { cuts, floor }
    }

    /// Returns the category for `value`.
    #[must_use]
    pub fn categorize(&self, value: f64) -> C {
        debug_assert!(self.cuts.windows(2).all(|w| w[0].0 >= w[1].0));
        if !value.is_finite() {
            return self.floor;
        }
        self.cuts
            .iter()
            .find(|(threshold, _)| value > *threshold)
            .map_or(self.floor, |(_, category)| *category)
    }
}

/// Ordered severity categories, from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Minimal,
    Low,
    Moderate,
    High,
    Critical,
}

/// `> 0.8 → critical`, `> 0.6 → high`, `> 0.4 → moderate`, `> 0.2 → low`.
const SEVERITY_CUTS: CutPoints<'static, Severity> = CutPoints::new(
    &[
        (0.8, Severity::Critical),
        (0.6, Severity::High),
        (0.4, Severity::Moderate),
        (0.2, Severity::Low),
    ],
    Severity::Minimal,
);

impl Severity {
    /// Every category, least severe first.
    pub const ALL: [Severity; 5] = [
        Severity::Minimal,
        Severity::Low,
        Severity::Moderate,
        Severity::High,
        Severity::Critical,
    ];

    /// Categorize a `[0, 1]` level.
    #[must_use]
    pub fn from_level(level: f64) -> Self {
        SEVERITY_CUTS.categorize(level)
    }

    /// Returns the position in [`Severity::ALL`].
    #[must_use]
    pub fn rank(self) -> u8 {
        self as u8
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Minimal => "minimal",
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
