//! Verdicts and assessment results.

use serde::Serialize;

use crate::domain::WayId;
use crate::pathfind::{DistanceMode, UnreachableReason};

/// Outcome of a transfer check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Feasible,
    /// Possible, but within the safety buffer.
    Marginal,
    Infeasible,
}

/// The policy tier that produced an assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    SamePlatform = 1,
    Adjoining = 2,
    Connector = 3,
    Fallback = 4,
}

impl Tier {
    pub fn number(self) -> u8 {
        self as u8
    }
}

/// Classify a required time against a window.
///
/// With required time `t`, window `w` and buffer `b`: `t + b <= w` is
/// feasible, `w - b < t <= w + b` is marginal, anything slower is
/// infeasible. A `hard_floor` makes `w < t` infeasible outright. Negative
/// windows are always infeasible.
pub fn classify(required_secs: i64, window_secs: i64, buffer_secs: i64, hard_floor: bool) -> Verdict {
    if window_secs < 0 || (hard_floor && window_secs < required_secs) {
        Verdict::Infeasible
    } else if required_secs + buffer_secs <= window_secs {
        Verdict::Feasible
    } else if required_secs <= window_secs + buffer_secs {
        Verdict::Marginal
    } else {
        Verdict::Infeasible
    }
}

/// Physical distance of the path behind an assessment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PathDistance {
    pub value: f64,
    pub mode: DistanceMode,
}

/// Result of evaluating one transfer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferAssessment {
    pub verdict: Verdict,
    pub tier: Tier,
    /// Path distance; `None` for a same-platform change.
    pub distance: Option<PathDistance>,
    /// Estimated time needed to make the change.
    pub required_secs: i64,
    pub window_secs: i64,
    /// Ways along the path, in walking order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ways: Vec<WayId>,
    /// Why the path search failed, for fallback assessments.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unreachable: Option<UnreachableReason>,
}

impl TransferAssessment {
    pub fn is_infeasible(&self) -> bool {
        self.verdict == Verdict::Infeasible
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands() {
        // t + b <= w
        assert_eq!(classify(150, 180, 30, false), Verdict::Feasible);
        // w - b < t <= w + b
        assert_eq!(classify(151, 180, 30, false), Verdict::Marginal);
        assert_eq!(classify(210, 180, 30, false), Verdict::Marginal);
        assert_eq!(classify(211, 180, 30, false), Verdict::Infeasible);
    }

    #[test]
    fn hard_floor() {
        assert_eq!(classify(120, 180, 30, true), Verdict::Feasible);
        assert_eq!(classify(120, 130, 30, true), Verdict::Marginal);
        assert_eq!(classify(120, 119, 30, true), Verdict::Infeasible);
        assert_eq!(classify(120, 119, 30, false), Verdict::Marginal);
    }

    #[test]
    fn negative_window() {
        assert_eq!(classify(0, -1, 30, false), Verdict::Infeasible);
    }

    #[test]
    fn tier_numbers() {
        assert_eq!(Tier::SamePlatform.number(), 1);
        assert_eq!(Tier::Fallback.number(), 4);
        assert!(Tier::Adjoining < Tier::Connector);
    }
}
