//! Point calculator trait and shared sub-score helpers.
//!
//! RULE: Every subject kind implements PointCalculator.
//! A calculator sees exactly one record's counters and the floor of the
//! subject's prior tier. It never sees same-period peers.

use crate::{
    error::ScoringResult,
    types::{Period, Point, SubjectKind},
};
use serde::Serialize;

/// One weighted component of a point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubScore {
    pub name:   &'static str,
    pub value:  i64,
    pub weight: f64,
}

/// How a weighted sum was reached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Breakdown {
    pub sub_scores:   Vec<SubScore>,
    pub weighted_sum: i64,
}

impl Breakdown {
    /// Combine sub-scores in declaration order and truncate toward zero.
    pub fn from_sub_scores(sub_scores: Vec<SubScore>) -> Self {
        let total = sub_scores
            .iter()
            .fold(0.0f64, |acc, s| acc + s.weight * s.value as f64);
        Self {
            weighted_sum: total.trunc() as i64,
            sub_scores,
        }
    }

    pub fn get(&self, name: &str) -> Option<i64> {
        self.sub_scores.iter().find(|s| s.name == name).map(|s| s.value)
    }
}

/// The contract every subject kind must fulfill.
pub trait PointCalculator {
    /// Raw counters for one subject in one period.
    type Counters: Clone + std::fmt::Debug;

    fn kind(&self) -> SubjectKind;

    /// Unique stable name, used in logs and events.
    fn name(&self) -> &'static str;

    /// Reject counters the formulas cannot score (non-finite money,
    /// out-of-range ratings). Called once per record before scoring.
    fn validate(
        &self,
        subject_id: &str,
        period:     Period,
        counters:   &Self::Counters,
    ) -> ScoringResult<()>;

    /// Sub-scores and weighted sum for this period's counters alone.
    fn breakdown(&self, counters: &Self::Counters) -> Breakdown;
}

/// Final point: prior tier floor plus this period's weighted sum,
/// clamped into [0, ceiling].
pub fn carry_over_point(prior_floor: Point, weighted_sum: i64, ceiling: Point) -> Point {
    (prior_floor as i64 + weighted_sum).clamp(0, ceiling as i64) as Point
}

/// `floor(part / total * 100)`, or 0 when there is nothing to divide.
pub(crate) fn percent_of(part: u32, total: u32) -> i64 {
    if total == 0 {
        return 0;
    }
    (part as f64 / total as f64 * 100.0).trunc() as i64
}

/// `floor((1 - cancelled / total) * 100)`, full marks with no activity.
pub(crate) fn reliability(cancelled: u32, total: u32) -> i64 {
    if total == 0 {
        return 100;
    }
    ((1.0 - cancelled as f64 / total as f64) * 100.0).trunc() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_bounds_both_ends() {
        assert_eq!(carry_over_point(85, 40, 100), 100);
        assert_eq!(carry_over_point(0, -30, 100), 0);
        assert_eq!(carry_over_point(70, 5, 100), 75);
    }

    #[test]
    fn reliability_without_activity_is_full() {
        assert_eq!(reliability(0, 0), 100);
        assert_eq!(reliability(1, 8), 87);
        // More cancellations than bookings goes negative; the clamp handles it.
        assert_eq!(reliability(3, 2), -50);
    }

    #[test]
    fn percent_truncates_toward_zero() {
        assert_eq!(percent_of(7, 8), 87);
        assert_eq!(percent_of(2, 3), 66);
        assert_eq!(percent_of(5, 0), 0);
    }
}
