//! Provider performance calculator.
//!
//! Five sub-scores per period:
//!   - Engagement:  points per delivered package.
//!   - Rating:      whole stars of the average rating, plus a confidence
//!                  bonus per received rating (capped).
//!   - Completion:  completed / total bookings, as a percentage.
//!   - Reliability: 100 minus the provider-cancelled percentage; full
//!                  marks when there were no bookings at all.
//!   - Earning:     points per revenue unit.
//!
//! The rating sub-score uses the integer part of the average. A 4.9
//! average earns the same star credit as 4.0.

use crate::{
    calculator::{percent_of, reliability, Breakdown, PointCalculator, SubScore},
    config::ProviderScoring,
    error::{ScoringError, ScoringResult},
    types::{Period, SubjectKind},
};
use serde::{Deserialize, Serialize};

pub const MAX_AVG_RATING: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderCounters {
    pub packages_delivered:             u32,
    pub avg_rating:                     f64,
    pub ratings_count:                  u32,
    pub bookings_total:                 u32,
    pub bookings_completed:             u32,
    pub bookings_cancelled_by_provider: u32,
    pub revenue:                        f64,
}

pub struct PerformanceCalculator {
    config: ProviderScoring,
}

impl PerformanceCalculator {
    pub fn new(config: ProviderScoring) -> Self {
        Self { config }
    }
}

impl PointCalculator for PerformanceCalculator {
    type Counters = ProviderCounters;

    fn kind(&self) -> SubjectKind {
        SubjectKind::Provider
    }

    fn name(&self) -> &'static str {
        "performance"
    }

    fn validate(
        &self,
        subject_id: &str,
        period:     Period,
        counters:   &ProviderCounters,
    ) -> ScoringResult<()> {
        let invalid = |counter, value| ScoringError::InvalidCounter {
            subject_id: subject_id.to_string(),
            period,
            counter,
            value,
        };
        let rating = counters.avg_rating;
        if !rating.is_finite() || !(0.0..=MAX_AVG_RATING).contains(&rating) {
            return Err(invalid("avg_rating", rating));
        }
        if !counters.revenue.is_finite() || counters.revenue < 0.0 {
            return Err(invalid("revenue", counters.revenue));
        }
        Ok(())
    }

    fn breakdown(&self, c: &ProviderCounters) -> Breakdown {
        let cfg = &self.config;
        let w = &cfg.weights;

        let engagement = c.packages_delivered as i64 * cfg.points_per_package;

        let stars = c.avg_rating.trunc() as i64;
        let confidence = (c.ratings_count as i64 * cfg.points_per_rating).min(cfg.rating_count_cap);
        let rating = stars * cfg.points_per_star + confidence;

        let completion = percent_of(c.bookings_completed, c.bookings_total);
        let reliable = reliability(c.bookings_cancelled_by_provider, c.bookings_total);

        let earning = (c.revenue * cfg.points_per_revenue_unit / cfg.revenue_unit).trunc() as i64;

        Breakdown::from_sub_scores(vec![
            SubScore { name: "engagement",  value: engagement, weight: w.engagement },
            SubScore { name: "rating",      value: rating,     weight: w.rating },
            SubScore { name: "completion",  value: completion, weight: w.completion },
            SubScore { name: "reliability", value: reliable,   weight: w.reliability },
            SubScore { name: "earning",     value: earning,    weight: w.earning },
        ])
    }
}
