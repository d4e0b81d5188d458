//! Client potential calculator.
//!
//! Loyalty (requests), value (average spend per request) and
//! reliability (client cancellations). A client with no requests scores
//! zero loyalty and value but full reliability.

use crate::{
    calculator::{reliability, Breakdown, PointCalculator, SubScore},
    config::ClientScoring,
    error::{ScoringError, ScoringResult},
    types::{Period, SubjectKind},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientCounters {
    pub booking_requests:        u32,
    pub spending:                f64,
    pub cancellations_by_client: u32,
}

pub struct PotentialCalculator {
    config: ClientScoring,
}

impl PotentialCalculator {
    pub fn new(config: ClientScoring) -> Self {
        Self { config }
    }
}

impl PointCalculator for PotentialCalculator {
    type Counters = ClientCounters;

    fn kind(&self) -> SubjectKind {
        SubjectKind::Client
    }

    fn name(&self) -> &'static str {
        "potential"
    }

    fn validate(
        &self,
        subject_id: &str,
        period:     Period,
        counters:   &ClientCounters,
    ) -> ScoringResult<()> {
        if !counters.spending.is_finite() || counters.spending < 0.0 {
            return Err(ScoringError::InvalidCounter {
                subject_id: subject_id.to_string(),
                period,
                counter: "spending",
                value: counters.spending,
            });
        }
        Ok(())
    }

    fn breakdown(&self, c: &ClientCounters) -> Breakdown {
        let cfg = &self.config;
        let w = &cfg.weights;

        let loyalty = c.booking_requests as i64 * cfg.points_per_request;

        let avg_spend = if c.booking_requests > 0 {
            c.spending / c.booking_requests as f64
        } else {
            0.0
        };
        let value = (avg_spend * cfg.points_per_spend_unit / cfg.spend_unit).trunc() as i64;

        let reliable = reliability(c.cancellations_by_client, c.booking_requests);

        Breakdown::from_sub_scores(vec![
            SubScore { name: "loyalty",     value: loyalty,  weight: w.loyalty },
            SubScore { name: "value",       value,           weight: w.value },
            SubScore { name: "reliability", value: reliable, weight: w.reliability },
        ])
    }
}
