//! End-of-batch statistics: counts and tier distribution.

use crate::{
    engine::BatchOutcome,
    error::ScoringResult,
    tier::TierTable,
    types::{Period, SubjectKind, TierId},
};
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TierCount {
    pub tier:  TierId,
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BatchSummary {
    pub kind:         SubjectKind,
    pub records:      usize,
    pub subjects:     usize,
    pub cohorts:      usize,
    pub rejected:     usize,
    pub first_period: Option<Period>,
    pub last_period:  Option<Period>,
    /// Every tier in the table, highest first, including empty ones.
    pub tiers:        Vec<TierCount>,
}

impl BatchSummary {
    pub fn from_outcome<C>(
        kind:    SubjectKind,
        outcome: &BatchOutcome<C>,
        table:   &TierTable,
    ) -> ScoringResult<Self> {
        let periods: BTreeSet<Period> = outcome.records.iter().map(|r| r.period).collect();
        let subjects: BTreeSet<&str> =
            outcome.records.iter().map(|r| r.subject_id.as_str()).collect();

        let mut tiers = Vec::new();
        for tier in table.tiers().collect::<Vec<_>>().into_iter().rev() {
            tiers.push(TierCount {
                tier,
                label: table.label(kind, tier)?.to_string(),
                count: outcome.records.iter().filter(|r| r.tier == tier).count(),
            });
        }

        Ok(Self {
            kind,
            records: outcome.records.len(),
            subjects: subjects.len(),
            cohorts: periods.len(),
            rejected: outcome.rejections.len(),
            first_period: periods.first().copied(),
            last_period: periods.last().copied(),
            tiers,
        })
    }
}
