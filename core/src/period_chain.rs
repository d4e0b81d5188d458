//! Period-chain resolver: sources the carry-over tier.
//!
//! RULE: A subject's prior tier is the tier of the calendar month
//! immediately before the one being scored. Gaps are not bridged: a
//! missing month means no history, and no history means tier 0.
//!
//! The chain is filled in as the engine finalizes each period, so a
//! lookup only ever sees tiers that are already final.

use crate::types::{Period, SubjectId, TierId};
use std::collections::{BTreeMap, HashMap};

/// Tier assumed when the previous month has no record.
pub const NO_HISTORY_TIER: TierId = 0;

/// Where a prior tier came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierSource {
    /// Finalized earlier in this run.
    Derived,
    /// Seeded from an earlier run.
    CarryIn,
}

#[derive(Debug, Default)]
pub struct PeriodChain {
    tiers: HashMap<SubjectId, BTreeMap<Period, (TierId, TierSource)>>,
}

impl PeriodChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with tiers finalized by an earlier run. Entries are stored
    /// as-is; an out-of-table tier surfaces only when its floor is needed.
    pub fn with_history<I>(history: I) -> Self
    where
        I: IntoIterator<Item = (SubjectId, Period, TierId)>,
    {
        let mut chain = Self::new();
        for (subject_id, period, tier) in history {
            chain
                .tiers
                .entry(subject_id)
                .or_default()
                .insert(period, (tier, TierSource::CarryIn));
        }
        chain
    }

    /// Tier of `subject_id` in the month before `period`, or
    /// NO_HISTORY_TIER when that month has no record.
    pub fn prior_tier(&self, subject_id: &str, period: Period) -> TierId {
        self.lookup(subject_id, period.previous())
            .map(|(tier, _)| tier)
            .unwrap_or(NO_HISTORY_TIER)
    }

    pub fn lookup(&self, subject_id: &str, period: Period) -> Option<(TierId, TierSource)> {
        self.tiers
            .get(subject_id)
            .and_then(|by_period| by_period.get(&period))
            .copied()
    }

    /// Record a tier finalized in this run. Replaces any carried-in
    /// tier for the same month.
    pub fn commit(&mut self, subject_id: &str, period: Period, tier: TierId) {
        let previous = self
            .tiers
            .entry(subject_id.to_string())
            .or_default()
            .insert(period, (tier, TierSource::Derived));
        if let Some((old, TierSource::CarryIn)) = previous {
            log::debug!("{subject_id} {period}: derived tier {tier} replaces carried-in tier {old}");
        }
    }

    pub fn subject_count(&self) -> usize {
        self.tiers.len()
    }
}
