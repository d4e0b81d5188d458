//! Period records: the engine's input and output shapes.

use crate::{
    calculator::Breakdown,
    ranking::Ranked,
    types::{Period, Point, Rank, SubjectId, TierId},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Raw counters for one subject in one period, as handed over by a loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputRecord<C> {
    /// External row id, carried through untouched.
    pub record_id:  Option<String>,
    pub subject_id: SubjectId,
    pub period:     Period,
    pub counters:   C,
}

impl<C> InputRecord<C> {
    pub fn new(subject_id: impl Into<SubjectId>, period: Period, counters: C) -> Self {
        Self {
            record_id: None,
            subject_id: subject_id.into(),
            period,
            counters,
        }
    }
}

/// Each subject's earliest period in `input`. Carry-in history is cut
/// per subject at this period, so a subject that joins the input late
/// still picks up its stored prior month.
pub fn first_periods<C>(input: &[InputRecord<C>]) -> HashMap<SubjectId, Period> {
    let mut first: HashMap<SubjectId, Period> = HashMap::new();
    for rec in input {
        first
            .entry(rec.subject_id.clone())
            .and_modify(|p| *p = (*p).min(rec.period))
            .or_insert(rec.period);
    }
    first
}

/// A record after scoring. Every field past `counters` is derived.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredRecord<C> {
    pub record_id:  Option<String>,
    pub subject_id: SubjectId,
    pub period:     Period,
    pub counters:   C,
    /// Tier of the previous month, the carry-over base.
    pub prior_tier: TierId,
    pub breakdown:  Breakdown,
    pub point:      Point,
    pub tier:       TierId,
    /// Zero until the cohort is ranked.
    pub rank:       Rank,
}

impl<C> Ranked for ScoredRecord<C> {
    fn point(&self) -> Point {
        self.point
    }

    fn set_rank(&mut self, rank: Rank) {
        self.rank = rank;
    }
}
