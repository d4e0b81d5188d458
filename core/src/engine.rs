//! The batch orchestrator: scores every record and ranks each cohort.
//!
//! EXECUTION ORDER (fixed, documented, never reordered):
//!   1. Natural-key check over the whole input snapshot.
//!   2. For each period, oldest first:
//!        a. for each record of that period, in input order:
//!             validate counters → prior tier (period chain) →
//!             tier floor → weighted sum → clamp → tier → commit tier
//!        b. rank the period's cohort.
//!
//! RULES:
//!   - The input snapshot is never mutated; output is a fresh Vec.
//!   - A point depends only on its own counters and the prior month's tier.
//!   - A cohort is ranked only after every point in it is final.
//!   - Same input, same config → identical output, every run.

use crate::{
    calculator::{carry_over_point, PointCalculator},
    config::ScoringConfig,
    error::{ScoringError, ScoringResult},
    event::{ScoringEvent, TierMovement},
    performance_calculator::{PerformanceCalculator, ProviderCounters},
    period_chain::PeriodChain,
    potential_calculator::{ClientCounters, PotentialCalculator},
    ranking::assign_ranks,
    record::{InputRecord, ScoredRecord},
    types::{Period, RunId, SubjectId},
};
use std::collections::{BTreeMap, HashSet};

/// What the engine does when one record cannot be scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Abort the whole batch on the first error.
    #[default]
    FailFast,
    /// Drop the failing subject from the failing period onward and keep
    /// going. Periods already finalized for that subject are kept.
    IsolateSubject,
}

/// A subject dropped under ErrorPolicy::IsolateSubject.
#[derive(Debug)]
pub struct Rejection {
    pub subject_id: SubjectId,
    pub period:     Period,
    pub error:      ScoringError,
}

/// Everything one batch produced.
#[derive(Debug)]
pub struct BatchOutcome<C> {
    /// Periods ascending; within a period, by rank.
    pub records:    Vec<ScoredRecord<C>>,
    pub rejections: Vec<Rejection>,
    pub events:     Vec<ScoringEvent>,
}

impl<C> BatchOutcome<C> {
    /// Records of one period cohort, in rank order.
    pub fn cohort(&self, period: Period) -> impl Iterator<Item = &ScoredRecord<C>> {
        self.records.iter().filter(move |r| r.period == period)
    }

    pub fn find(&self, subject_id: &str, period: Period) -> Option<&ScoredRecord<C>> {
        self.records
            .iter()
            .find(|r| r.subject_id == subject_id && r.period == period)
    }
}

pub struct ScoringEngine {
    pub run_id: RunId,
    config:     ScoringConfig,
    policy:     ErrorPolicy,
}

impl ScoringEngine {
    /// Build an engine. The config is validated once, here.
    pub fn new(run_id: RunId, config: ScoringConfig) -> ScoringResult<Self> {
        config.validate()?;
        Ok(Self {
            run_id,
            config,
            policy: ErrorPolicy::default(),
        })
    }

    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    pub fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    /// Score provider performance for every record in `input`.
    pub fn score_providers(
        &self,
        input: &[InputRecord<ProviderCounters>],
        chain: PeriodChain,
    ) -> ScoringResult<BatchOutcome<ProviderCounters>> {
        let calculator = PerformanceCalculator::new(self.config.provider.clone());
        self.run(&calculator, input, chain)
    }

    /// Score client potential for every record in `input`.
    pub fn score_clients(
        &self,
        input: &[InputRecord<ClientCounters>],
        chain: PeriodChain,
    ) -> ScoringResult<BatchOutcome<ClientCounters>> {
        let calculator = PotentialCalculator::new(self.config.client.clone());
        self.run(&calculator, input, chain)
    }

    /// Run one batch with any calculator. `chain` may carry tiers from
    /// an earlier run; pass PeriodChain::new() to start from scratch.
    pub fn run<K: PointCalculator>(
        &self,
        calculator: &K,
        input:      &[InputRecord<K::Counters>],
        mut chain:  PeriodChain,
    ) -> ScoringResult<BatchOutcome<K::Counters>> {
        let kind = calculator.kind();
        let mut events = vec![ScoringEvent::RunStarted {
            run_id:  self.run_id.clone(),
            kind,
            records: input.len(),
        }];
        let mut rejections: Vec<Rejection> = Vec::new();
        let mut rejected: HashSet<SubjectId> = HashSet::new();

        // 1. Natural-key check.
        let mut seen: HashSet<(&str, Period)> = HashSet::new();
        for rec in input {
            if seen.insert((rec.subject_id.as_str(), rec.period)) {
                continue;
            }
            let error = ScoringError::DuplicateKey {
                subject_id: rec.subject_id.clone(),
                period:     rec.period,
            };
            match self.policy {
                ErrorPolicy::FailFast => return Err(error),
                ErrorPolicy::IsolateSubject => {
                    if rejected.insert(rec.subject_id.clone()) {
                        self.reject(&mut events, &mut rejections, &rec.subject_id, rec.period, error);
                    }
                }
            }
        }

        // Group by period, oldest first, keeping input order inside a period.
        let mut by_period: BTreeMap<Period, Vec<&InputRecord<K::Counters>>> = BTreeMap::new();
        for rec in input {
            by_period.entry(rec.period).or_default().push(rec);
        }

        // 2. Score, then rank, one period at a time.
        let mut records = Vec::with_capacity(input.len());
        for (period, cohort_input) in by_period {
            let mut cohort: Vec<ScoredRecord<K::Counters>> = Vec::with_capacity(cohort_input.len());

            for rec in cohort_input {
                if rejected.contains(&rec.subject_id) {
                    continue;
                }
                match self.score_one(calculator, &chain, rec) {
                    Ok(scored) => {
                        chain.commit(&scored.subject_id, period, scored.tier);
                        events.push(ScoringEvent::SubjectScored {
                            subject_id: scored.subject_id.clone(),
                            period,
                            prior_tier: scored.prior_tier,
                            point:      scored.point,
                            tier:       scored.tier,
                            movement:   TierMovement::between(scored.prior_tier, scored.tier),
                        });
                        cohort.push(scored);
                    }
                    Err(error) => match self.policy {
                        ErrorPolicy::FailFast => {
                            log::error!(
                                "{} {} {period}: {error}",
                                calculator.name(), rec.subject_id
                            );
                            return Err(error);
                        }
                        ErrorPolicy::IsolateSubject => {
                            rejected.insert(rec.subject_id.clone());
                            self.reject(&mut events, &mut rejections, &rec.subject_id, period, error);
                        }
                    },
                }
            }

            if cohort.is_empty() {
                continue;
            }
            assign_ranks(&mut cohort);
            events.push(ScoringEvent::CohortRanked {
                period,
                size:      cohort.len(),
                top_point: cohort[0].point,
            });
            log::debug!(
                "{} {period}: ranked {} subjects, top point {}",
                calculator.name(), cohort.len(), cohort[0].point
            );
            records.extend(cohort);
        }

        events.push(ScoringEvent::RunCompleted {
            run_id:   self.run_id.clone(),
            kind,
            scored:   records.len(),
            rejected: rejections.len(),
        });
        log::info!(
            "{} run {}: scored {} records, rejected {} subjects",
            calculator.name(), self.run_id, records.len(), rejections.len()
        );

        Ok(BatchOutcome { records, rejections, events })
    }

    /// Score one record against the chain as it stands right now.
    fn score_one<K: PointCalculator>(
        &self,
        calculator: &K,
        chain:      &PeriodChain,
        rec:        &InputRecord<K::Counters>,
    ) -> ScoringResult<ScoredRecord<K::Counters>> {
        calculator.validate(&rec.subject_id, rec.period, &rec.counters)?;

        let tiers = &self.config.tiers;
        let prior_tier = chain.prior_tier(&rec.subject_id, rec.period);
        let floor = tiers.floor_of(prior_tier)?;

        let breakdown = calculator.breakdown(&rec.counters);
        let point = carry_over_point(floor, breakdown.weighted_sum, self.config.point_ceiling);
        let tier = tiers.tier_of(point);

        Ok(ScoredRecord {
            record_id:  rec.record_id.clone(),
            subject_id: rec.subject_id.clone(),
            period:     rec.period,
            counters:   rec.counters.clone(),
            prior_tier,
            breakdown,
            point,
            tier,
            rank: 0,
        })
    }

    fn reject(
        &self,
        events:     &mut Vec<ScoringEvent>,
        rejections: &mut Vec<Rejection>,
        subject_id: &str,
        period:     Period,
        error:      ScoringError,
    ) {
        log::warn!("rejecting subject {subject_id} from {period}: {error}");
        events.push(ScoringEvent::SubjectRejected {
            subject_id: subject_id.to_string(),
            period,
            reason:     error.to_string(),
        });
        rejections.push(Rejection {
            subject_id: subject_id.to_string(),
            period,
            error,
        });
    }
}
