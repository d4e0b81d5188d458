//! Synthetic counter generation for demos and tests.
//!
//! Produces plausible monthly counters for a population of subjects,
//! each following one activity trajectory. Same seed = same records,
//! record ids included. The engine never calls into this module.

use crate::{
    performance_calculator::{ProviderCounters, MAX_AVG_RATING},
    potential_calculator::ClientCounters,
    record::InputRecord,
    rng::{RngBank, StreamRng, StreamSlot},
    types::Period,
};
use uuid::Builder;

/// Chance that an established subject has no record in a given month.
const GAP_PROBABILITY: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Population {
    pub seed:     u64,
    pub subjects: usize,
    pub months:   usize,
    pub start:    Period,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trajectory {
    HighPerformer,
    SteadyGrowth,
    Average,
    LowActivity,
    /// Joins partway through the span.
    NewSubject,
}

impl Trajectory {
    const ALL: [Trajectory; 5] = [
        Self::HighPerformer,
        Self::SteadyGrowth,
        Self::Average,
        Self::LowActivity,
        Self::NewSubject,
    ];

    fn pick(rng: &mut StreamRng) -> Self {
        Self::ALL[rng.next_u64_below(Self::ALL.len() as u64) as usize]
    }

    /// (starting activity, monthly growth, activity ceiling), all in [0, 1].
    fn profile(&self, rng: &mut StreamRng) -> (f64, f64, f64) {
        match self {
            Self::HighPerformer => (rng.range_f64(0.65, 0.75), rng.range_f64(0.02, 0.04), rng.range_f64(0.90, 0.98)),
            Self::SteadyGrowth  => (rng.range_f64(0.50, 0.60), rng.range_f64(0.015, 0.025), rng.range_f64(0.75, 0.88)),
            Self::Average       => (rng.range_f64(0.40, 0.55), rng.range_f64(0.01, 0.02), rng.range_f64(0.60, 0.75)),
            Self::LowActivity   => (rng.range_f64(0.25, 0.45), rng.range_f64(0.005, 0.015), rng.range_f64(0.45, 0.60)),
            Self::NewSubject    => (rng.range_f64(0.30, 0.50), rng.range_f64(0.02, 0.03), rng.range_f64(0.60, 0.85)),
        }
    }
}

/// Activity level per month for one subject. None = no record that month.
fn activity_path(rng: &mut StreamRng, months: usize) -> Vec<Option<f64>> {
    let trajectory = Trajectory::pick(rng);
    let (mut level, growth, ceiling) = trajectory.profile(rng);
    let first_month = match trajectory {
        Trajectory::NewSubject if months > 1 => {
            let lo = (months / 3) as u64;
            lo as usize + rng.next_u64_below(months as u64 - lo) as usize
        }
        _ => 0,
    };

    let mut path = Vec::with_capacity(months);
    for month in 0..months {
        if month < first_month {
            path.push(None);
            continue;
        }
        if month > first_month && rng.chance(GAP_PROBABILITY) {
            path.push(None);
            continue;
        }
        let jitter = rng.range_f64(-0.05, 0.05);
        path.push(Some((level + jitter).clamp(0.0, 1.0)));
        level = (level + growth).min(ceiling);
    }
    path
}

fn record_id(rng: &mut StreamRng) -> String {
    Builder::from_random_bytes(rng.next_bytes_16())
        .into_uuid()
        .to_string()
}

fn periods(population: &Population) -> Vec<Period> {
    let mut periods = Vec::with_capacity(population.months);
    let mut period = population.start;
    for _ in 0..population.months {
        periods.push(period);
        period = period.next();
    }
    periods
}

pub fn providers(population: &Population) -> Vec<InputRecord<ProviderCounters>> {
    let mut rng = RngBank::new(population.seed).for_slot(StreamSlot::Provider);
    let periods = periods(population);
    let mut records = Vec::new();

    for n in 0..population.subjects {
        let subject_id = format!("prv-{:04}", n + 1);
        let path = activity_path(&mut rng, population.months);
        for (period, activity) in periods.iter().zip(path) {
            let Some(a) = activity else { continue };

            let packages_delivered = rng.range_u32(0, (a * 5.0).round() as u32);
            let bookings_total = rng.range_u32(0, (a * 12.0).round() as u32);
            let bookings_cancelled_by_provider = if bookings_total > 0 && rng.chance(0.3 * (1.0 - a)) {
                rng.range_u32(1, (bookings_total / 3).max(1))
            } else {
                0
            };
            let bookings_completed = bookings_total
                .saturating_sub(bookings_cancelled_by_provider)
                .saturating_sub(rng.range_u32(0, 1));
            let ratings_count = rng.range_u32(0, bookings_completed);
            let avg_rating = if ratings_count > 0 {
                let raw = rng.range_f64(2.5 + 2.0 * a, MAX_AVG_RATING + 0.01).min(MAX_AVG_RATING);
                (raw * 100.0).round() / 100.0
            } else {
                0.0
            };
            let revenue = (bookings_completed as f64 * rng.range_f64(50_000.0, 150_000.0)).round();

            let mut record = InputRecord::new(
                subject_id.clone(),
                *period,
                ProviderCounters {
                    packages_delivered,
                    avg_rating,
                    ratings_count,
                    bookings_total,
                    bookings_completed,
                    bookings_cancelled_by_provider,
                    revenue,
                },
            );
            record.record_id = Some(record_id(&mut rng));
            records.push(record);
        }
    }
    log::debug!("synthesized {} provider records for {} subjects", records.len(), population.subjects);
    records
}

pub fn clients(population: &Population) -> Vec<InputRecord<ClientCounters>> {
    let mut rng = RngBank::new(population.seed).for_slot(StreamSlot::Client);
    let periods = periods(population);
    let mut records = Vec::new();

    for n in 0..population.subjects {
        let subject_id = format!("cli-{:04}", n + 1);
        let path = activity_path(&mut rng, population.months);
        for (period, activity) in periods.iter().zip(path) {
            let Some(a) = activity else { continue };

            let booking_requests = rng.range_u32(0, (a * 8.0).round() as u32);
            let spending = (booking_requests as f64 * rng.range_f64(50_000.0, 400_000.0)).round();
            let cancellations_by_client = if booking_requests > 0 && rng.chance(0.4 * (1.0 - a)) {
                rng.range_u32(1, (booking_requests / 2).max(1))
            } else {
                0
            };

            let mut record = InputRecord::new(
                subject_id.clone(),
                *period,
                ClientCounters {
                    booking_requests,
                    spending,
                    cancellations_by_client,
                },
            );
            record.record_id = Some(record_id(&mut rng));
            records.push(record);
        }
    }
    log::debug!("synthesized {} client records for {} subjects", records.len(), population.subjects);
    records
}
