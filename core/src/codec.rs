//! JSON snapshot codec: the loader and writer around the engine.
//!
//! RULE: Every counter is optional on the wire and required by the
//! engine. The conversion from a row to an InputRecord is where a
//! missing counter becomes MissingCounter. Derived fields present in
//! an input file (point, tier, rank) are ignored.

use crate::{
    calculator::Breakdown,
    error::{ScoringError, ScoringResult},
    performance_calculator::ProviderCounters,
    potential_calculator::ClientCounters,
    record::{InputRecord, ScoredRecord},
    tier::TierTable,
    types::{Period, Point, Rank, SubjectId, SubjectKind, TierId},
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// A wire row that can become an engine input.
pub trait Row: DeserializeOwned {
    type Counters;

    fn into_input(self) -> ScoringResult<InputRecord<Self::Counters>>;
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderRow {
    pub record_id:  Option<String>,
    pub subject_id: Option<SubjectId>,
    pub month:      Option<u8>,
    pub year:       Option<i32>,
    pub packages_delivered:             Option<u32>,
    pub avg_rating:                     Option<f64>,
    pub ratings_count:                  Option<u32>,
    pub bookings_total:                 Option<u32>,
    pub bookings_completed:             Option<u32>,
    pub bookings_cancelled_by_provider: Option<u32>,
    pub revenue:                        Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientRow {
    pub record_id:  Option<String>,
    pub subject_id: Option<SubjectId>,
    pub month:      Option<u8>,
    pub year:       Option<i32>,
    pub booking_requests:        Option<u32>,
    pub spending:                Option<f64>,
    pub cancellations_by_client: Option<u32>,
}

/// Resolves the natural key of a row and reports missing fields
/// against it.
struct RowKey {
    subject_id: SubjectId,
    label:      String,
}

impl RowKey {
    fn resolve(
        subject_id: Option<SubjectId>,
        month:      Option<u8>,
        year:       Option<i32>,
    ) -> ScoringResult<(Self, Period)> {
        let subject_id = subject_id.ok_or_else(|| ScoringError::MissingCounter {
            subject_id: "<unknown>".into(),
            period:     "<unknown>".into(),
            counter:    "subject_id",
        })?;
        let missing = |counter| ScoringError::MissingCounter {
            subject_id: subject_id.clone(),
            period:     "<unknown>".into(),
            counter,
        };
        let month = month.ok_or_else(|| missing("month"))?;
        let year = year.ok_or_else(|| missing("year"))?;
        let period = Period::new(month, year)?;
        Ok((Self { label: period.to_string(), subject_id }, period))
    }

    fn require<T>(&self, value: Option<T>, counter: &'static str) -> ScoringResult<T> {
        value.ok_or_else(|| ScoringError::MissingCounter {
            subject_id: self.subject_id.clone(),
            period:     self.label.clone(),
            counter,
        })
    }
}

impl Row for ProviderRow {
    type Counters = ProviderCounters;

    fn into_input(self) -> ScoringResult<InputRecord<ProviderCounters>> {
        let (key, period) = RowKey::resolve(self.subject_id, self.month, self.year)?;
        let counters = ProviderCounters {
            packages_delivered: key.require(self.packages_delivered, "packages_delivered")?,
            avg_rating:         key.require(self.avg_rating, "avg_rating")?,
            ratings_count:      key.require(self.ratings_count, "ratings_count")?,
            bookings_total:     key.require(self.bookings_total, "bookings_total")?,
            bookings_completed: key.require(self.bookings_completed, "bookings_completed")?,
            bookings_cancelled_by_provider: key.require(
                self.bookings_cancelled_by_provider,
                "bookings_cancelled_by_provider",
            )?,
            revenue:            key.require(self.revenue, "revenue")?,
        };
        Ok(InputRecord {
            record_id: self.record_id,
            subject_id: key.subject_id,
            period,
            counters,
        })
    }
}

impl Row for ClientRow {
    type Counters = ClientCounters;

    fn into_input(self) -> ScoringResult<InputRecord<ClientCounters>> {
        let (key, period) = RowKey::resolve(self.subject_id, self.month, self.year)?;
        let counters = ClientCounters {
            booking_requests:        key.require(self.booking_requests, "booking_requests")?,
            spending:                key.require(self.spending, "spending")?,
            cancellations_by_client: key.require(self.cancellations_by_client, "cancellations_by_client")?,
        };
        Ok(InputRecord {
            record_id: self.record_id,
            subject_id: key.subject_id,
            period,
            counters,
        })
    }
}

/// Parse a JSON array of rows into engine input. Fails on the first
/// row with a missing counter.
pub fn parse_rows<R: Row>(json: &str) -> ScoringResult<Vec<InputRecord<R::Counters>>> {
    let rows: Vec<R> = serde_json::from_str(json)?;
    rows.into_iter().map(Row::into_input).collect()
}

pub fn read_rows<R: Row>(path: &str) -> ScoringResult<Vec<InputRecord<R::Counters>>> {
    let content = std::fs::read_to_string(path)?;
    let records = parse_rows::<R>(&content)?;
    log::info!("Loaded {} rows from {path}", records.len());
    Ok(records)
}

/// One scored record as written to a snapshot file.
#[derive(Debug, Serialize)]
pub struct ScoredRow<'a, C> {
    pub record_id:  Option<&'a str>,
    pub subject_id: &'a str,
    pub month:      u8,
    pub year:       i32,
    #[serde(flatten)]
    pub counters:   &'a C,
    pub point:      Point,
    pub tier:       TierId,
    pub tier_label: &'a str,
    pub rank:       Rank,
    pub prior_tier: TierId,
    pub breakdown:  &'a Breakdown,
}

pub fn scored_rows<'a, C>(
    kind:    SubjectKind,
    records: &'a [ScoredRecord<C>],
    table:   &'a TierTable,
) -> ScoringResult<Vec<ScoredRow<'a, C>>> {
    records
        .iter()
        .map(|r| {
            Ok(ScoredRow {
                record_id:  r.record_id.as_deref(),
                subject_id: &r.subject_id,
                month:      r.period.month,
                year:       r.period.year,
                counters:   &r.counters,
                point:      r.point,
                tier:       r.tier,
                tier_label: table.label(kind, r.tier)?,
                rank:       r.rank,
                prior_tier: r.prior_tier,
                breakdown:  &r.breakdown,
            })
        })
        .collect()
}

pub fn to_json<C: Serialize>(
    kind:    SubjectKind,
    records: &[ScoredRecord<C>],
    table:   &TierTable,
) -> ScoringResult<String> {
    let rows = scored_rows(kind, records, table)?;
    Ok(serde_json::to_string_pretty(&rows)?)
}

pub fn write_scored<C: Serialize>(
    path:    &str,
    kind:    SubjectKind,
    records: &[ScoredRecord<C>],
    table:   &TierTable,
) -> ScoringResult<()> {
    let json = to_json(kind, records, table)?;
    std::fs::write(path, json)?;
    log::info!("Wrote {} {} rows to {path}", records.len(), kind.name());
    Ok(())
}

/// Serialize raw input back to the wire shape (used for synthetic fixtures).
pub fn input_to_json<C: Serialize>(records: &[InputRecord<C>]) -> ScoringResult<String> {
    #[derive(Serialize)]
    struct InputRow<'a, C> {
        record_id:  Option<&'a str>,
        subject_id: &'a str,
        month:      u8,
        year:       i32,
        #[serde(flatten)]
        counters:   &'a C,
    }

    let rows: Vec<InputRow<'_, C>> = records
        .iter()
        .map(|r| InputRow {
            record_id:  r.record_id.as_deref(),
            subject_id: &r.subject_id,
            month:      r.period.month,
            year:       r.period.year,
            counters:   &r.counters,
        })
        .collect();
    Ok(serde_json::to_string_pretty(&rows)?)
}
