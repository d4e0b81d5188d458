//! Store methods for scored period records.

use crate::{
    error::ScoringResult,
    performance_calculator::ProviderCounters,
    potential_calculator::ClientCounters,
    record::ScoredRecord,
    types::{Period, Point, Rank, SubjectId, SubjectKind, TierId},
};
use rusqlite::{params, Connection};
use std::collections::HashMap;

use super::{score_table, ScoreStore};

/// The derived part of a stored row, as read back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredScore {
    pub subject_id: SubjectId,
    pub period:     Period,
    pub point:      Point,
    pub tier:       TierId,
    pub rank:       Rank,
}

impl ScoreStore {
    pub fn insert_provider_scores(
        &self,
        run_id:  &str,
        records: &[ScoredRecord<ProviderCounters>],
    ) -> ScoringResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        insert_provider_rows(&tx, run_id, records)?;
        tx.commit()?;
        Ok(())
    }

    pub fn insert_client_scores(
        &self,
        run_id:  &str,
        records: &[ScoredRecord<ClientCounters>],
    ) -> ScoringResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        insert_client_rows(&tx, run_id, records)?;
        tx.commit()?;
        Ok(())
    }

    /// One period cohort of a run, best rank first.
    pub fn cohort(
        &self,
        run_id: &str,
        kind:   SubjectKind,
        period: Period,
    ) -> ScoringResult<Vec<StoredScore>> {
        let sql = format!(
            "SELECT subject_id, month, year, point, tier, rank FROM {}
             WHERE run_id = ?1 AND year = ?2 AND month = ?3
             ORDER BY rank ASC, subject_id ASC",
            score_table(kind)
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![run_id, period.year, period.month], |row| {
                Ok(StoredScore {
                    subject_id: row.get(0)?,
                    period: Period {
                        month: row.get(1)?,
                        year:  row.get(2)?,
                    },
                    point: row.get(3)?,
                    tier:  row.get(4)?,
                    rank:  row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// (tier, record count) for a run, highest tier first. Empty tiers
    /// are absent.
    pub fn tier_distribution(
        &self,
        run_id: &str,
        kind:   SubjectKind,
    ) -> ScoringResult<Vec<(TierId, i64)>> {
        let sql = format!(
            "SELECT tier, COUNT(*) FROM {} WHERE run_id = ?1
             GROUP BY tier ORDER BY tier DESC",
            score_table(kind)
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![run_id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn score_count(&self, run_id: &str, kind: SubjectKind) -> ScoringResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM {} WHERE run_id = ?1", score_table(kind));
        let count: i64 = self.conn.query_row(&sql, params![run_id], |row| row.get(0))?;
        Ok(count)
    }

    /// Latest stored tier per subject strictly before that subject's
    /// own cutoff (its first period in the coming input), across all
    /// runs. When several runs scored the same month, the most recently
    /// inserted run wins. Subjects without a cutoff are skipped. Feeds
    /// PeriodChain::with_history.
    pub fn carry_in_history(
        &self,
        kind:    SubjectKind,
        cutoffs: &HashMap<SubjectId, Period>,
    ) -> ScoringResult<Vec<(SubjectId, Period, TierId)>> {
        let sql = format!(
            "SELECT s.subject_id, s.month, s.year, s.tier
             FROM {} s JOIN run r ON r.run_id = s.run_id
             ORDER BY s.subject_id ASC, s.year DESC, s.month DESC, r.rowid DESC",
            score_table(kind)
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    Period {
                        month: row.get(1)?,
                        year:  row.get(2)?,
                    },
                    row.get::<_, TierId>(3)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        // Rows arrive newest first per subject; keep the first one under
        // that subject's cutoff.
        let mut history: Vec<(SubjectId, Period, TierId)> = Vec::new();
        for (subject_id, period, tier) in rows {
            let Some(cutoff) = cutoffs.get(&subject_id) else { continue };
            if period >= *cutoff {
                continue;
            }
            if history.last().map(|(id, _, _)| id == &subject_id).unwrap_or(false) {
                continue;
            }
            history.push((subject_id, period, tier));
        }
        log::debug!(
            "carry-in history for {}: {} of {} subjects",
            kind.name(),
            history.len(),
            cutoffs.len()
        );
        Ok(history)
    }
}

pub(super) fn insert_provider_rows(
    conn:    &Connection,
    run_id:  &str,
    records: &[ScoredRecord<ProviderCounters>],
) -> ScoringResult<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO provider_score (
            run_id, record_id, subject_id, month, year,
            packages_delivered, avg_rating, ratings_count, bookings_total,
            bookings_completed, bookings_cancelled_by_provider, revenue,
            prior_tier, weighted_sum, point, tier, rank
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
    )?;
    for r in records {
        let c = &r.counters;
        stmt.execute(params![
            run_id,
            r.record_id,
            r.subject_id,
            r.period.month,
            r.period.year,
            c.packages_delivered,
            c.avg_rating,
            c.ratings_count,
            c.bookings_total,
            c.bookings_completed,
            c.bookings_cancelled_by_provider,
            c.revenue,
            r.prior_tier,
            r.breakdown.weighted_sum,
            r.point,
            r.tier,
            r.rank,
        ])?;
    }
    log::debug!("stored {} provider scores for run {run_id}", records.len());
    Ok(())
}

pub(super) fn insert_client_rows(
    conn:    &Connection,
    run_id:  &str,
    records: &[ScoredRecord<ClientCounters>],
) -> ScoringResult<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO client_score (
            run_id, record_id, subject_id, month, year,
            booking_requests, spending, cancellations_by_client,
            prior_tier, weighted_sum, point, tier, rank
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
    )?;
    for r in records {
        let c = &r.counters;
        stmt.execute(params![
            run_id,
            r.record_id,
            r.subject_id,
            r.period.month,
            r.period.year,
            c.booking_requests,
            c.spending,
            c.cancellations_by_client,
            r.prior_tier,
            r.breakdown.weighted_sum,
            r.point,
            r.tier,
            r.rank,
        ])?;
    }
    log::debug!("stored {} client scores for run {run_id}", records.len());
    Ok(())
}
