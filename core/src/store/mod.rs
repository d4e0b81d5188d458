//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! The engine never touches it; callers hand scored records and events
//! to the store after a batch completes.

use crate::{
    engine::{BatchOutcome, ErrorPolicy},
    error::ScoringResult,
    performance_calculator::ProviderCounters,
    potential_calculator::ClientCounters,
    types::SubjectKind,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

mod events;
mod scores;

pub use scores::StoredScore;

pub struct ScoreStore {
    conn: Connection,
}

impl ScoreStore {
    pub fn open(path: &str) -> ScoringResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (:memory: ignores it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> ScoringResult<Self> {
        let conn = Connection::open(":memory:")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> ScoringResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_scorecard.sql"))?;
        Ok(())
    }

    // ── Run ────────────────────────────────────────────────────

    pub fn insert_run(
        &self,
        run_id:    &str,
        version:   &str,
        policy:    ErrorPolicy,
        scored_at: DateTime<Utc>,
    ) -> ScoringResult<()> {
        insert_run_row(&self.conn, run_id, version, policy, scored_at)
    }

    /// Persist a whole run (run row, both kinds' scores and events) in
    /// one transaction. Either all of it lands or none of it does.
    pub fn save_run(
        &self,
        run:       &RunMeta<'_>,
        providers: &BatchOutcome<ProviderCounters>,
        clients:   &BatchOutcome<ClientCounters>,
    ) -> ScoringResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        insert_run_row(&tx, run.run_id, run.version, run.policy, run.scored_at)?;
        scores::insert_provider_rows(&tx, run.run_id, &providers.records)?;
        scores::insert_client_rows(&tx, run.run_id, &clients.records)?;
        events::insert_event_rows(&tx, run.run_id, SubjectKind::Provider, &providers.events)?;
        events::insert_event_rows(&tx, run.run_id, SubjectKind::Client, &clients.events)?;
        tx.commit()?;
        log::info!(
            "saved run {}: {} provider and {} client scores",
            run.run_id,
            providers.records.len(),
            clients.records.len()
        );
        Ok(())
    }

    /// When a run was scored, if it exists.
    pub fn run_scored_at(&self, run_id: &str) -> ScoringResult<Option<DateTime<Utc>>> {
        let text: Option<String> = self
            .conn
            .query_row(
                "SELECT scored_at FROM run WHERE run_id = ?1",
                params![run_id],
                |row| row.get(0),
            )
            .optional()?;
        let Some(text) = text else { return Ok(None) };
        let parsed = DateTime::parse_from_rfc3339(&text)
            .map_err(|e| anyhow::anyhow!("run {run_id} has unparseable scored_at '{text}': {e}"))?;
        Ok(Some(parsed.with_timezone(&Utc)))
    }
}

/// Identity of one persisted run.
#[derive(Debug, Clone, Copy)]
pub struct RunMeta<'a> {
    pub run_id:    &'a str,
    pub version:   &'a str,
    pub policy:    ErrorPolicy,
    pub scored_at: DateTime<Utc>,
}

fn insert_run_row(
    conn:      &Connection,
    run_id:    &str,
    version:   &str,
    policy:    ErrorPolicy,
    scored_at: DateTime<Utc>,
) -> ScoringResult<()> {
    let policy = match policy {
        ErrorPolicy::FailFast       => "fail_fast",
        ErrorPolicy::IsolateSubject => "isolate_subject",
    };
    conn.execute(
        "INSERT INTO run (run_id, version, policy, scored_at) VALUES (?1, ?2, ?3, ?4)",
        params![run_id, version, policy, scored_at.to_rfc3339()],
    )?;
    Ok(())
}

/// Table holding scored rows for `kind`.
fn score_table(kind: SubjectKind) -> &'static str {
    match kind {
        SubjectKind::Provider => "provider_score",
        SubjectKind::Client   => "client_score",
    }
}
