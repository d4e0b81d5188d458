//! Store methods for the scoring event log.

use crate::{
    error::ScoringResult,
    event::{EventLogEntry, ScoringEvent},
    types::SubjectKind,
};
use rusqlite::{params, Connection};

use super::ScoreStore;

impl ScoreStore {
    /// Persist a batch's events in emission order.
    pub fn append_events(
        &self,
        run_id: &str,
        kind:   SubjectKind,
        events: &[ScoringEvent],
    ) -> ScoringResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        insert_event_rows(&tx, run_id, kind, events)?;
        tx.commit()?;
        Ok(())
    }

    pub fn events_for_run(
        &self,
        run_id: &str,
        kind:   SubjectKind,
    ) -> ScoringResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, run_id, seq, kind, event_type, payload
             FROM event_log WHERE run_id = ?1 AND kind = ?2
             ORDER BY seq ASC",
        )?;
        let entries = stmt
            .query_map(params![run_id, kind.name()], |row| {
                Ok(EventLogEntry {
                    id:         Some(row.get(0)?),
                    run_id:     row.get(1)?,
                    seq:        row.get(2)?,
                    kind:       row.get(3)?,
                    event_type: row.get(4)?,
                    payload:    row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Number of events of one type logged for a run (for tests).
    pub fn event_count(&self, run_id: &str, event_type: &str) -> ScoringResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM event_log WHERE run_id = ?1 AND event_type = ?2",
            params![run_id, event_type],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

pub(super) fn insert_event_rows(
    conn:   &Connection,
    run_id: &str,
    kind:   SubjectKind,
    events: &[ScoringEvent],
) -> ScoringResult<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO event_log (run_id, seq, kind, event_type, payload)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for (seq, event) in events.iter().enumerate() {
        stmt.execute(params![
            run_id,
            seq as i64,
            kind.name(),
            event.type_name(),
            serde_json::to_string(event)?,
        ])?;
    }
    Ok(())
}
