//! Scoring events: the audit trail of one batch.
//!
//! RULE: The engine records what it decided as events; it never
//! writes anywhere itself. Callers persist events through the store.

use crate::types::{Period, Point, RunId, SubjectId, SubjectKind, TierId};
use serde::{Deserialize, Serialize};

/// Every event emitted during a batch.
/// Variants are appended only, never removed or reordered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScoringEvent {
    RunStarted {
        run_id:  RunId,
        kind:    SubjectKind,
        records: usize,
    },
    SubjectScored {
        subject_id: SubjectId,
        period:     Period,
        prior_tier: TierId,
        point:      Point,
        tier:       TierId,
        movement:   TierMovement,
    },
    CohortRanked {
        period:    Period,
        size:      usize,
        top_point: Point,
    },
    SubjectRejected {
        subject_id: SubjectId,
        period:     Period,
        reason:     String,
    },
    RunCompleted {
        run_id:   RunId,
        kind:     SubjectKind,
        scored:   usize,
        rejected: usize,
    },
}

impl ScoringEvent {
    /// Stable name for the event_type column.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::RunStarted { .. }      => "run_started",
            Self::SubjectScored { .. }   => "subject_scored",
            Self::CohortRanked { .. }    => "cohort_ranked",
            Self::SubjectRejected { .. } => "subject_rejected",
            Self::RunCompleted { .. }    => "run_completed",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TierMovement {
    Promoted,
    Held,
    Demoted,
}

impl TierMovement {
    pub fn between(prior: TierId, current: TierId) -> Self {
        match current.cmp(&prior) {
            std::cmp::Ordering::Greater => Self::Promoted,
            std::cmp::Ordering::Equal   => Self::Held,
            std::cmp::Ordering::Less    => Self::Demoted,
        }
    }
}

/// The event log entry as persisted to SQLite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id:         Option<i64>,
    pub run_id:     RunId,
    pub seq:        i64,
    pub kind:       String,
    pub event_type: String,
    pub payload:    String, // JSON-serialized ScoringEvent
}
