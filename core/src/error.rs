use crate::types::{Period, SubjectId, TierId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScoringError {
    #[error("Invalid tier: {tier} is not in the tier table")]
    InvalidTier { tier: TierId },

    #[error("Missing counter '{counter}' for subject {subject_id} in {period}")]
    MissingCounter {
        subject_id: SubjectId,
        period:     String,
        counter:    &'static str,
    },

    #[error("Duplicate record for subject {subject_id} in {period}")]
    DuplicateKey { subject_id: SubjectId, period: Period },

    #[error("Invalid period: month {month} is outside 1..=12")]
    InvalidPeriod { month: u8 },

    #[error("Invalid counter '{counter}' = {value} for subject {subject_id} in {period}")]
    InvalidCounter {
        subject_id: SubjectId,
        period:     Period,
        counter:    &'static str,
        value:      f64,
    },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type ScoringResult<T> = Result<T, ScoringError>;
