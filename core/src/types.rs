//! Shared primitive types used across the entire engine.

use crate::error::{ScoringError, ScoringResult};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A stable, opaque identifier for a provider or client.
pub type SubjectId = String;

/// The canonical run identifier.
pub type RunId = String;

/// A score in [0, 100] once clamped.
pub type Point = u32;

/// A tier id, 0 = lowest.
pub type TierId = u8;

/// A 1-based competition rank within a cohort.
pub type Rank = u32;

/// Which population a record belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    Provider,
    Client,
}

impl SubjectKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Provider => "provider",
            Self::Client   => "client",
        }
    }
}

/// One scoring cycle: a calendar month.
///
/// Ordered chronologically (year first, then month). Deserializing
/// goes through Period::new, so a month outside 1..=12 is rejected.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "RawPeriod")]
pub struct Period {
    // Field order matters: derived Ord compares year before month.
    pub year:  i32,
    pub month: u8,
}

#[derive(Deserialize)]
struct RawPeriod {
    year:  i32,
    month: u8,
}

impl TryFrom<RawPeriod> for Period {
    type Error = ScoringError;

    fn try_from(raw: RawPeriod) -> ScoringResult<Self> {
        Period::new(raw.month, raw.year)
    }
}

impl Period {
    /// Build a period, rejecting months outside 1..=12.
    pub fn new(month: u8, year: i32) -> ScoringResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(ScoringError::InvalidPeriod { month });
        }
        Ok(Self { year, month })
    }

    /// The calendar month containing `date`.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year:  date.year(),
            month: date.month() as u8,
        }
    }

    /// The period immediately before this one. January wraps to
    /// December of the prior year.
    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Self { year: self.year - 1, month: 12 }
        } else {
            Self { year: self.year, month: self.month - 1 }
        }
    }

    /// The period immediately after this one.
    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self { year: self.year + 1, month: 1 }
        } else {
            Self { year: self.year, month: self.month + 1 }
        }
    }

    /// Parse `YYYY-MM`.
    pub fn parse(text: &str) -> ScoringResult<Self> {
        let bad = || ScoringError::InvalidConfig {
            reason: format!("period '{text}' is not YYYY-MM"),
        };
        let (year, month) = text.trim().split_once('-').ok_or_else(bad)?;
        let year: i32 = year.parse().map_err(|_| bad())?;
        let month: u8 = month.parse().map_err(|_| bad())?;
        Self::new(month, year)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{}", self.month, self.year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn previous_wraps_january_to_december() {
        let jan = Period::new(1, 2025).unwrap();
        assert_eq!(jan.previous(), Period::new(12, 2024).unwrap());
        assert_eq!(jan.previous().next(), jan);
    }

    #[test]
    fn ordering_is_chronological() {
        let dec_2024 = Period::new(12, 2024).unwrap();
        let jan_2025 = Period::new(1, 2025).unwrap();
        let feb_2025 = Period::new(2, 2025).unwrap();
        assert!(dec_2024 < jan_2025);
        assert!(jan_2025 < feb_2025);
    }

    #[test]
    fn month_out_of_range_is_rejected() {
        assert!(Period::new(0, 2025).is_err());
        assert!(Period::new(13, 2025).is_err());
    }

    #[test]
    fn deserializing_checks_the_month() {
        let ok: Period = serde_json::from_str(r#"{"year": 2025, "month": 1}"#).unwrap();
        assert_eq!(ok, Period::new(1, 2025).unwrap());

        for month in [0, 13] {
            let json = format!(r#"{{"year": 2025, "month": {month}}}"#);
            let err = serde_json::from_str::<Period>(&json).unwrap_err();
            assert!(
                err.to_string().contains("Invalid period"),
                "month {month} should be rejected, got: {err}"
            );
        }
    }

    #[test]
    fn parse_and_from_date_agree() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 17).unwrap();
        assert_eq!(Period::from_date(date), Period::parse("2025-03").unwrap());
        assert!(Period::parse("2025/03").is_err());
    }
}
