//! Countdown Target
//!
//! The instant the countdown runs toward: midnight at the start of January 1
//! of the year after the current local year. Computed once at startup.

use chrono::{DateTime, Datelike, LocalResult, NaiveDate, TimeZone};
use thiserror::Error;

/// Errors computing a countdown target
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TargetError {
    /// The calendar year is outside what the date library can represent
    #[error("year {0} is out of range")]
    YearOutOfRange(i32),

    /// Local midnight does not exist in the time zone (skipped by a transition)
    #[error("midnight on {0}-01-01 does not exist in the local time zone")]
    NonexistentMidnight(i32),
}

/// An immutable countdown target instant
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Target {
    epoch_ms: i64,
    year: i32,
}

impl Target {
    /// Midnight, January 1 of the year following `now`, in `now`'s time zone
    pub fn next_new_year<Tz: TimeZone>(now: &DateTime<Tz>) -> Result<Self, TargetError> {
        let year = now.year() + 1;
        Self::new_year_in(&now.timezone(), year)
    }

    /// Midnight, January 1 of `year`, in the given time zone
    pub fn new_year_in<Tz: TimeZone>(tz: &Tz, year: i32) -> Result<Self, TargetError> {
        let midnight = NaiveDate::from_ymd_opt(year, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .ok_or(TargetError::YearOutOfRange(year))?;

        let instant = match tz.from_local_datetime(&midnight) {
            LocalResult::Single(t) => t,
            // Ambiguous local midnight: the first occurrence is the boundary
            LocalResult::Ambiguous(earliest, _) => earliest,
            LocalResult::None => return Err(TargetError::NonexistentMidnight(year)),
        };

        Ok(Self {
            epoch_ms: instant.timestamp_millis(),
            year,
        })
    }

    /// Target for the system's local time zone, based on the current time
    pub fn next_local_new_year() -> Result<Self, TargetError> {
        Self::next_new_year(&chrono::Local::now())
    }

    /// A target at an arbitrary instant; the display year is derived from it
    pub fn at_epoch_ms(epoch_ms: i64) -> Self {
        let year = chrono::Local
            .timestamp_millis_opt(epoch_ms)
            .earliest()
            .map(|t| t.year())
            .unwrap_or(1970);
        Self { epoch_ms, year }
    }

    /// Target instant in epoch milliseconds
    pub fn epoch_ms(&self) -> i64 {
        self.epoch_ms
    }

    /// Calendar year being counted down to
    pub fn year(&self) -> i32 {
        self.year
    }

    /// Milliseconds remaining at `now_ms` (negative once passed)
    pub fn remaining_ms(&self, now_ms: i64) -> i64 {
        self.epoch_ms - now_ms
    }

    /// Whether the target has been reached at `now_ms`
    pub fn has_passed(&self, now_ms: i64) -> bool {
        now_ms >= self.epoch_ms
    }
}
