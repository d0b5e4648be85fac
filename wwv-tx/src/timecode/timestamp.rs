/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Caller-supplied UTC calendar fields and their range checks.

use std::fmt;
use std::ops::RangeInclusive;

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── CalendarTimestamp ─────────────────────────────────────────────────────────

/// The UTC date/time fields carried by one WWV frame.
///
/// Fields are signed so that out-of-range input (e.g. `hour = -1`) can be
/// represented and rejected by [`validate`](Self::validate) instead of being
/// unrepresentable at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarTimestamp {
    /// Full year, e.g. `2021`.  Only its last digit is transmitted.
    pub year: i32,
    /// `0..=366`.
    pub day_of_year: i32,
    /// `0..=23`.
    pub hour: i32,
    /// `0..=59`.
    pub minute: i32,
}

impl CalendarTimestamp {
    pub fn new(year: i32, day_of_year: i32, hour: i32, minute: i32) -> Self {
        Self {
            year,
            day_of_year,
            hour,
            minute,
        }
    }

    /// Fields of `dt`, with a 1-based day of year.
    pub fn from_utc(dt: &DateTime<Utc>) -> Self {
        Self {
            year: dt.year(),
            // ordinal() ≤ 366 and hour()/minute() ≤ 59, all fit in i32
            day_of_year: dt.ordinal() as i32,
            hour: dt.hour() as i32,
            minute: dt.minute() as i32,
        }
    }

    /// Range-check minute, hour and day of year, in that order.
    ///
    /// # Errors
    /// [`ValidationError::OutOfRange`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            (TimestampField::Minute, self.minute),
            (TimestampField::Hour, self.hour),
            (TimestampField::DayOfYear, self.day_of_year),
        ] {
            if !field.range().contains(&value) {
                return Err(ValidationError::OutOfRange { field, value });
            }
        }
        Ok(())
    }
}

impl fmt::Display for CalendarTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04} DoY {:03} {:02}:{:02} UTC",
            self.year, self.day_of_year, self.hour, self.minute
        )
    }
}

// ── Validation ────────────────────────────────────────────────────────────────

/// A range-checked field of [`CalendarTimestamp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampField {
    Minute,
    Hour,
    DayOfYear,
}

impl TimestampField {
    pub fn range(self) -> RangeInclusive<i32> {
        match self {
            TimestampField::Minute => 0..=59,
            TimestampField::Hour => 0..=23,
            TimestampField::DayOfYear => 0..=366,
        }
    }

    pub fn min(self) -> i32 {
        *self.range().start()
    }

    pub fn max(self) -> i32 {
        *self.range().end()
    }
}

impl fmt::Display for TimestampField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TimestampField::Minute => "minute",
            TimestampField::Hour => "hour",
            TimestampField::DayOfYear => "day_of_year",
        })
    }
}

/// Why a timestamp cannot be encoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} = {value} is out of range {}..={}", .field.min(), .field.max())]
    OutOfRange { field: TimestampField, value: i32 },
}

impl ValidationError {
    pub fn field(&self) -> TimestampField {
        match self {
            ValidationError::OutOfRange { field, .. } => *field,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
