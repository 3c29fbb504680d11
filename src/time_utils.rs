// SPDX-License-Identifier: MIT
// Copyright 2026 Garmin Harvest contributors

//! Shared helpers for date/time formatting and date-range enumeration.

use chrono::{DateTime, Duration, NaiveDate, SecondsFormat, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// An inclusive range of calendar dates, iterated earliest-to-latest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Build a range from `start` through `end`, both inclusive.
    ///
    /// Returns `None` when `end` precedes `start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// The last `days` calendar days ending at `today` (inclusive).
    /// `days` is clamped to at least one.
    pub fn last_n_days(days: u32, today: NaiveDate) -> Self {
        let days = days.max(1);
        let start = today - Duration::days(i64::from(days) - 1);
        Self { start, end: today }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of dates in the range.
    pub fn len(&self) -> u32 {
        (self.end - self.start).num_days() as u32 + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Iterate the dates in ascending order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start
            .iter_days()
            .take_while(move |date| *date <= end)
    }
}
