// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shard key calculation.
//!
//! Items are partitioned into one remote document per entity per calendar
//! month. The key is the literal "YYYY-MM" of the item's start time: a
//! date-only value partitions by its literal calendar date, a date-time
//! value by the month portion of its ISO representation, so the partition
//! never depends on the host's timezone.

use chrono::{Datelike, NaiveDate};

use crate::error::{EngineError, Result};
use crate::time_utils;

/// A "YYYY-MM" month partition key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShardKey {
    year: i32,
    month: u32,
}

impl ShardKey {
    /// Parse a "YYYY-MM" key.
    pub fn parse(raw: &str) -> Result<Self> {
        let (year, month) = raw
            .split_once('-')
            .ok_or_else(|| EngineError::InvalidDate(raw.to_string()))?;
        let year: i32 = year
            .parse()
            .map_err(|_| EngineError::InvalidDate(raw.to_string()))?;
        let month: u32 = month
            .parse()
            .map_err(|_| EngineError::InvalidDate(raw.to_string()))?;
        if !(1..=12).contains(&month) || year < 0 {
            return Err(EngineError::InvalidDate(raw.to_string()));
        }
        Ok(Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Key for a persisted start timestamp (literal month portion).
    pub fn for_start(start_time: &str) -> Result<Self> {
        Self::parse(&time_utils::month_key(start_time)?)
    }

    /// The key `delta` months away (negative for past months).
    pub fn offset(&self, delta: i32) -> Self {
        let index = self.year * 12 + (self.month as i32 - 1) + delta;
        Self {
            year: index.div_euclid(12),
            month: (index.rem_euclid(12) + 1) as u32,
        }
    }

    /// Ordered keys covering `[self - before, self + after]` months.
    pub fn window(&self, before: u32, after: u32) -> Vec<ShardKey> {
        (-(before as i32)..=after as i32)
            .map(|delta| self.offset(delta))
            .collect()
    }
}

impl std::fmt::Display for ShardKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// The visible time range a view is subscribed to, expressed as a reference
/// date plus a month radius.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateWindow {
    reference: NaiveDate,
    months_before: u32,
    months_after: u32,
}

impl DateWindow {
    /// The classic 3-shard window: previous, current, next month.
    pub fn around(reference: NaiveDate) -> Self {
        Self::with_radius(reference, 1, 1)
    }

    pub fn with_radius(reference: NaiveDate, months_before: u32, months_after: u32) -> Self {
        Self {
            reference,
            months_before,
            months_after,
        }
    }

    pub fn shard_keys(&self) -> Vec<ShardKey> {
        ShardKey::from_date(self.reference).window(self.months_before, self.months_after)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn window_spans_previous_current_next() {
        let keys = DateWindow::around(date(2025, 3, 15)).shard_keys();
        let rendered: Vec<String> = keys.iter().map(ShardKey::to_string).collect();
        assert_eq!(rendered, ["2025-02", "2025-03", "2025-04"]);
    }

    #[test]
    fn window_wraps_year_boundaries() {
        let keys = DateWindow::around(date(2025, 1, 1)).shard_keys();
        let rendered: Vec<String> = keys.iter().map(ShardKey::to_string).collect();
        assert_eq!(rendered, ["2024-12", "2025-01", "2025-02"]);

        let keys = DateWindow::around(date(2024, 12, 31)).shard_keys();
        let rendered: Vec<String> = keys.iter().map(ShardKey::to_string).collect();
        assert_eq!(rendered, ["2024-11", "2024-12", "2025-01"]);
    }

    #[test]
    fn for_start_uses_literal_month() {
        assert_eq!(
            ShardKey::for_start("2025-01-31T23:30:00+02:00")
                .unwrap()
                .to_string(),
            "2025-01"
        );
        assert_eq!(
            ShardKey::for_start("2025-03-10").unwrap().to_string(),
            "2025-03"
        );
    }

    #[test]
    fn malformed_dates_fail_fast() {
        assert!(matches!(
            ShardKey::for_start("tomorrow"),
            Err(EngineError::InvalidDate(_))
        ));
        assert!(ShardKey::parse("2025-00").is_err());
        assert!(ShardKey::parse("2025-13").is_err());
        assert!(ShardKey::parse("2025").is_err());
    }

    #[test]
    fn offset_handles_negative_deltas_across_years() {
        let key = ShardKey::parse("2025-01").unwrap();
        assert_eq!(key.offset(-1).to_string(), "2024-12");
        assert_eq!(key.offset(-13).to_string(), "2023-12");
        assert_eq!(key.offset(12).to_string(), "2026-01");
    }
}
