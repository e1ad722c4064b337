// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time parsing and formatting.
//!
//! Persisted timestamps are ISO-8601 strings: date-only (`2025-03-10`) for
//! all-day items, date-time (`2025-03-10T09:00:00` or RFC 3339 with offset)
//! for timed items. Shard partitioning and day-membership both work on the
//! LITERAL representation, so a wall-clock time never shifts into a
//! neighboring month or day because of offset conversion.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};

use crate::error::{EngineError, Result};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse a persisted timestamp to its literal wall-clock value.
///
/// Accepts RFC 3339 (offset discarded, wall clock kept), plain date-time,
/// and date-only strings (midnight). Fails with `InvalidDate` on anything
/// else.
pub fn parse_wall_clock(value: &str) -> Result<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.naive_local());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M") {
        return Ok(dt);
    }
    if let Ok(d) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(d.and_time(NaiveTime::MIN));
    }
    Err(EngineError::InvalidDate(value.to_string()))
}

/// Parse a persisted timestamp as an absolute UTC instant.
///
/// RFC 3339 offsets are honored; offset-less values are taken as UTC. Used
/// for reminder fire-time arithmetic, where an absolute instant is required.
pub fn parse_utc(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    parse_wall_clock(value).map(|naive| naive.and_utc())
}

/// Inclusive `[startOfDay, endOfDay]` bounds for day-membership checks.
pub fn day_bounds(day: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let start = day.and_time(NaiveTime::MIN);
    let end = day
        .and_hms_opt(23, 59, 59)
        .expect("23:59:59 is a valid wall-clock time");
    (start, end)
}

/// Extract the literal "YYYY-MM" month portion of a persisted timestamp.
///
/// The input is validated first so a malformed date fails fast instead of
/// silently landing in a wrong shard.
pub fn month_key(value: &str) -> Result<String> {
    parse_wall_clock(value)?;
    // chrono tolerates unpadded fields ("2025-3-1"); a literal slice of those
    // would produce a wrong shard key, so require the padded ISO layout.
    let b = value.as_bytes();
    let padded = b.len() >= 7
        && b[..4].iter().all(u8::is_ascii_digit)
        && b[4] == b'-'
        && b[5].is_ascii_digit()
        && b[6].is_ascii_digit();
    if !padded {
        return Err(EngineError::InvalidDate(value.to_string()));
    }
    Ok(value[..7].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rfc3339_keeping_wall_clock() {
        let dt = parse_wall_clock("2025-03-10T09:00:00+05:00").unwrap();
        assert_eq!(dt.to_string(), "2025-03-10 09:00:00");
    }

    #[test]
    fn parses_date_only_as_midnight() {
        let dt = parse_wall_clock("2025-03-10").unwrap();
        assert_eq!(dt.to_string(), "2025-03-10 00:00:00");
    }

    #[test]
    fn parses_offsetless_datetime() {
        let dt = parse_wall_clock("2025-03-10T09:00").unwrap();
        assert_eq!(dt.to_string(), "2025-03-10 09:00:00");
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            parse_wall_clock("next tuesday"),
            Err(EngineError::InvalidDate(_))
        ));
    }

    #[test]
    fn month_key_uses_literal_representation() {
        // 23:30 on Jan 31 with a +02:00 offset is already February in UTC,
        // but the literal calendar month is what partitions the shard.
        assert_eq!(month_key("2025-01-31T23:30:00+02:00").unwrap(), "2025-01");
        assert_eq!(month_key("2025-03-10").unwrap(), "2025-03");
    }

    #[test]
    fn month_key_rejects_malformed_input() {
        assert!(month_key("2025-13-40").is_err());
        assert!(month_key("").is_err());
        assert!(month_key("2025-3-1").is_err());
    }

    #[test]
    fn day_bounds_are_inclusive_of_last_second() {
        let (start, end) = day_bounds(NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
        assert_eq!(start.to_string(), "2025-03-10 00:00:00");
        assert_eq!(end.to_string(), "2025-03-10 23:59:59");
    }

    #[test]
    fn parse_utc_honors_offset() {
        let dt = parse_utc("2025-03-10T09:00:00+01:00").unwrap();
        assert_eq!(format_utc_rfc3339(dt), "2025-03-10T08:00:00Z");
    }
}
