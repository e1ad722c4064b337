// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reminder identity and fire-time derivation.
//!
//! The identity string is the sole cancel handle: rescheduling always
//! cancels by this identity before scheduling the replacement, so at most
//! one live reminder exists per identity.

use chrono::{DateTime, Duration, Utc};

use crate::error::Result;
use crate::time_utils;

/// Correlation id for an event-level reminder.
pub fn event_identity(event_id: &str) -> String {
    event_id.to_string()
}

/// Correlation id for an activity-level reminder.
pub fn activity_identity(event_id: &str, activity_id: &str) -> String {
    format!("{}-checklist-{}", event_id, activity_id)
}

/// Derive the absolute fire time from a reminder specification.
///
/// `reminder_time` wins when present (all-day events, pinned activities);
/// otherwise `start - reminder_minutes` applies. Returns `None` when no
/// reminder is specified. Which field is populated is the caller's contract;
/// no disambiguation happens here.
pub fn derive_fire_time(
    reminder_time: Option<&str>,
    reminder_minutes: Option<i64>,
    start_time: &str,
) -> Result<Option<DateTime<Utc>>> {
    if let Some(absolute) = reminder_time {
        return Ok(Some(time_utils::parse_utc(absolute)?));
    }
    if let Some(minutes) = reminder_minutes {
        let start = time_utils::parse_utc(start_time)?;
        return Ok(Some(start - Duration::minutes(minutes)));
    }
    Ok(None)
}

/// A fire time at or before `now` is never dispatched.
pub fn is_dispatchable(fire_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    fire_at > now
}
