// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Calendar event model and mutation drafts.
//!
//! Events are persisted inside month shard documents as a map keyed by item
//! key; the key is promoted to the `id` field when a shard snapshot is read,
//! so `id` is never written back to the store.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::activity::Activity;
use crate::models::is_false;

/// Owner/namespace of a shard: a user id or a group id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Calendar an event belongs to.
///
/// Serialized as a plain string: `"internal"`, `"group-<id>"`, or an
/// external provider calendar id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum CalendarId {
    Internal,
    Group(String),
    External(String),
}

impl CalendarId {
    pub fn group(id: impl Into<String>) -> Self {
        CalendarId::Group(id.into())
    }

    pub fn is_group(&self) -> bool {
        matches!(self, CalendarId::Group(_))
    }
}

impl Default for CalendarId {
    fn default() -> Self {
        CalendarId::Internal
    }
}

impl std::fmt::Display for CalendarId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CalendarId::Internal => f.write_str("internal"),
            CalendarId::Group(id) => write!(f, "group-{}", id),
            CalendarId::External(id) => f.write_str(id),
        }
    }
}

impl From<CalendarId> for String {
    fn from(id: CalendarId) -> Self {
        id.to_string()
    }
}

impl From<String> for CalendarId {
    fn from(raw: String) -> Self {
        if raw == "internal" {
            CalendarId::Internal
        } else if let Some(group) = raw.strip_prefix("group-") {
            CalendarId::Group(group.to_string())
        } else {
            CalendarId::External(raw)
        }
    }
}

/// Where an event originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EventSource {
    #[default]
    Internal,
    Google,
    Ical,
}

impl EventSource {
    /// Sources whose remote calendar accepts writes from us.
    pub fn is_provider_backed(&self) -> bool {
        matches!(self, EventSource::Google)
    }

    /// Read-only-origin sources: items are soft-deleted, never removed.
    pub fn is_read_only_origin(&self) -> bool {
        matches!(self, EventSource::Ical)
    }
}

/// Stored event record inside a month shard.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Shard map key, promoted on read; never written back to the store.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// ISO-8601; date-only when `is_all_day`.
    pub start_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default)]
    pub is_all_day: bool,
    /// Relative reminder: minutes before `start_time`. Exclusive with
    /// `reminder_time`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_minutes: Option<i64>,
    /// Absolute reminder fire time (all-day events). Exclusive with
    /// `reminder_minutes`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_time: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub activities: Vec<Activity>,
    /// Soft-delete flag for read-only-origin events.
    #[serde(default, skip_serializing_if = "is_false")]
    pub deleted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<String>,
    #[serde(default)]
    pub source: EventSource,
    #[serde(default)]
    pub calendar_id: CalendarId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Event {
    /// Clone prepared for storage: the map key carries the identity, so the
    /// embedded `id` is cleared and skipped during serialization.
    pub(crate) fn for_storage(&self) -> Event {
        let mut stored = self.clone();
        stored.id = String::new();
        stored
    }
}

/// Caller-supplied payload for creating or updating an event.
#[derive(Debug, Clone, Validate)]
pub struct EventDraft {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub description: Option<String>,
    pub start_time: String,
    pub end_time: Option<String>,
    pub is_all_day: bool,
    pub reminder_minutes: Option<i64>,
    pub reminder_time: Option<String>,
    pub activities: Vec<Activity>,
    pub source: EventSource,
    pub calendar_id: CalendarId,
}

impl EventDraft {
    /// Minimal draft for an internal timed event.
    pub fn new(title: impl Into<String>, start_time: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            start_time: start_time.into(),
            end_time: None,
            is_all_day: false,
            reminder_minutes: None,
            reminder_time: None,
            activities: Vec::new(),
            source: EventSource::Internal,
            calendar_id: CalendarId::Internal,
        }
    }

    pub(crate) fn into_event(self, id: String, now_rfc3339: String) -> Event {
        Event {
            id,
            title: self.title,
            description: self.description,
            start_time: self.start_time,
            end_time: self.end_time,
            is_all_day: self.is_all_day,
            reminder_minutes: self.reminder_minutes,
            reminder_time: self.reminder_time,
            activities: self.activities,
            deleted: false,
            deleted_at: None,
            source: self.source,
            calendar_id: self.calendar_id,
            updated_at: Some(now_rfc3339),
        }
    }
}
