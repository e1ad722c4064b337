// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the engine.

pub mod activity;
pub mod event;
pub mod reminder;
pub mod template;

pub use activity::{Activity, ActivityPayload, ChecklistItem};
pub use event::{CalendarId, EntityId, Event, EventDraft, EventSource};
pub use reminder::{activity_identity, derive_fire_time, event_identity};
pub use template::ActivityTemplate;

/// Serde helper: skip serializing default `false` flags.
pub(crate) fn is_false(value: &bool) -> bool {
    !*value
}
