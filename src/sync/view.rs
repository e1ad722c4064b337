// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Read accessors: pure projections over the aggregate cache.
//!
//! Accessors merge multiple entities (personal + groups) and flatten the
//! per-shard map into a plain collection. None of them guarantee sort
//! order; callers sort by start time before display.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::models::{Activity, CalendarId, EntityId, Event};
use crate::sync::cache::{AggregateCache, ShardState};
use crate::sync::shard::ShardKey;
use crate::time_utils;

/// An activity together with its owning event's coordinates.
#[derive(Debug, Clone)]
pub struct ActivityEntry {
    pub event_id: String,
    pub event_title: String,
    pub event_start: String,
    pub activity: Activity,
}

/// Read-only projection handle over one view's cache.
#[derive(Clone)]
pub struct CacheView {
    cache: Arc<AggregateCache>,
}

impl CacheView {
    pub(crate) fn new(cache: Arc<AggregateCache>) -> Self {
        Self { cache }
    }

    /// Union of one month shard across entities, soft-deleted items
    /// excluded.
    pub fn events_for_month(&self, entities: &[EntityId], key: &ShardKey) -> Vec<Event> {
        self.collect_month(entities, key, false)
    }

    /// As [`Self::events_for_month`], including soft-deleted items (the
    /// "show deleted" view filter).
    pub fn events_for_month_including_deleted(
        &self,
        entities: &[EntityId],
        key: &ShardKey,
    ) -> Vec<Event> {
        self.collect_month(entities, key, true)
    }

    /// Events whose START falls within `[startOfDay, endOfDay]` inclusive.
    /// End time and duration are irrelevant to day membership.
    pub fn events_for_day(&self, entities: &[EntityId], day: NaiveDate) -> Vec<Event> {
        self.collect_day(entities, day, false)
    }

    pub fn events_for_day_including_deleted(
        &self,
        entities: &[EntityId],
        day: NaiveDate,
    ) -> Vec<Event> {
        self.collect_day(entities, day, true)
    }

    /// Every cached event on one calendar, across all loaded shards.
    pub fn events_for_calendar(&self, entities: &[EntityId], calendar: &CalendarId) -> Vec<Event> {
        let mut events = Vec::new();
        for entity in entities {
            for key in self.cache.shard_keys_for_entity(entity) {
                if let Some(state) = self.cache.shard(entity, &key) {
                    events.extend(
                        state
                            .items
                            .into_values()
                            .filter(|e| !e.deleted && &e.calendar_id == calendar),
                    );
                }
            }
        }
        events
    }

    /// Activities embedded in one month's events.
    pub fn activities_for_month(&self, entities: &[EntityId], key: &ShardKey) -> Vec<ActivityEntry> {
        flatten_activities(self.events_for_month(entities, key))
    }

    /// Activities embedded in events starting on `day`.
    pub fn activities_for_day(&self, entities: &[EntityId], day: NaiveDate) -> Vec<ActivityEntry> {
        flatten_activities(self.events_for_day(entities, day))
    }

    /// Activities across EVERY cached shard for one entity: a full scan of
    /// whatever has been loaded so far, not bounded to the navigation
    /// window.
    pub fn activities_for_entity(&self, entity: &EntityId) -> Vec<ActivityEntry> {
        let mut events = Vec::new();
        for key in self.cache.shard_keys_for_entity(entity) {
            if let Some(state) = self.cache.shard(entity, &key) {
                events.extend(state.items.into_values().filter(|e| !e.deleted));
            }
        }
        flatten_activities(events)
    }

    /// Whether a shard's first snapshot (or error) has arrived. Callers must
    /// check this before treating an empty result as "no data".
    pub fn shard_loaded(&self, entity: &EntityId, key: &ShardKey) -> bool {
        self.cache.is_loaded(entity, key)
    }

    /// The recorded transport error for a shard, if any.
    pub fn shard_error(&self, entity: &EntityId, key: &ShardKey) -> Option<String> {
        self.cache.shard(entity, key).and_then(|s| s.error)
    }

    pub fn loaded_shard_count(&self) -> usize {
        self.cache.loaded_shard_count()
    }

    fn collect_month(
        &self,
        entities: &[EntityId],
        key: &ShardKey,
        include_deleted: bool,
    ) -> Vec<Event> {
        let mut events = Vec::new();
        for entity in entities {
            if let Some(ShardState { items, .. }) = self.cache.shard(entity, key) {
                events.extend(
                    items
                        .into_values()
                        .filter(|e| include_deleted || !e.deleted),
                );
            }
        }
        events
    }

    fn collect_day(&self, entities: &[EntityId], day: NaiveDate, include_deleted: bool) -> Vec<Event> {
        let key = ShardKey::from_date(day);
        self.collect_month(entities, &key, include_deleted)
            .into_iter()
            .filter(|event| starts_on(event, day))
            .collect()
    }
}

fn starts_on(event: &Event, day: NaiveDate) -> bool {
    match time_utils::parse_wall_clock(&event.start_time) {
        Ok(start) => {
            let (lower, upper) = time_utils::day_bounds(day);
            start >= lower && start <= upper
        }
        Err(_) => {
            tracing::warn!(event_id = %event.id, start = %event.start_time, "Unparseable start time in cache");
            false
        }
    }
}

fn flatten_activities(events: Vec<Event>) -> Vec<ActivityEntry> {
    let mut entries = Vec::new();
    for event in events {
        for activity in &event.activities {
            entries.push(ActivityEntry {
                event_id: event.id.clone(),
                event_title: event.title.clone(),
                event_start: event.start_time.clone(),
                activity: activity.clone(),
            });
        }
    }
    entries
}
