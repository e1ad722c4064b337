// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Event and activity mutators.
//!
//! Every mutation is a read-modify-write on exactly one shard document per
//! write: read the shard, transform the in-memory item map, merge-write the
//! whole map back. There is no optimistic concurrency check: the last
//! writer wins on the whole map (see DESIGN.md). Mutators never write
//! through the aggregate cache; the live subscription reflects the change
//! back.
//!
//! On success the reminder scheduler is reconciled (cancel by identity,
//! then re-schedule). Scheduling failures degrade to a warning on the
//! outcome and never roll back the committed write.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::{EngineError, Result};
use crate::models::reminder::{activity_identity, derive_fire_time, event_identity};
use crate::models::{Activity, Event, EventDraft};
use crate::services::dispatch::{DispatchPayload, NotificationDispatch};
use crate::services::provider::CalendarProvider;
use crate::services::reminders::{ReminderRequest, ReminderScheduler, ReminderScope};
use crate::store::{scrub_nulls, DocumentStore, ShardTarget};
use crate::sync::shard::ShardKey;
use crate::time_utils;
use validator::Validate;

/// Result of a create/update mutation. `reminder_warning` is set when the
/// data write committed but scheduling (partially) failed: a valid,
/// terminal, partially-degraded state surfaced as a soft warning.
#[derive(Debug)]
pub struct SaveOutcome {
    pub event: Event,
    pub reminder_warning: Option<String>,
}

/// Result of a delete mutation.
#[derive(Debug)]
pub struct DeleteOutcome {
    /// True when the item was soft-deleted (read-only-origin source) rather
    /// than removed from the shard map.
    pub soft_deleted: bool,
    pub reminder_warning: Option<String>,
}

/// Write operations against shard documents.
pub struct EventService<S, D, P> {
    store: Arc<S>,
    provider: Arc<P>,
    scheduler: ReminderScheduler<D>,
}

impl<S, D, P> EventService<S, D, P>
where
    S: DocumentStore,
    D: NotificationDispatch,
    P: CalendarProvider,
{
    pub fn new(store: Arc<S>, provider: Arc<P>, scheduler: ReminderScheduler<D>) -> Self {
        Self {
            store,
            provider,
            scheduler,
        }
    }

    pub fn scheduler(&self) -> &ReminderScheduler<D> {
        &self.scheduler
    }

    /// Create an event in the shard keyed by its start month.
    pub async fn create_event(
        &self,
        target: &ShardTarget,
        draft: EventDraft,
        scope: &ReminderScope,
    ) -> Result<SaveOutcome> {
        validate_draft(&draft)?;

        let key = ShardKey::for_start(&draft.start_time)?;
        let id = uuid::Uuid::new_v4().to_string();
        let now = time_utils::format_utc_rfc3339(chrono::Utc::now());
        let event = draft.into_event(id, now);

        // Provider first: if the origin calendar rejects the event, the
        // local mirror must not be written.
        if event.source.is_provider_backed() {
            self.provider
                .create_event(&event.calendar_id, &event)
                .await?;
        }

        let path = target.shard_path(&key);
        let field = target.family.item_field();
        let mut items = self.load_item_map(&path, field).await?.unwrap_or_default();
        items.insert(event.id.clone(), item_to_value(&event)?);
        self.write_item_map(&path, field, items).await?;

        tracing::info!(path = %path, event_id = %event.id, "Event created");

        let reminder_warning = self.reconcile_event_reminders(&event, &[], scope).await;
        Ok(SaveOutcome {
            event,
            reminder_warning,
        })
    }

    /// Update an event located by id and its PREVIOUS start time. When the
    /// start month changes the item moves shards: removed from the old
    /// month's map first, then inserted into the new one, so it is never in
    /// two shards simultaneously.
    pub async fn update_event(
        &self,
        target: &ShardTarget,
        event_id: &str,
        prev_start_time: &str,
        draft: EventDraft,
        scope: &ReminderScope,
    ) -> Result<SaveOutcome> {
        validate_draft(&draft)?;

        let old_key = ShardKey::for_start(prev_start_time)?;
        let old_path = target.shard_path(&old_key);
        let field = target.family.item_field();

        let mut old_items = self
            .load_item_map(&old_path, field)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("shard {}", old_path)))?;
        let previous = parse_stored_event(&old_items, event_id)?;

        let now = time_utils::format_utc_rfc3339(chrono::Utc::now());
        let mut event = draft.into_event(event_id.to_string(), now);
        // Soft-delete state survives unrelated edits.
        event.deleted = previous.deleted;
        event.deleted_at = previous.deleted_at.clone();

        if event.source.is_provider_backed() {
            self.provider
                .update_event(&event.calendar_id, &event)
                .await?;
        }

        let new_key = ShardKey::for_start(&event.start_time)?;
        if new_key == old_key {
            old_items.insert(event.id.clone(), item_to_value(&event)?);
            self.write_item_map(&old_path, field, old_items).await?;
        } else {
            old_items.remove(event_id);
            self.write_item_map(&old_path, field, old_items).await?;

            let new_path = target.shard_path(&new_key);
            let mut new_items = self
                .load_item_map(&new_path, field)
                .await?
                .unwrap_or_default();
            new_items.insert(event.id.clone(), item_to_value(&event)?);
            self.write_item_map(&new_path, field, new_items).await?;
            tracing::info!(
                event_id,
                from = %old_key,
                to = %new_key,
                "Event moved to a new month shard"
            );
        }

        let reminder_warning = self
            .reconcile_event_reminders(&event, &previous.activities, scope)
            .await;
        Ok(SaveOutcome {
            event,
            reminder_warning,
        })
    }

    /// Fully replace an event's embedded activities array.
    pub async fn update_activities(
        &self,
        target: &ShardTarget,
        event_id: &str,
        start_time: &str,
        activities: Vec<Activity>,
        scope: &ReminderScope,
    ) -> Result<SaveOutcome> {
        validate_activities(&activities)?;

        let key = ShardKey::for_start(start_time)?;
        let path = target.shard_path(&key);
        let field = target.family.item_field();

        let mut items = self
            .load_item_map(&path, field)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("shard {}", path)))?;
        let mut event = parse_stored_event(&items, event_id)?;

        let previous_activities = std::mem::replace(&mut event.activities, activities);
        event.updated_at = Some(time_utils::format_utc_rfc3339(chrono::Utc::now()));

        items.insert(event.id.clone(), item_to_value(&event)?);
        self.write_item_map(&path, field, items).await?;

        tracing::info!(
            event_id,
            activities = event.activities.len(),
            "Activities replaced"
        );

        let reminder_warning = self
            .reconcile_activity_reminders(&event, &previous_activities, scope)
            .await;
        Ok(SaveOutcome {
            event,
            reminder_warning,
        })
    }

    /// Delete an event. Internal events leave the shard map; read-only-origin
    /// events (ical) are soft-deleted in place and never physically removed.
    pub async fn delete_event(
        &self,
        target: &ShardTarget,
        event_id: &str,
        start_time: &str,
    ) -> Result<DeleteOutcome> {
        let key = ShardKey::for_start(start_time)?;
        let path = target.shard_path(&key);
        let field = target.family.item_field();

        let mut items = self
            .load_item_map(&path, field)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("shard {}", path)))?;
        let mut event = parse_stored_event(&items, event_id)?;

        let soft_deleted = if event.source.is_read_only_origin() {
            event.deleted = true;
            event.deleted_at = Some(time_utils::format_utc_rfc3339(chrono::Utc::now()));
            items.insert(event.id.clone(), item_to_value(&event)?);
            true
        } else {
            if event.source.is_provider_backed() {
                self.provider
                    .delete_event(&event.calendar_id, event_id)
                    .await?;
            }
            items.remove(event_id);
            false
        };
        self.write_item_map(&path, field, items).await?;

        tracing::info!(path = %path, event_id, soft_deleted, "Event deleted");

        let mut identities = vec![event_identity(event_id)];
        identities.extend(
            event
                .activities
                .iter()
                .map(|a| activity_identity(event_id, &a.id)),
        );
        let reminder_warning = self.scheduler.cancel_all(identities).await;

        Ok(DeleteOutcome {
            soft_deleted,
            reminder_warning,
        })
    }

    // ─── Reminder orchestration ──────────────────────────────────

    /// Cancel-then-reschedule the event reminder and every activity
    /// reminder; cancel identities of activities that were removed.
    /// Returns a combined warning if any dispatch call failed.
    async fn reconcile_event_reminders(
        &self,
        event: &Event,
        previous_activities: &[Activity],
        scope: &ReminderScope,
    ) -> Option<String> {
        let mut warnings = Vec::new();

        let request = match event_reminder_request(event) {
            Ok(request) => request,
            Err(err) => {
                tracing::warn!(event_id = %event.id, error = %err, "Event reminder not derivable");
                warnings.push(err.to_string());
                None
            }
        };
        let outcome = self
            .scheduler
            .reconcile(&event_identity(&event.id), request, scope)
            .await;
        warnings.extend(outcome.warning);

        if let Some(warning) = self
            .reconcile_activity_reminders(event, previous_activities, scope)
            .await
        {
            warnings.push(warning);
        }

        if warnings.is_empty() {
            None
        } else {
            Some(warnings.join("; "))
        }
    }

    async fn reconcile_activity_reminders(
        &self,
        event: &Event,
        previous_activities: &[Activity],
        scope: &ReminderScope,
    ) -> Option<String> {
        let mut warnings = Vec::new();

        // Activities that disappeared keep no reminder behind.
        let stale: Vec<String> = previous_activities
            .iter()
            .filter(|prev| !event.activities.iter().any(|a| a.id == prev.id))
            .map(|prev| activity_identity(&event.id, &prev.id))
            .collect();
        warnings.extend(self.scheduler.cancel_all(stale).await);

        for activity in &event.activities {
            let identity = activity_identity(&event.id, &activity.id);
            let request = match activity_reminder_request(event, activity) {
                Ok(request) => request,
                Err(err) => {
                    tracing::warn!(identity = %identity, error = %err, "Activity reminder not derivable");
                    warnings.push(err.to_string());
                    None
                }
            };
            let outcome = self.scheduler.reconcile(&identity, request, scope).await;
            warnings.extend(outcome.warning);
        }

        if warnings.is_empty() {
            None
        } else {
            Some(warnings.join("; "))
        }
    }

    // ─── Shard document access ───────────────────────────────────

    /// Read a shard's item map. `None` means the shard document itself does
    /// not exist; a document without the item field is an empty map.
    async fn load_item_map(&self, path: &str, field: &str) -> Result<Option<Map<String, Value>>> {
        let Some(doc) = self.store.get(path).await? else {
            return Ok(None);
        };
        Ok(Some(
            doc.get(field)
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default(),
        ))
    }

    /// Merge-write the whole item map back under its field, scrubbed of
    /// null placeholders.
    async fn write_item_map(&self, path: &str, field: &str, items: Map<String, Value>) -> Result<()> {
        let mut patch = Value::Object(Map::from_iter([(
            field.to_string(),
            Value::Object(items),
        )]));
        scrub_nulls(&mut patch);
        self.store.set_merge(path, patch).await
    }
}

fn item_to_value(event: &Event) -> Result<Value> {
    serde_json::to_value(event.for_storage())
        .map_err(|e| EngineError::Internal(anyhow::anyhow!("event serialization failed: {}", e)))
}

fn parse_stored_event(items: &Map<String, Value>, event_id: &str) -> Result<Event> {
    let raw = items
        .get(event_id)
        .ok_or_else(|| EngineError::NotFound(format!("event {}", event_id)))?;
    let mut event: Event = serde_json::from_value(raw.clone())
        .map_err(|e| EngineError::Internal(anyhow::anyhow!("stored event is malformed: {}", e)))?;
    event.id = event_id.to_string();
    Ok(event)
}

/// Derive the dispatch request for an event-level reminder, if any.
fn event_reminder_request(event: &Event) -> Result<Option<ReminderRequest>> {
    let Some(fire_at) = derive_fire_time(
        event.reminder_time.as_deref(),
        event.reminder_minutes,
        &event.start_time,
    )?
    else {
        return Ok(None);
    };

    let mut data = Map::new();
    data.insert("kind".to_string(), Value::String("event".to_string()));
    data.insert("eventId".to_string(), Value::String(event.id.clone()));
    data.insert(
        "calendarId".to_string(),
        Value::String(event.calendar_id.to_string()),
    );

    Ok(Some(ReminderRequest {
        payload: DispatchPayload {
            title: event.title.clone(),
            body: format!("Starts at {}", event.start_time),
            data,
        },
        fire_at,
    }))
}

/// Derive the dispatch request for an activity-level reminder, if any.
fn activity_reminder_request(event: &Event, activity: &Activity) -> Result<Option<ReminderRequest>> {
    let Some(fire_at) = derive_fire_time(
        activity.reminder_time.as_deref(),
        activity.reminder_minutes,
        &event.start_time,
    )?
    else {
        return Ok(None);
    };

    let (done, total) = activity.payload.progress();
    let mut data = Map::new();
    data.insert("kind".to_string(), Value::String("activity".to_string()));
    data.insert("eventId".to_string(), Value::String(event.id.clone()));
    data.insert("activityId".to_string(), Value::String(activity.id.clone()));
    data.insert("notifyAdmin".to_string(), Value::Bool(activity.notify_admin));

    Ok(Some(ReminderRequest {
        payload: DispatchPayload {
            title: activity.name.clone(),
            body: format!("{}: {}/{} done", event.title, done, total),
            data,
        },
        fire_at,
    }))
}

// ─── Payload validation ──────────────────────────────────────────

fn validate_draft(draft: &EventDraft) -> Result<()> {
    draft
        .validate()
        .map_err(|e| EngineError::Validation(e.to_string()))?;

    if draft.reminder_minutes.is_some() && draft.reminder_time.is_some() {
        return Err(EngineError::Validation(
            "reminderMinutes and reminderTime are mutually exclusive".to_string(),
        ));
    }
    if draft.reminder_minutes.is_some_and(|m| m < 0) {
        return Err(EngineError::Validation(
            "reminderMinutes must be non-negative".to_string(),
        ));
    }

    let start = time_utils::parse_wall_clock(&draft.start_time)?;
    if let Some(end_time) = &draft.end_time {
        let end = time_utils::parse_wall_clock(end_time)?;
        if end < start {
            return Err(EngineError::Validation(
                "endTime precedes startTime".to_string(),
            ));
        }
    }
    if let Some(reminder_time) = &draft.reminder_time {
        time_utils::parse_wall_clock(reminder_time)?;
    }

    validate_activities(&draft.activities)
}

fn validate_activities(activities: &[Activity]) -> Result<()> {
    for activity in activities {
        if activity.id.is_empty() {
            return Err(EngineError::Validation(
                "activity id is required".to_string(),
            ));
        }
        if activity.name.is_empty() {
            return Err(EngineError::Validation(
                "activity name is required".to_string(),
            ));
        }
        if activity.reminder_minutes.is_some() && activity.reminder_time.is_some() {
            return Err(EngineError::Validation(format!(
                "activity {} sets both reminderMinutes and reminderTime",
                activity.id
            )));
        }
        if activity.reminder_minutes.is_some_and(|m| m < 0) {
            return Err(EngineError::Validation(format!(
                "activity {} has a negative reminderMinutes",
                activity.id
            )));
        }
        if let Some(reminder_time) = &activity.reminder_time {
            time_utils::parse_wall_clock(reminder_time)?;
        }
    }
    Ok(())
}
