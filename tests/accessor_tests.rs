// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! End-to-end accessor behavior: mutations flowing back through live
//! subscriptions into day/month/entity projections.

mod common;
use common::test_engine;

use chrono::NaiveDate;
use hearth_sync::models::{Activity, ChecklistItem, EntityId, EventDraft};
use hearth_sync::services::ReminderScope;
use hearth_sync::store::{CollectionFamily, ShardTarget};
use hearth_sync::sync::{DateWindow, ShardKey};

fn march() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 15).unwrap()
}

#[tokio::test]
async fn mutations_become_visible_through_the_live_view() {
    let ctx = test_engine();
    let manager = ctx.engine.open_view(CollectionFamily::Activities);
    let uid = EntityId::from("uid-1");
    let view = manager.sync(std::slice::from_ref(&uid), &DateWindow::around(march()));

    // Mutators never write the cache; the subscription reflects the write.
    let outcome = ctx
        .engine
        .events()
        .create_event(
            &ShardTarget::activities("uid-1"),
            EventDraft::new("Dentist", "2025-03-10T09:00:00"),
            &ReminderScope::personal("uid-1"),
        )
        .await
        .unwrap();

    let day = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
    let events = view.events_for_day(std::slice::from_ref(&uid), day);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].id, outcome.event.id);
    assert_eq!(events[0].title, "Dentist");

    ctx.engine
        .events()
        .delete_event(
            &ShardTarget::activities("uid-1"),
            &outcome.event.id,
            "2025-03-10T09:00:00",
        )
        .await
        .unwrap();
    assert!(view.events_for_day(std::slice::from_ref(&uid), day).is_empty());
}

#[tokio::test]
async fn day_view_is_unordered_and_callers_sort_by_start() {
    let ctx = test_engine();
    let manager = ctx.engine.open_view(CollectionFamily::Activities);
    let uid = EntityId::from("uid-1");
    let view = manager.sync(std::slice::from_ref(&uid), &DateWindow::around(march()));

    for (title, start) in [
        ("Late", "2025-03-10T20:00:00"),
        ("Early", "2025-03-10T06:00:00"),
        ("Midday", "2025-03-10T12:00:00"),
    ] {
        ctx.engine
            .events()
            .create_event(
                &ShardTarget::activities("uid-1"),
                EventDraft::new(title, start),
                &ReminderScope::personal("uid-1"),
            )
            .await
            .unwrap();
    }

    let day = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
    let mut events = view.events_for_day(std::slice::from_ref(&uid), day);
    events.sort_by(|a, b| a.start_time.cmp(&b.start_time));
    let titles: Vec<&str> = events.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, ["Early", "Midday", "Late"]);
}

#[tokio::test]
async fn personal_and_group_entities_merge_in_month_view() {
    let ctx = test_engine();
    let manager = ctx.engine.open_view(CollectionFamily::Activities);
    let uid = EntityId::from("uid-1");
    let group = EntityId::from("group-42");
    let both = [uid.clone(), group.clone()];
    let view = manager.sync(&both, &DateWindow::around(march()));

    ctx.engine
        .events()
        .create_event(
            &ShardTarget::activities("uid-1"),
            EventDraft::new("Personal", "2025-03-05T09:00:00"),
            &ReminderScope::personal("uid-1"),
        )
        .await
        .unwrap();
    ctx.engine
        .events()
        .create_event(
            &ShardTarget::activities("group-42"),
            EventDraft::new("Shared", "2025-03-06T09:00:00"),
            &ReminderScope::personal("uid-1"),
        )
        .await
        .unwrap();

    let key = ShardKey::parse("2025-03").unwrap();
    let events = view.events_for_month(&both, &key);
    assert_eq!(events.len(), 2);

    // Each entity alone sees only its own shard.
    assert_eq!(view.events_for_month(std::slice::from_ref(&uid), &key).len(), 1);
    assert_eq!(view.events_for_month(std::slice::from_ref(&group), &key).len(), 1);
}

#[tokio::test]
async fn activities_for_entity_spans_every_loaded_window() {
    let ctx = test_engine();
    let manager = ctx.engine.open_view(CollectionFamily::Activities);
    let uid = EntityId::from("uid-1");
    let scope = ReminderScope::personal("uid-1");
    let target = ShardTarget::activities("uid-1");

    let mut spring = EventDraft::new("Spring trip", "2025-03-20T08:00:00");
    spring.activities = vec![Activity::checklist("Pack", vec![ChecklistItem::new("Map")])];
    ctx.engine
        .events()
        .create_event(&target, spring, &scope)
        .await
        .unwrap();

    let mut winter = EventDraft::new("Winter trip", "2025-12-20T08:00:00");
    winter.activities = vec![Activity::checklist("Ski prep", vec![])];
    ctx.engine
        .events()
        .create_event(&target, winter, &scope)
        .await
        .unwrap();

    // Navigate March, then December: both windows stay cached.
    let view = manager.sync(std::slice::from_ref(&uid), &DateWindow::around(march()));
    manager.sync(
        std::slice::from_ref(&uid),
        &DateWindow::around(NaiveDate::from_ymd_opt(2025, 12, 15).unwrap()),
    );

    let entries = view.activities_for_entity(&uid);
    let mut names: Vec<String> = entries.iter().map(|e| e.activity.name.clone()).collect();
    names.sort();
    // Full scan of whatever is loaded, not bounded to the current window.
    assert_eq!(names, ["Pack", "Ski prep"]);
    assert!(entries.iter().all(|e| !e.event_id.is_empty()));
}
