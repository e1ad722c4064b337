// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Embedded activity model.
//!
//! Activities never have their own shard: they live inside an event's
//! `activities` array. The payload is a tagged union keyed by
//! `activityType`, so consumers match exhaustively and new activity kinds
//! are additive.

use serde::{Deserialize, Serialize};

use crate::models::is_false;

/// One entry of a checklist activity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub completed: bool,
}

impl ChecklistItem {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            label: label.into(),
            completed: false,
        }
    }
}

/// Kind-specific activity payload, tagged by `activityType` on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "activityType", rename_all = "camelCase")]
pub enum ActivityPayload {
    Checklist {
        #[serde(default)]
        items: Vec<ChecklistItem>,
    },
}

impl ActivityPayload {
    /// Completed/total progress for display and dispatch payloads.
    pub fn progress(&self) -> (usize, usize) {
        match self {
            ActivityPayload::Checklist { items } => {
                let done = items.iter().filter(|i| i.completed).count();
                (done, items.len())
            }
        }
    }
}

/// Activity embedded in an event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub payload: ActivityPayload,
    /// Relative reminder, minutes before the parent event's start.
    /// Exclusive with `reminder_time`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_minutes: Option<i64>,
    /// Absolute reminder fire time. Exclusive with `reminder_minutes`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_time: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub notify_admin: bool,
}

impl Activity {
    pub fn checklist(name: impl Into<String>, items: Vec<ChecklistItem>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            payload: ActivityPayload::Checklist { items },
            reminder_minutes: None,
            reminder_time: None,
            notify_admin: false,
        }
    }

    pub fn has_reminder(&self) -> bool {
        self.reminder_minutes.is_some() || self.reminder_time.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checklist_round_trips_with_tag() {
        let activity = Activity::checklist(
            "Packing",
            vec![ChecklistItem::new("Tent"), ChecklistItem::new("Stove")],
        );
        let value = serde_json::to_value(&activity).unwrap();
        assert_eq!(value["activityType"], "checklist");
        assert_eq!(value["items"].as_array().unwrap().len(), 2);

        let back: Activity = serde_json::from_value(value).unwrap();
        assert_eq!(back, activity);
    }

    #[test]
    fn unknown_activity_type_is_rejected() {
        let raw = r#"{"id":"a1","name":"Quiz","activityType":"spelling"}"#;
        assert!(serde_json::from_str::<Activity>(raw).is_err());
    }

    #[test]
    fn progress_counts_completed_items() {
        let mut items = vec![ChecklistItem::new("A"), ChecklistItem::new("B")];
        items[0].completed = true;
        let activity = Activity::checklist("List", items);
        assert_eq!(activity.payload.progress(), (1, 2));
    }
}
