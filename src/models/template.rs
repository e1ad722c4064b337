// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reusable activity templates.

use serde::{Deserialize, Serialize};

use crate::models::activity::{Activity, ActivityPayload, ChecklistItem};
use crate::models::is_false;

/// A standalone, user-owned activity definition, decoupled from any event.
///
/// Stored in the per-user templates document as a map entry; the map key is
/// promoted to `id` on read, like shard items.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ActivityTemplate {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    /// Item labels copied into fresh checklist items on instantiation.
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_minutes: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_time: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub notify_admin: bool,
}

impl ActivityTemplate {
    pub fn new(name: impl Into<String>, items: Vec<String>) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            items,
            reminder_minutes: None,
            reminder_time: None,
            notify_admin: false,
        }
    }

    /// Copy the template into a fresh activity: new ids, completion reset.
    pub fn instantiate(&self) -> Activity {
        Activity {
            id: uuid::Uuid::new_v4().to_string(),
            name: self.name.clone(),
            payload: ActivityPayload::Checklist {
                items: self
                    .items
                    .iter()
                    .map(|label| ChecklistItem::new(label.clone()))
                    .collect(),
            },
            reminder_minutes: self.reminder_minutes,
            reminder_time: self.reminder_time.clone(),
            notify_admin: self.notify_admin,
        }
    }
}
