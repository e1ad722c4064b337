// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Document store layer.
//!
//! The engine talks to a path-addressable store of JSON documents through
//! the [`DocumentStore`] trait: get, merge-write, delete, and
//! live-subscribe-with-callback. The production transport lives outside
//! this crate; [`MemoryStore`] is the in-process implementation used by
//! tests and local development.

pub mod memory;

pub use memory::MemoryStore;

use serde_json::Value;

use crate::error::{EngineError, Result};
use crate::models::EntityId;
use crate::sync::shard::ShardKey;

/// Collection names as constants.
pub mod collections {
    pub const CALENDARS: &str = "calendars";
    pub const ACTIVITIES: &str = "activities";
    pub const TEMPLATES: &str = "templates";
    /// Partition segment between the entity and the month key.
    pub const PARTITION: &str = "months";
}

/// The two sharded collection families.
///
/// `calendars` documents are keyed by calendar id and hold their items under
/// `events`; `activities` documents are keyed by a user or group id and hold
/// theirs under `items`. Shape and lifecycle are otherwise identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionFamily {
    Calendars,
    Activities,
}

impl CollectionFamily {
    pub fn collection(&self) -> &'static str {
        match self {
            CollectionFamily::Calendars => collections::CALENDARS,
            CollectionFamily::Activities => collections::ACTIVITIES,
        }
    }

    /// Document field holding the item map.
    pub fn item_field(&self) -> &'static str {
        match self {
            CollectionFamily::Calendars => "events",
            CollectionFamily::Activities => "items",
        }
    }
}

/// Addressing for one entity's shards within a collection family.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShardTarget {
    pub family: CollectionFamily,
    pub entity: EntityId,
}

impl ShardTarget {
    pub fn calendars(entity: impl Into<EntityId>) -> Self {
        Self {
            family: CollectionFamily::Calendars,
            entity: entity.into(),
        }
    }

    pub fn activities(entity: impl Into<EntityId>) -> Self {
        Self {
            family: CollectionFamily::Activities,
            entity: entity.into(),
        }
    }

    pub fn shard_path(&self, key: &ShardKey) -> String {
        format!(
            "{}/{}/{}/{}",
            self.family.collection(),
            self.entity,
            collections::PARTITION,
            key
        )
    }
}

impl From<EntityId> for ShardTarget {
    fn from(entity: EntityId) -> Self {
        ShardTarget::activities(entity)
    }
}

/// Path of the per-user templates document.
pub fn template_path(user: &EntityId) -> String {
    format!("{}/{}", collections::TEMPLATES, user)
}

/// Snapshot callback: `None` means the document does not exist.
pub type SnapshotHandler = Box<dyn Fn(Option<Value>) + Send + Sync>;

/// Per-subscription error callback; failures are isolated to the
/// subscription they occur on.
pub type ErrorHandler = Box<dyn Fn(EngineError) + Send + Sync>;

/// Live subscription handle.
///
/// The underlying listener is released exactly once: by an explicit
/// [`Subscription::unsubscribe`], or on drop if that never happened.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("released", &self.cancel.is_none())
            .finish()
    }
}

/// Path-addressable JSON document store with live subscriptions.
///
/// Merge contract: top-level fields named in the patch REPLACE the stored
/// field wholesale; fields not named are preserved. Item-map mutators rely
/// on this to make map-entry removal observable.
pub trait DocumentStore: Send + Sync + 'static {
    /// Fetch a document; `None` if it does not exist.
    fn get(&self, path: &str) -> impl std::future::Future<Output = Result<Option<Value>>> + Send;

    /// Merge-write a partial document, creating it if absent.
    fn set_merge(
        &self,
        path: &str,
        patch: Value,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Remove a document entirely.
    fn delete(&self, path: &str) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Open a live subscription. The current snapshot (including "absent")
    /// is delivered immediately, then one snapshot per write.
    fn subscribe(
        &self,
        path: &str,
        on_snapshot: SnapshotHandler,
        on_error: ErrorHandler,
    ) -> Subscription;
}

/// Strip null-valued fields before writing.
///
/// Absent values must be omitted, not written as null placeholders, so
/// documents stay clean for stricter downstream readers.
pub fn scrub_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            for v in map.values_mut() {
                scrub_nulls(v);
            }
        }
        Value::Array(items) => {
            for v in items.iter_mut() {
                scrub_nulls(v);
            }
        }
        _ => {}
    }
}
