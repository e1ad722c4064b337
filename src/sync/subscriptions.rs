// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Subscription lifecycle management.
//!
//! One manager instance backs one view over one collection family. It is an
//! explicitly constructed, explicitly owned object (never a process-wide
//! singleton), so independent views can run concurrently. `sync` is
//! idempotent: already-subscribed (entity, shard) pairs are left untouched,
//! new pairs get exactly one live subscription, and entities that left the
//! requested set are reconciled away. Shards stay subscribed when the
//! window moves; the active shard set only grows while its entity remains
//! relevant.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde_json::Value;

use crate::config::EngineConfig;
use crate::models::{EntityId, Event};
use crate::store::{CollectionFamily, DocumentStore, ShardTarget};
use crate::sync::cache::AggregateCache;
use crate::sync::shard::{DateWindow, ShardKey};
use crate::sync::view::CacheView;

/// Owns the live shard subscriptions feeding one [`AggregateCache`].
pub struct SubscriptionManager<S: DocumentStore> {
    store: Arc<S>,
    family: CollectionFamily,
    config: EngineConfig,
    cache: Arc<AggregateCache>,
    subs: DashMap<(EntityId, ShardKey), crate::store::Subscription>,
}

impl<S: DocumentStore> SubscriptionManager<S> {
    pub fn new(store: Arc<S>, family: CollectionFamily, config: EngineConfig) -> Self {
        Self {
            store,
            family,
            config,
            cache: Arc::new(AggregateCache::new()),
            subs: DashMap::new(),
        }
    }

    /// Expand the active subscription set to cover `entities` over `window`.
    ///
    /// Non-blocking: subscriptions deliver via callbacks and the cache fills
    /// incrementally. An empty entity list is a no-op. Returns the read-only
    /// view over the cache.
    pub fn sync(&self, entities: &[EntityId], window: &DateWindow) -> CacheView {
        self.reconcile_entities(entities);

        let keys = window.shard_keys();
        for entity in entities {
            for key in &keys {
                self.subscribe_shard(entity, key);
            }
        }
        self.view()
    }

    /// `sync` with the window radius taken from the engine configuration.
    pub fn sync_around(&self, entities: &[EntityId], reference: NaiveDate) -> CacheView {
        let window = DateWindow::with_radius(
            reference,
            self.config.window_months_before,
            self.config.window_months_after,
        );
        self.sync(entities, &window)
    }

    /// Read-only accessor handle over the cache.
    pub fn view(&self) -> CacheView {
        CacheView::new(Arc::clone(&self.cache))
    }

    /// Release every open subscription (each exactly once) and drop the
    /// cached state. Safe to call on a manager that never subscribed.
    pub fn close(&self) {
        let released = self.subs.len();
        self.subs.clear();
        self.cache.clear();
        tracing::debug!(family = ?self.family, released, "Subscription manager closed");
    }

    /// Number of live (entity, shard) subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.subs.len()
    }

    fn subscribe_shard(&self, entity: &EntityId, key: &ShardKey) {
        let slot = (entity.clone(), key.clone());
        match self.subs.entry(slot) {
            Entry::Occupied(_) => {}
            Entry::Vacant(vacant) => {
                let target = ShardTarget {
                    family: self.family,
                    entity: entity.clone(),
                };
                let path = target.shard_path(key);
                tracing::debug!(path = %path, "Opening shard subscription");

                let field = self.family.item_field();
                let on_snapshot = {
                    let cache = Arc::clone(&self.cache);
                    let entity = entity.clone();
                    let key = key.clone();
                    Box::new(move |snapshot: Option<Value>| {
                        let items = parse_shard_snapshot(field, snapshot);
                        cache.replace_shard(&entity, &key, items);
                    }) as crate::store::SnapshotHandler
                };
                let on_error = {
                    let cache = Arc::clone(&self.cache);
                    let entity = entity.clone();
                    let key = key.clone();
                    let path = path.clone();
                    Box::new(move |err: crate::error::EngineError| {
                        tracing::warn!(path = %path, error = %err, "Shard subscription failed");
                        cache.record_error(&entity, &key, err.to_string());
                    }) as crate::store::ErrorHandler
                };

                let subscription = self.store.subscribe(&path, on_snapshot, on_error);
                vacant.insert(subscription);
            }
        }
    }

    /// Drop subscriptions and cache entries for entities that are no longer
    /// requested. Shards of retained entities are never closed here.
    fn reconcile_entities(&self, entities: &[EntityId]) {
        let mut removed: Vec<EntityId> = Vec::new();
        self.subs.retain(|(entity, _), _| {
            let keep = entities.contains(entity);
            if !keep && !removed.contains(entity) {
                removed.push(entity.clone());
            }
            keep
        });
        for entity in removed {
            tracing::debug!(entity = %entity, "Reconciled removed entity");
            self.cache.drop_entity(&entity);
        }
    }
}

/// Decode a shard document snapshot into its item map, promoting each map
/// key to the item's `id` field. A missing document or item field is an
/// empty map: "no events this month", distinct from "still loading".
fn parse_shard_snapshot(field: &str, snapshot: Option<Value>) -> HashMap<String, Event> {
    let mut items = HashMap::new();
    let Some(doc) = snapshot else {
        return items;
    };
    let Some(raw_items) = doc.get(field).and_then(Value::as_object) else {
        return items;
    };
    for (item_key, raw) in raw_items {
        match serde_json::from_value::<Event>(raw.clone()) {
            Ok(mut event) => {
                event.id = item_key.clone();
                items.insert(item_key.clone(), event);
            }
            Err(err) => {
                tracing::warn!(item_key = %item_key, error = %err, "Skipping undecodable shard item");
            }
        }
    }
    items
}
