// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Aggregate cache: the in-memory entity→shard→items map.
//!
//! Written only by the subscription manager; read accessors (`sync::view`)
//! never mutate. Entries are keyed by (entity, shard) and fully independent,
//! so snapshots arriving out of order across shards cannot corrupt one
//! another: each inbound snapshot REPLACES exactly its own shard's items.

use std::collections::HashMap;

use dashmap::DashMap;

use crate::models::{EntityId, Event};
use crate::sync::shard::ShardKey;

/// Cached contents of one (entity, shard) pair.
#[derive(Debug, Clone, Default)]
pub struct ShardState {
    /// Item key → event, with the key already promoted to `Event::id`.
    pub items: HashMap<String, Event>,
    /// True once the first snapshot (or error) arrived. A shard absent from
    /// the cache is "still loading", not "empty".
    pub loaded: bool,
    /// Recorded transport failure; isolated to this shard.
    pub error: Option<String>,
}

/// In-memory cache fed by live shard subscriptions.
#[derive(Debug, Default)]
pub struct AggregateCache {
    shards: DashMap<(EntityId, ShardKey), ShardState>,
}

impl AggregateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a shard's contents with a fresh snapshot. The remote document
    /// is the sole authority for the shard, so this is a replace, not a merge.
    pub fn replace_shard(&self, entity: &EntityId, key: &ShardKey, items: HashMap<String, Event>) {
        self.shards.insert(
            (entity.clone(), key.clone()),
            ShardState {
                items,
                loaded: true,
                error: None,
            },
        );
    }

    /// Record a per-shard subscription failure without touching other shards.
    pub fn record_error(&self, entity: &EntityId, key: &ShardKey, message: String) {
        self.shards.insert(
            (entity.clone(), key.clone()),
            ShardState {
                items: HashMap::new(),
                loaded: true,
                error: Some(message),
            },
        );
    }

    /// Drop every cached shard belonging to an entity that is no longer
    /// relevant.
    pub fn drop_entity(&self, entity: &EntityId) {
        self.shards.retain(|(e, _), _| e != entity);
    }

    pub fn clear(&self) {
        self.shards.clear();
    }

    pub fn shard(&self, entity: &EntityId, key: &ShardKey) -> Option<ShardState> {
        self.shards
            .get(&(entity.clone(), key.clone()))
            .map(|state| state.clone())
    }

    pub fn is_loaded(&self, entity: &EntityId, key: &ShardKey) -> bool {
        self.shard(entity, key).map(|s| s.loaded).unwrap_or(false)
    }

    pub fn loaded_shard_count(&self) -> usize {
        self.shards.iter().filter(|entry| entry.value().loaded).count()
    }

    /// Every cached shard key for one entity, whatever window loaded it.
    pub fn shard_keys_for_entity(&self, entity: &EntityId) -> Vec<ShardKey> {
        let mut keys: Vec<ShardKey> = self
            .shards
            .iter()
            .filter(|entry| &entry.key().0 == entity)
            .map(|entry| entry.key().1.clone())
            .collect();
        keys.sort();
        keys
    }
}
