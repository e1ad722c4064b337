// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory document store.
//!
//! Implements the full [`DocumentStore`] contract for tests and local
//! development, including live subscriptions with immediate initial
//! snapshots. Fault injection hooks let tests exercise per-shard failure
//! isolation and aborted writes without a real transport.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::error::{EngineError, Result};
use crate::store::{DocumentStore, ErrorHandler, SnapshotHandler, Subscription};

struct ListenerEntry {
    id: u64,
    on_snapshot: Arc<dyn Fn(Option<Value>) + Send + Sync>,
    on_error: Arc<dyn Fn(EngineError) + Send + Sync>,
}

type ListenerMap = HashMap<String, Vec<ListenerEntry>>;

/// In-process store of JSON documents keyed by path.
#[derive(Default)]
pub struct MemoryStore {
    docs: Mutex<HashMap<String, Value>>,
    listeners: Arc<Mutex<ListenerMap>>,
    next_listener_id: AtomicU64,
    write_failures: Mutex<HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write to `path` fail with a transport error.
    pub fn fail_writes_to(&self, path: impl Into<String>) {
        self.write_failures.lock().unwrap().insert(path.into());
    }

    pub fn clear_write_failures(&self) {
        self.write_failures.lock().unwrap().clear();
    }

    /// Fire the error callback of every live subscription on `path`.
    pub fn inject_subscription_error(&self, path: &str, message: &str) {
        let handlers: Vec<Arc<dyn Fn(EngineError) + Send + Sync>> = {
            let listeners = self.listeners.lock().unwrap();
            listeners
                .get(path)
                .map(|entries| entries.iter().map(|e| Arc::clone(&e.on_error)).collect())
                .unwrap_or_default()
        };
        for handler in handlers {
            handler(EngineError::Transport(message.to_string()));
        }
    }

    /// Number of live subscriptions on `path`.
    pub fn listener_count(&self, path: &str) -> usize {
        self.listeners
            .lock()
            .unwrap()
            .get(path)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Total live subscriptions across all paths.
    pub fn total_listener_count(&self) -> usize {
        self.listeners.lock().unwrap().values().map(Vec::len).sum()
    }

    fn notify(&self, path: &str) {
        let snapshot = self.docs.lock().unwrap().get(path).cloned();
        let handlers: Vec<Arc<dyn Fn(Option<Value>) + Send + Sync>> = {
            let listeners = self.listeners.lock().unwrap();
            listeners
                .get(path)
                .map(|entries| entries.iter().map(|e| Arc::clone(&e.on_snapshot)).collect())
                .unwrap_or_default()
        };
        for handler in handlers {
            handler(snapshot.clone());
        }
    }

    fn check_write_allowed(&self, path: &str) -> Result<()> {
        if self.write_failures.lock().unwrap().contains(path) {
            return Err(EngineError::Transport(format!(
                "injected write failure for {}",
                path
            )));
        }
        Ok(())
    }
}

impl DocumentStore for MemoryStore {
    async fn get(&self, path: &str) -> Result<Option<Value>> {
        Ok(self.docs.lock().unwrap().get(path).cloned())
    }

    async fn set_merge(&self, path: &str, patch: Value) -> Result<()> {
        self.check_write_allowed(path)?;
        let Value::Object(patch) = patch else {
            return Err(EngineError::Validation(
                "merge patch must be a JSON object".to_string(),
            ));
        };
        {
            let mut docs = self.docs.lock().unwrap();
            let doc = docs
                .entry(path.to_string())
                .or_insert_with(|| Value::Object(Default::default()));
            if !doc.is_object() {
                *doc = Value::Object(Default::default());
            }
            let target = doc.as_object_mut().expect("document is an object");
            // Top-level fields replace wholesale; unnamed fields survive.
            for (field, value) in patch {
                target.insert(field, value);
            }
        }
        self.notify(path);
        Ok(())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.check_write_allowed(path)?;
        self.docs.lock().unwrap().remove(path);
        self.notify(path);
        Ok(())
    }

    fn subscribe(
        &self,
        path: &str,
        on_snapshot: SnapshotHandler,
        on_error: ErrorHandler,
    ) -> Subscription {
        let id = self.next_listener_id.fetch_add(1, Ordering::Relaxed);
        let on_snapshot: Arc<dyn Fn(Option<Value>) + Send + Sync> = Arc::from(on_snapshot);
        let on_error: Arc<dyn Fn(EngineError) + Send + Sync> = Arc::from(on_error);

        self.listeners
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push(ListenerEntry {
                id,
                on_snapshot: Arc::clone(&on_snapshot),
                on_error,
            });

        // Initial snapshot, delivered before the handle is returned: a
        // missing document is reported as `None`, not silence.
        let current = self.docs.lock().unwrap().get(path).cloned();
        on_snapshot(current);

        let listeners = Arc::clone(&self.listeners);
        let path = path.to_string();
        Subscription::new(move || {
            let mut listeners = listeners.lock().unwrap();
            if let Some(entries) = listeners.get_mut(&path) {
                entries.retain(|entry| entry.id != id);
                if entries.is_empty() {
                    listeners.remove(&path);
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn capture() -> (SnapshotHandler, Arc<Mutex<Vec<Option<Value>>>>) {
        let seen: Arc<Mutex<Vec<Option<Value>>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handler = Box::new(move |snapshot: Option<Value>| {
            sink.lock().unwrap().push(snapshot);
        });
        (handler, seen)
    }

    fn ignore_errors() -> ErrorHandler {
        Box::new(|_| {})
    }

    #[tokio::test]
    async fn merge_replaces_named_fields_and_keeps_others() {
        let store = MemoryStore::new();
        store
            .set_merge("a/b", json!({"events": {"e1": {"title": "x"}}, "meta": 1}))
            .await
            .unwrap();
        store
            .set_merge("a/b", json!({"events": {"e2": {"title": "y"}}}))
            .await
            .unwrap();

        let doc = store.get("a/b").await.unwrap().unwrap();
        // "events" replaced wholesale: e1 is gone, e2 present.
        assert!(doc["events"].get("e1").is_none());
        assert_eq!(doc["events"]["e2"]["title"], "y");
        assert_eq!(doc["meta"], 1);
    }

    #[tokio::test]
    async fn subscribe_delivers_initial_absent_snapshot() {
        let store = MemoryStore::new();
        let (handler, seen) = capture();
        let _sub = store.subscribe("missing/doc", handler, ignore_errors());

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].is_none());
    }

    #[tokio::test]
    async fn writes_notify_subscribers_with_whole_document() {
        let store = MemoryStore::new();
        let (handler, seen) = capture();
        let _sub = store.subscribe("a/b", handler, ignore_errors());

        store.set_merge("a/b", json!({"k": 1})).await.unwrap();
        store.set_merge("a/b", json!({"k": 2})).await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3); // initial + two writes
        assert_eq!(seen[2].as_ref().unwrap()["k"], 2);
    }

    #[tokio::test]
    async fn unsubscribe_stops_notifications_and_releases_listener() {
        let store = MemoryStore::new();
        let (handler, seen) = capture();
        let sub = store.subscribe("a/b", handler, ignore_errors());
        assert_eq!(store.listener_count("a/b"), 1);

        sub.unsubscribe();
        assert_eq!(store.listener_count("a/b"), 0);

        store.set_merge("a/b", json!({"k": 1})).await.unwrap();
        assert_eq!(seen.lock().unwrap().len(), 1); // initial only
    }

    #[tokio::test]
    async fn delete_notifies_with_absent_document() {
        let store = MemoryStore::new();
        store.set_merge("a/b", json!({"k": 1})).await.unwrap();

        let (handler, seen) = capture();
        let _sub = store.subscribe("a/b", handler, ignore_errors());
        store.delete("a/b").await.unwrap();

        let seen = seen.lock().unwrap();
        assert!(seen[0].is_some());
        assert!(seen[1].is_none());
    }

    #[tokio::test]
    async fn injected_write_failure_is_a_transport_error() {
        let store = MemoryStore::new();
        store.fail_writes_to("a/b");

        let result = store.set_merge("a/b", json!({"k": 1})).await;
        assert!(matches!(result, Err(EngineError::Transport(_))));

        store.clear_write_failures();
        assert!(store.set_merge("a/b", json!({"k": 1})).await.is_ok());
    }

    #[tokio::test]
    async fn injected_subscription_error_reaches_error_handler() {
        let store = MemoryStore::new();
        let errors: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&errors);
        let on_error = Box::new(move |err: EngineError| {
            sink.lock().unwrap().push(err.to_string());
        });
        let _sub = store.subscribe("a/b", Box::new(|_| {}), on_error);

        store.inject_subscription_error("a/b", "connection reset");
        let errors = errors.lock().unwrap();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("connection reset"));
    }
}
