// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use hearth_sync::config::EngineConfig;
use hearth_sync::error::{EngineError, Result};
use hearth_sync::models::{CalendarId, Event};
use hearth_sync::services::{
    CalendarProvider, CancelResult, DispatchPayload, NotificationDispatch,
};
use hearth_sync::store::MemoryStore;
use hearth_sync::Engine;

/// One recorded dispatch interaction.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub enum DispatchCall {
    Schedule {
        user_id: String,
        correlation_id: String,
        when: DateTime<Utc>,
        title: String,
    },
    ScheduleBatch {
        user_ids: Vec<String>,
        correlation_id: String,
        when: DateTime<Utc>,
        title: String,
    },
    Cancel {
        correlation_id: String,
    },
}

/// Dispatch collaborator that records every call and tracks live
/// reminders per correlation id.
#[derive(Default)]
pub struct RecordingDispatch {
    calls: Mutex<Vec<DispatchCall>>,
    live: Mutex<HashMap<String, u32>>,
    fail_schedules: Mutex<bool>,
    fail_cancels: Mutex<bool>,
}

#[allow(dead_code)]
impl RecordingDispatch {
    pub fn calls(&self) -> Vec<DispatchCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Live (scheduled, not cancelled) reminders under one correlation id.
    pub fn live_count(&self, correlation_id: &str) -> u32 {
        self.live
            .lock()
            .unwrap()
            .get(correlation_id)
            .copied()
            .unwrap_or(0)
    }

    pub fn schedule_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| {
                matches!(
                    c,
                    DispatchCall::Schedule { .. } | DispatchCall::ScheduleBatch { .. }
                )
            })
            .count()
    }

    /// Fire times of every schedule call for one correlation id.
    pub fn scheduled_times(&self, correlation_id: &str) -> Vec<DateTime<Utc>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|c| match c {
                DispatchCall::Schedule {
                    correlation_id: id,
                    when,
                    ..
                }
                | DispatchCall::ScheduleBatch {
                    correlation_id: id,
                    when,
                    ..
                } if id == correlation_id => Some(*when),
                _ => None,
            })
            .collect()
    }

    pub fn set_fail_schedules(&self, fail: bool) {
        *self.fail_schedules.lock().unwrap() = fail;
    }

    pub fn set_fail_cancels(&self, fail: bool) {
        *self.fail_cancels.lock().unwrap() = fail;
    }
}

impl NotificationDispatch for RecordingDispatch {
    async fn schedule_at(
        &self,
        user_id: &str,
        payload: &DispatchPayload,
        correlation_id: &str,
        when_utc: DateTime<Utc>,
    ) -> Result<()> {
        if *self.fail_schedules.lock().unwrap() {
            return Err(EngineError::Transport("dispatch unavailable".to_string()));
        }
        self.calls.lock().unwrap().push(DispatchCall::Schedule {
            user_id: user_id.to_string(),
            correlation_id: correlation_id.to_string(),
            when: when_utc,
            title: payload.title.clone(),
        });
        *self
            .live
            .lock()
            .unwrap()
            .entry(correlation_id.to_string())
            .or_insert(0) += 1;
        Ok(())
    }

    async fn schedule_batch_at(
        &self,
        user_ids: &[String],
        payload: &DispatchPayload,
        correlation_id: &str,
        when_utc: DateTime<Utc>,
    ) -> Result<()> {
        if *self.fail_schedules.lock().unwrap() {
            return Err(EngineError::Transport("dispatch unavailable".to_string()));
        }
        self.calls
            .lock()
            .unwrap()
            .push(DispatchCall::ScheduleBatch {
                user_ids: user_ids.to_vec(),
                correlation_id: correlation_id.to_string(),
                when: when_utc,
                title: payload.title.clone(),
            });
        *self
            .live
            .lock()
            .unwrap()
            .entry(correlation_id.to_string())
            .or_insert(0) += 1;
        Ok(())
    }

    async fn cancel_by_correlation_id(&self, correlation_id: &str) -> Result<CancelResult> {
        if *self.fail_cancels.lock().unwrap() {
            return Err(EngineError::Transport("dispatch unavailable".to_string()));
        }
        self.calls.lock().unwrap().push(DispatchCall::Cancel {
            correlation_id: correlation_id.to_string(),
        });
        let deleted = self
            .live
            .lock()
            .unwrap()
            .remove(correlation_id)
            .unwrap_or(0);
        Ok(CancelResult {
            deleted_count: deleted,
        })
    }
}

/// Provider collaborator recording write-through calls.
#[derive(Default)]
pub struct RecordingProvider {
    calls: Mutex<Vec<String>>,
    fail: Mutex<bool>,
}

#[allow(dead_code)]
impl RecordingProvider {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn set_fail(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }

    fn record(&self, op: &str, calendar: &CalendarId, event_id: &str) -> Result<()> {
        if *self.fail.lock().unwrap() {
            return Err(EngineError::Transport("provider unavailable".to_string()));
        }
        self.calls
            .lock()
            .unwrap()
            .push(format!("{}:{}:{}", op, calendar, event_id));
        Ok(())
    }
}

impl CalendarProvider for RecordingProvider {
    async fn create_event(&self, calendar: &CalendarId, event: &Event) -> Result<()> {
        self.record("create", calendar, &event.id)
    }

    async fn update_event(&self, calendar: &CalendarId, event: &Event) -> Result<()> {
        self.record("update", calendar, &event.id)
    }

    async fn delete_event(&self, calendar: &CalendarId, event_id: &str) -> Result<()> {
        self.record("delete", calendar, event_id)
    }
}

/// Everything a test needs: the engine plus handles to its collaborators.
#[allow(dead_code)]
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub dispatch: Arc<RecordingDispatch>,
    pub provider: Arc<RecordingProvider>,
    pub engine: Engine<MemoryStore, RecordingDispatch, RecordingProvider>,
}

#[allow(dead_code)]
pub fn test_engine() -> TestContext {
    let store = Arc::new(MemoryStore::new());
    let dispatch = Arc::new(RecordingDispatch::default());
    let provider = Arc::new(RecordingProvider::default());
    let engine = Engine::new(
        Arc::clone(&store),
        Arc::clone(&dispatch),
        Arc::clone(&provider),
        EngineConfig::default(),
    );
    TestContext {
        store,
        dispatch,
        provider,
        engine,
    }
}
