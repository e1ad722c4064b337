// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reminder scheduling service.
//!
//! The core operation is `reconcile`: cancel whatever is live under an
//! identity, then derive and schedule the replacement. The two steps are
//! sequenced cancel-before-schedule inside one call, and a cancel failure
//! is non-fatal to the schedule attempt. Fire times at or before "now" are
//! silently skipped; that is the contract, not a bug.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures_util::{stream, StreamExt};

use crate::config::EngineConfig;
use crate::models::reminder::is_dispatchable;
use crate::services::dispatch::{DispatchPayload, NotificationDispatch};

/// Who a reminder reaches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderScope {
    /// The owning user only.
    Personal { user_id: String },
    /// Every group member except the acting user, in one batch call.
    Group {
        actor_id: String,
        member_ids: Vec<String>,
    },
}

impl ReminderScope {
    pub fn personal(user_id: impl Into<String>) -> Self {
        ReminderScope::Personal {
            user_id: user_id.into(),
        }
    }

    pub fn group(actor_id: impl Into<String>, member_ids: Vec<String>) -> Self {
        ReminderScope::Group {
            actor_id: actor_id.into(),
            member_ids,
        }
    }

    fn recipients(&self) -> Vec<String> {
        match self {
            ReminderScope::Personal { user_id } => vec![user_id.clone()],
            ReminderScope::Group {
                actor_id,
                member_ids,
            } => member_ids
                .iter()
                .filter(|id| *id != actor_id)
                .cloned()
                .collect(),
        }
    }
}

/// A fully derived reminder ready for dispatch.
#[derive(Debug, Clone)]
pub struct ReminderRequest {
    pub payload: DispatchPayload,
    pub fire_at: DateTime<Utc>,
}

/// What `reconcile` did. `warning` is set when dispatch failed; the data
/// mutation that triggered the reconcile is NOT rolled back in that case.
#[derive(Debug, Clone, Default)]
pub struct ReminderOutcome {
    pub scheduled: bool,
    pub skipped: bool,
    pub warning: Option<String>,
}

impl ReminderOutcome {
    fn scheduled() -> Self {
        Self {
            scheduled: true,
            ..Default::default()
        }
    }

    fn skipped() -> Self {
        Self {
            skipped: true,
            ..Default::default()
        }
    }

    fn warned(message: String) -> Self {
        Self {
            warning: Some(message),
            ..Default::default()
        }
    }
}

/// Idempotent cancel-then-schedule over a [`NotificationDispatch`].
pub struct ReminderScheduler<D> {
    dispatch: Arc<D>,
    max_concurrent_cancel: usize,
}

impl<D: NotificationDispatch> ReminderScheduler<D> {
    pub fn new(dispatch: Arc<D>, config: &EngineConfig) -> Self {
        Self {
            dispatch,
            max_concurrent_cancel: config.max_concurrent_dispatch,
        }
    }

    /// Cancel by identity, then schedule `request` if it is still in the
    /// future. `request = None` is a pure cancel.
    pub async fn reconcile(
        &self,
        identity: &str,
        request: Option<ReminderRequest>,
        scope: &ReminderScope,
    ) -> ReminderOutcome {
        if let Err(err) = self.dispatch.cancel_by_correlation_id(identity).await {
            // A failed cancel must not block the replacement schedule.
            tracing::warn!(identity, error = %err, "Reminder cancel failed");
        }

        let Some(request) = request else {
            return ReminderOutcome::default();
        };

        if !is_dispatchable(request.fire_at, Utc::now()) {
            tracing::debug!(identity, fire_at = %request.fire_at, "Reminder fire time in the past, skipping");
            return ReminderOutcome::skipped();
        }

        let recipients = scope.recipients();
        if recipients.is_empty() {
            tracing::debug!(identity, "Reminder has no recipients, skipping");
            return ReminderOutcome::skipped();
        }

        let result = match scope {
            ReminderScope::Personal { user_id } => {
                self.dispatch
                    .schedule_at(user_id, &request.payload, identity, request.fire_at)
                    .await
            }
            ReminderScope::Group { .. } => {
                self.dispatch
                    .schedule_batch_at(&recipients, &request.payload, identity, request.fire_at)
                    .await
            }
        };

        match result {
            Ok(()) => {
                tracing::debug!(
                    identity,
                    recipients = recipients.len(),
                    fire_at = %request.fire_at,
                    "Reminder scheduled"
                );
                ReminderOutcome::scheduled()
            }
            Err(err) => {
                tracing::warn!(identity, error = %err, "Reminder schedule failed");
                ReminderOutcome::warned(format!("reminder for {} not scheduled: {}", identity, err))
            }
        }
    }

    /// Cancel a batch of identities with bounded concurrency. Returns a
    /// warning summary if any cancel failed.
    pub async fn cancel_all(&self, identities: Vec<String>) -> Option<String> {
        if identities.is_empty() {
            return None;
        }

        let failed = Arc::new(tokio::sync::Mutex::new(Vec::new()));

        stream::iter(identities)
            .for_each_concurrent(self.max_concurrent_cancel, |identity| {
                let failed = Arc::clone(&failed);
                async move {
                    if let Err(err) = self.dispatch.cancel_by_correlation_id(&identity).await {
                        tracing::warn!(identity = %identity, error = %err, "Reminder cancel failed");
                        failed.lock().await.push(identity);
                    }
                }
            })
            .await;

        let failed = Arc::try_unwrap(failed)
            .expect("All cancels completed, should have sole ownership")
            .into_inner();
        if failed.is_empty() {
            None
        } else {
            Some(format!("reminders not cancelled: {}", failed.join(", ")))
        }
    }
}
