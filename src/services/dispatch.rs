// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Notification dispatch collaborator.
//!
//! Delivery transport (push tokens, device routing) lives outside this
//! crate. The engine only needs to schedule a payload for a future instant,
//! fan a payload out to a group in one call, and cancel previously
//! scheduled notifications by correlation id.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::error::Result;

/// Notification content plus structured routing data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchPayload {
    pub title: String,
    pub body: String,
    /// Opaque key/value data forwarded with the notification (event id,
    /// activity id, admin routing hints).
    pub data: Map<String, Value>,
}

/// Result of a cancel-by-correlation-id call.
#[derive(Debug, Clone, Copy, Default)]
pub struct CancelResult {
    pub deleted_count: u32,
}

/// Scheduled-notification collaborator.
pub trait NotificationDispatch: Send + Sync + 'static {
    /// Schedule delivery to one user at `when_utc`.
    fn schedule_at(
        &self,
        user_id: &str,
        payload: &DispatchPayload,
        correlation_id: &str,
        when_utc: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Schedule delivery to a list of users at `when_utc` as ONE call, to
    /// bound dispatch latency and cost for shared calendars.
    fn schedule_batch_at(
        &self,
        user_ids: &[String],
        payload: &DispatchPayload,
        correlation_id: &str,
        when_utc: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Cancel everything scheduled under `correlation_id`.
    fn cancel_by_correlation_id(
        &self,
        correlation_id: &str,
    ) -> impl std::future::Future<Output = Result<CancelResult>> + Send;
}

/// Dispatch that logs and succeeds. For deployments without push delivery
/// and for benchmarks.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDispatch;

impl NotificationDispatch for NullDispatch {
    async fn schedule_at(
        &self,
        user_id: &str,
        payload: &DispatchPayload,
        correlation_id: &str,
        when_utc: DateTime<Utc>,
    ) -> Result<()> {
        tracing::debug!(
            user_id,
            correlation_id,
            title = %payload.title,
            when = %when_utc,
            "NullDispatch: schedule dropped"
        );
        Ok(())
    }

    async fn schedule_batch_at(
        &self,
        user_ids: &[String],
        payload: &DispatchPayload,
        correlation_id: &str,
        when_utc: DateTime<Utc>,
    ) -> Result<()> {
        tracing::debug!(
            recipients = user_ids.len(),
            correlation_id,
            title = %payload.title,
            when = %when_utc,
            "NullDispatch: batch schedule dropped"
        );
        Ok(())
    }

    async fn cancel_by_correlation_id(&self, _correlation_id: &str) -> Result<CancelResult> {
        Ok(CancelResult::default())
    }
}
