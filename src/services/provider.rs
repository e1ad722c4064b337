// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! External calendar provider write-through.
//!
//! For provider-backed calendars the remote calendar is the source of
//! truth and the shard document is a local mirror: the provider call runs
//! BEFORE the shard write, and a provider failure aborts the mutation so
//! the mirror never diverges ahead of the origin.

use crate::error::Result;
use crate::models::{CalendarId, Event};

/// Remote calendar write operations.
pub trait CalendarProvider: Send + Sync + 'static {
    fn create_event(
        &self,
        calendar: &CalendarId,
        event: &Event,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    fn update_event(
        &self,
        calendar: &CalendarId,
        event: &Event,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    fn delete_event(
        &self,
        calendar: &CalendarId,
        event_id: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Provider for deployments with no external calendars; every call is a
/// logged no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProvider;

impl CalendarProvider for NullProvider {
    async fn create_event(&self, calendar: &CalendarId, event: &Event) -> Result<()> {
        tracing::debug!(calendar = %calendar, event_id = %event.id, "NullProvider: create ignored");
        Ok(())
    }

    async fn update_event(&self, calendar: &CalendarId, event: &Event) -> Result<()> {
        tracing::debug!(calendar = %calendar, event_id = %event.id, "NullProvider: update ignored");
        Ok(())
    }

    async fn delete_event(&self, calendar: &CalendarId, event_id: &str) -> Result<()> {
        tracing::debug!(calendar = %calendar, event_id, "NullProvider: delete ignored");
        Ok(())
    }
}
