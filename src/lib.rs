// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Hearth-Sync: sharded real-time sync and reminder scheduling engine.
//!
//! This crate keeps a locally cached, incrementally-expanding view of
//! calendar events and embedded activities stored in month-partitioned
//! remote documents, synchronized live across multiple calendars and
//! household entities, and idempotently (re)schedules absolute-time
//! reminder notifications whenever events or activities change.

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod services;
pub mod store;
pub mod sync;
pub mod time_utils;

use std::sync::Arc;

use config::EngineConfig;
use services::{
    CalendarProvider, EventService, NotificationDispatch, ReminderScheduler, TemplateService,
};
use store::{CollectionFamily, DocumentStore};
use sync::SubscriptionManager;

/// Shared engine state: one per app session.
///
/// Holds the store, dispatch, and provider collaborators plus the mutation
/// services. Views (subscription managers) are opened per screen and own
/// their subscriptions and cache independently, so several can run
/// concurrently against the same engine.
pub struct Engine<S, D, P> {
    config: EngineConfig,
    store: Arc<S>,
    events: EventService<S, D, P>,
    templates: TemplateService<S>,
}

impl<S, D, P> Engine<S, D, P>
where
    S: DocumentStore,
    D: NotificationDispatch,
    P: CalendarProvider,
{
    pub fn new(store: Arc<S>, dispatch: Arc<D>, provider: Arc<P>, config: EngineConfig) -> Self {
        let scheduler = ReminderScheduler::new(dispatch, &config);
        let events = EventService::new(Arc::clone(&store), provider, scheduler);
        let templates = TemplateService::new(Arc::clone(&store));
        Self {
            config,
            store,
            events,
            templates,
        }
    }

    /// Open an independent live view over one collection family. The caller
    /// owns the returned manager and must `close()` it (or drop it) when
    /// the view unmounts.
    pub fn open_view(&self, family: CollectionFamily) -> SubscriptionManager<S> {
        SubscriptionManager::new(Arc::clone(&self.store), family, self.config.clone())
    }

    pub fn events(&self) -> &EventService<S, D, P> {
        &self.events
    }

    pub fn templates(&self) -> &TemplateService<S> {
        &self.templates
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
