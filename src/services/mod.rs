// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - mutation and scheduling logic.

pub mod dispatch;
pub mod events;
pub mod provider;
pub mod reminders;
pub mod templates;

pub use dispatch::{CancelResult, DispatchPayload, NotificationDispatch, NullDispatch};
pub use events::{DeleteOutcome, EventService, SaveOutcome};
pub use provider::{CalendarProvider, NullProvider};
pub use reminders::{ReminderOutcome, ReminderRequest, ReminderScheduler, ReminderScope};
pub use templates::TemplateService;
