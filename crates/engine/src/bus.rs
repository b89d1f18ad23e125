// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Calendar change feed.
//!
//! The calendar server publishes one message per event mutation; the
//! bus loop translates each into the matching lifecycle operation. A
//! message that fails to process is logged and dropped, the loop keeps
//! consuming — alarm state for one event must never stall the feed for
//! every other event.

use crate::lifecycle::AlarmLifecycleEngine;
use calarm_core::Clock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;

/// One calendar mutation, as published by the calendar server.
///
/// `Request` is an attendee-initiated modification (scheduling
/// REQUEST); for alarm purposes it is an update of the event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CalendarMessage {
    Created { event_path: String, ics: String },
    Updated { event_path: String, ics: String },
    Request { event_path: String, ics: String },
    Deleted { event_path: String },
    Cancelled { event_path: String },
}

impl CalendarMessage {
    pub fn event_path(&self) -> &str {
        match self {
            Self::Created { event_path, .. }
            | Self::Updated { event_path, .. }
            | Self::Request { event_path, .. }
            | Self::Deleted { event_path }
            | Self::Cancelled { event_path } => event_path,
        }
    }
}

/// Consume the change feed until the sender side closes.
pub async fn run_bus<C: Clock>(
    engine: Arc<AlarmLifecycleEngine<C>>,
    mut rx: mpsc::Receiver<CalendarMessage>,
) {
    while let Some(message) = rx.recv().await {
        let event_path = message.event_path().to_string();
        let result = match &message {
            CalendarMessage::Created { event_path, ics } => {
                engine.on_event_created(event_path, ics).await.map(|_| ())
            }
            CalendarMessage::Updated { event_path, ics }
            | CalendarMessage::Request { event_path, ics } => {
                engine.on_event_updated(event_path, ics).await.map(|_| ())
            }
            CalendarMessage::Deleted { event_path } | CalendarMessage::Cancelled { event_path } => {
                engine.on_event_deleted(event_path).await.map(|_| ())
            }
        };
        if let Err(e) = result {
            tracing::error!(event_path, error = %e, "failed to process calendar message");
        }
    }
    tracing::debug!("calendar bus closed");
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
