// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Alarm entity and lifecycle state machine.
//!
//! One `Alarm` row represents exactly one future firing of one
//! `(event, trigger)` pair. Recurring events get a fresh row per
//! occurrence; the due date of an existing row is never rewritten.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for an alarm row, assigned by the store on creation.
    pub struct AlarmId("alm-");
}

/// Notification channel of an alarm (the iCalendar VALARM ACTION).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlarmAction {
    Email,
    Display,
    Audio,
}

impl AlarmAction {
    /// Parse an iCalendar ACTION property value (case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "EMAIL" => Some(AlarmAction::Email),
            "DISPLAY" => Some(AlarmAction::Display),
            "AUDIO" => Some(AlarmAction::Audio),
            _ => None,
        }
    }

    /// Whether this action delivers through a recipient-bound channel,
    /// making the attendee field mandatory.
    pub fn requires_attendee(&self) -> bool {
        matches!(self, AlarmAction::Email)
    }
}

crate::simple_display! {
    AlarmAction {
        Email => "EMAIL",
        Display => "DISPLAY",
        Audio => "AUDIO",
    }
}

/// Lifecycle state of one alarm row.
///
/// Transitions are strictly monotonic: Waiting → Running → {Done | Error}.
/// Done and Error are terminal; a row never returns to Waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlarmState {
    Waiting,
    Running,
    Done,
    Error,
}

impl AlarmState {
    /// Whether a transition from `self` to `next` is legal.
    pub fn accepts(&self, next: AlarmState) -> bool {
        matches!(
            (self, next),
            (AlarmState::Waiting, AlarmState::Running)
                | (AlarmState::Running, AlarmState::Done)
                | (AlarmState::Running, AlarmState::Error)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AlarmState::Done | AlarmState::Error)
    }
}

crate::simple_display! {
    AlarmState {
        Waiting => "waiting",
        Running => "running",
        Done => "done",
        Error => "error",
    }
}

/// Create payload for a new alarm row: everything except identity,
/// state, details, and timestamps, which the store assigns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlarmConfig {
    pub action: AlarmAction,
    pub attendee: Option<String>,
    pub event_path: String,
    pub event_uid: String,
    pub due_date: DateTime<Utc>,
    /// Serialized vcalendar snapshot taken when the alarm was scheduled.
    /// Used to recompute the next occurrence and to render notification
    /// content without re-fetching the event.
    pub ics: String,
    pub context: Option<serde_json::Value>,
}

impl AlarmConfig {
    pub fn new(
        action: AlarmAction,
        event_path: impl Into<String>,
        event_uid: impl Into<String>,
        due_date: DateTime<Utc>,
        ics: impl Into<String>,
    ) -> Self {
        Self {
            action,
            attendee: None,
            event_path: event_path.into(),
            event_uid: event_uid.into(),
            due_date,
            ics: ics.into(),
            context: None,
        }
    }

    crate::setters! {
        option {
            attendee: String,
            context: serde_json::Value,
        }
    }
}

/// A scheduled alarm row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alarm {
    pub id: AlarmId,
    pub action: AlarmAction,
    pub attendee: Option<String>,
    pub event_path: String,
    pub event_uid: String,
    /// Absolute UTC instant at which the alarm must fire.
    /// Immutable after creation; to change it, the row is replaced.
    pub due_date: DateTime<Utc>,
    pub ics: String,
    pub state: AlarmState,
    /// Diagnostic message, set when the row reaches Error.
    pub details: Option<String>,
    /// Opaque handler-specific payload.
    pub context: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Alarm {
    /// Materialize a new Waiting row from a create payload.
    pub fn from_config(config: AlarmConfig, id: AlarmId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            action: config.action,
            attendee: config.attendee,
            event_path: config.event_path,
            event_uid: config.event_uid,
            due_date: config.due_date,
            ics: config.ics,
            state: AlarmState::Waiting,
            details: None,
            context: config.context,
            created_at: now,
            updated_at: now,
        }
    }

    /// Clone the event-bound fields into a create payload for the next
    /// occurrence, discarding identity, state, and timestamps.
    pub fn successor(&self, due_date: DateTime<Utc>) -> AlarmConfig {
        AlarmConfig {
            action: self.action,
            attendee: self.attendee.clone(),
            event_path: self.event_path.clone(),
            event_uid: self.event_uid.clone(),
            due_date,
            ics: self.ics.clone(),
            context: self.context.clone(),
        }
    }
}

crate::builder! {
    pub struct AlarmBuilder => Alarm {
        into {
            event_path: String = "/calendars/user1/events/evt1.ics",
            event_uid: String = "uid-1",
            ics: String = "",
        }
        set {
            action: AlarmAction = AlarmAction::Email,
            state: AlarmState = AlarmState::Waiting,
            due_date: DateTime<Utc> = DateTime::<Utc>::UNIX_EPOCH,
        }
        option {
            attendee: String = Some("user1@example.com".to_string()),
            details: String = None,
            context: serde_json::Value = None,
        }
        computed {
            id: AlarmId = AlarmId::new(),
            created_at: DateTime<Utc> = DateTime::<Utc>::UNIX_EPOCH,
            updated_at: DateTime<Utc> = DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

#[cfg(test)]
#[path = "alarm_tests.rs"]
mod tests;
