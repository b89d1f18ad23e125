// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Email notification handler.
//!
//! The only built-in handler; DISPLAY and AUDIO actions are left to
//! client-side add-ons, so the engine registers no handler for them.

use crate::error::HandlerError;
use crate::handler::AlarmHandler;
use async_trait::async_trait;
use calarm_core::{Alarm, AlarmAction, CalendarSnapshot};

/// Port onto the platform's outbound mail service.
#[async_trait]
pub trait EmailGateway: Send + Sync + 'static {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), HandlerError>;
}

/// Sends one reminder email per fired EMAIL alarm.
pub struct EmailAlarmHandler<G: EmailGateway> {
    gateway: G,
}

impl<G: EmailGateway> EmailAlarmHandler<G> {
    pub fn new(gateway: G) -> Self {
        Self { gateway }
    }
}

/// Subject line from the stored snapshot's SUMMARY; the alarm still
/// fires with a generic subject when the snapshot carries none or no
/// longer parses.
fn subject_for(alarm: &Alarm) -> String {
    CalendarSnapshot::parse(&alarm.ics)
        .ok()
        .and_then(|snapshot| snapshot.event.summary)
        .map(|summary| format!("Reminder: {summary}"))
        .unwrap_or_else(|| "Reminder: Upcoming event".to_string())
}

#[async_trait]
impl<G: EmailGateway> AlarmHandler for EmailAlarmHandler<G> {
    fn unique_id(&self) -> &str {
        "email-notification"
    }

    fn action(&self) -> AlarmAction {
        AlarmAction::Email
    }

    async fn handle(&self, alarm: &Alarm) -> Result<(), HandlerError> {
        let Some(to) = alarm.attendee.as_deref() else {
            return Err(HandlerError::MissingAttendee(alarm.id.clone()));
        };
        let subject = subject_for(alarm);
        let body = format!(
            "Your event at {} is coming up (alarm due {}).",
            alarm.event_path, alarm.due_date
        );
        self.gateway.send(to, &subject, &body).await?;
        tracing::info!(alarm = %alarm.id, to, "reminder email sent");
        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{async_trait, EmailGateway, HandlerError};
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// One email captured by [`RecordingGateway`].
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct SentEmail {
        pub to: String,
        pub subject: String,
        pub body: String,
    }

    /// Gateway fake that records sends and fails on demand.
    #[derive(Clone, Default)]
    pub struct RecordingGateway {
        sent: Arc<Mutex<Vec<SentEmail>>>,
        fail_with: Arc<Mutex<Option<String>>>,
    }

    impl RecordingGateway {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn fail_with(&self, reason: impl Into<String>) {
            *self.fail_with.lock() = Some(reason.into());
        }

        pub fn sent(&self) -> Vec<SentEmail> {
            self.sent.lock().clone()
        }
    }

    #[async_trait]
    impl EmailGateway for RecordingGateway {
        async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), HandlerError> {
            if let Some(reason) = self.fail_with.lock().clone() {
                return Err(HandlerError::Failed(reason));
            }
            self.sent.lock().push(SentEmail {
                to: to.to_string(),
                subject: subject.to_string(),
                body: body.to_string(),
            });
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{RecordingGateway, SentEmail};

#[cfg(test)]
#[path = "email_tests.rs"]
mod tests;
