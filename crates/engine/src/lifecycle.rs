// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The alarm lifecycle engine.
//!
//! Event bus messages turn into alarm rows; cron ticks turn due rows
//! into handler dispatches plus (for recurring events) a fresh row for
//! the next occurrence. Per-alarm failures during a tick are isolated:
//! the batch always completes, and a claimed alarm is always driven to
//! Done or Error, never left Running by a caught failure.

use crate::dispatch::AlarmDispatchQueue;
use crate::error::EngineError;
use crate::handler::HandlerRegistry;
use calarm_core::{
    compute_next_due_date, Alarm, AlarmConfig, AlarmId, AlarmState, CalendarSnapshot, Clock,
    VAlarm,
};
use calarm_storage::AlarmStore;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Aggregated result of one cron tick.
#[derive(Debug, Default)]
pub struct TickSummary {
    /// Alarms driven to Done.
    pub fired: usize,
    /// Alarms another tick claimed first.
    pub skipped: usize,
    /// Alarms driven to Error, with the failure message.
    pub failed: Vec<(AlarmId, String)>,
}

enum ProcessOutcome {
    Fired,
    Skipped,
}

/// Orchestrates alarm creation, cancellation, discovery, dispatch, and
/// next-occurrence registration.
///
/// One engine instance per process; [`initialize`](Self::initialize)
/// enforces that explicitly instead of a module-level flag, so tests
/// can run independent instances side by side.
pub struct AlarmLifecycleEngine<C: Clock> {
    store: Arc<dyn AlarmStore>,
    registry: HandlerRegistry,
    dispatch: AlarmDispatchQueue,
    clock: C,
    allow_past_events: bool,
    initialized: AtomicBool,
}

impl<C: Clock> AlarmLifecycleEngine<C> {
    pub fn new(
        store: Arc<dyn AlarmStore>,
        registry: HandlerRegistry,
        dispatch: AlarmDispatchQueue,
        clock: C,
    ) -> Self {
        Self {
            store,
            registry,
            dispatch,
            clock,
            allow_past_events: false,
            initialized: AtomicBool::new(false),
        }
    }

    /// Schedule alarms for events whose start has already passed.
    /// Non-production bypass for exercising the fire path in tests.
    pub fn allow_past_events(mut self, allow: bool) -> Self {
        self.allow_past_events = allow;
        self
    }

    /// Create one durable queue worker per registered handler. Must be
    /// called exactly once before the first tick.
    pub async fn initialize(&self) -> Result<(), EngineError> {
        if self.initialized.swap(true, Ordering::SeqCst) {
            return Err(EngineError::AlreadyInitialized);
        }
        for handler in self.registry.all() {
            self.dispatch.create_worker(handler).await?;
        }
        Ok(())
    }

    /// A calendar event was created: register one alarm row per VALARM.
    ///
    /// Skips silently when the event carries no VALARMs or its start is
    /// already in the past. VALARMs with an unknown action or no
    /// trigger are skipped individually.
    pub async fn on_event_created(
        &self,
        event_path: &str,
        ics: &str,
    ) -> Result<Vec<Alarm>, EngineError> {
        let snapshot = CalendarSnapshot::parse(ics).map_err(|source| EngineError::Ical {
            event_path: event_path.to_string(),
            source,
        })?;
        let event = &snapshot.event;

        if event.valarms.is_empty() {
            tracing::debug!(event_path, "event has no alarms");
            return Ok(Vec::new());
        }
        if event.dtstart < self.clock.now_utc() && !self.allow_past_events {
            tracing::debug!(event_path, dtstart = %event.dtstart, "event start is in the past, skipping");
            return Ok(Vec::new());
        }

        let mut created = Vec::new();
        for valarm in &event.valarms {
            let Some(action) = valarm.action else {
                tracing::warn!(event_path, "skipping VALARM with unsupported action");
                continue;
            };
            let Some(trigger) = valarm.trigger else {
                tracing::warn!(event_path, %action, "skipping VALARM without trigger");
                continue;
            };

            let due_date = event.dtstart + trigger.to_chrono();
            let mut config = AlarmConfig::new(action, event_path, &event.uid, due_date, ics);
            if let Some(attendee) = &valarm.attendee {
                config = config.attendee(attendee.clone());
            }
            let alarm = self.store.create(config).await?;
            tracing::info!(alarm = %alarm.id, event_path, %action, due = %due_date, "alarm registered");
            created.push(alarm);
        }
        Ok(created)
    }

    /// A calendar event was updated: cancel its pending alarms and
    /// re-derive from the new definition. Already-fired rows are
    /// history and stay untouched. When the cancellation fails, the
    /// update is aborted before any creation, so no duplicates pile up
    /// on top of an inconsistent deletion.
    pub async fn on_event_updated(
        &self,
        event_path: &str,
        ics: &str,
    ) -> Result<Vec<Alarm>, EngineError> {
        let removed =
            self.store.remove_by_event_path(event_path, Some(AlarmState::Waiting)).await?;
        tracing::debug!(event_path, removed, "cancelled pending alarms for updated event");
        self.on_event_created(event_path, ics).await
    }

    /// A calendar event was deleted or cancelled: drop every alarm row
    /// for it, fired history included.
    pub async fn on_event_deleted(&self, event_path: &str) -> Result<usize, EngineError> {
        let removed = self.store.remove_by_event_path(event_path, None).await?;
        tracing::info!(event_path, removed, "removed alarms for deleted event");
        Ok(removed)
    }

    /// One cron tick at the engine clock's current instant.
    pub async fn run_tick(&self) -> Result<TickSummary, EngineError> {
        self.process_due_alarms(self.clock.now_utc()).await
    }

    /// Discover and fire every alarm due at `now`.
    ///
    /// Alarms are processed concurrently and independently; the
    /// per-alarm results are settled into the summary so one failure
    /// never aborts its siblings.
    pub async fn process_due_alarms(&self, now: DateTime<Utc>) -> Result<TickSummary, EngineError> {
        let due = self.store.find_due(now).await?;
        if due.is_empty() {
            return Ok(TickSummary::default());
        }
        tracing::debug!(count = due.len(), %now, "processing due alarms");

        let results = futures_util::future::join_all(due.into_iter().map(|alarm| {
            let id = alarm.id.clone();
            async move { (id, self.process_one(alarm).await) }
        }))
        .await;

        let mut summary = TickSummary::default();
        for (id, result) in results {
            match result {
                Ok(ProcessOutcome::Fired) => summary.fired += 1,
                Ok(ProcessOutcome::Skipped) => summary.skipped += 1,
                Err(e) => {
                    tracing::error!(alarm = %id, error = %e, "alarm processing failed");
                    summary.failed.push((id, e.to_string()));
                }
            }
        }
        tracing::info!(
            fired = summary.fired,
            skipped = summary.skipped,
            failed = summary.failed.len(),
            "tick complete"
        );
        Ok(summary)
    }

    /// Drive one claimed alarm to a terminal state.
    async fn process_one(&self, alarm: Alarm) -> Result<ProcessOutcome, EngineError> {
        if !self.store.claim(&alarm.id).await? {
            tracing::debug!(alarm = %alarm.id, "already claimed by a concurrent tick, skipping");
            return Ok(ProcessOutcome::Skipped);
        }

        match self.fire(&alarm).await {
            Ok(()) => {
                self.store.set_state(&alarm.id, AlarmState::Done, None).await?;
                Ok(ProcessOutcome::Fired)
            }
            Err(e) => {
                // Never leave a claimed row Running; record the failure
                // and re-raise into the tick's settled results.
                let details = e.to_string();
                if let Err(mark) =
                    self.store.set_state(&alarm.id, AlarmState::Error, Some(details)).await
                {
                    tracing::error!(alarm = %alarm.id, error = %mark, "failed to mark alarm as errored");
                }
                Err(e)
            }
        }
    }

    /// Dispatch to every registered handler, then register the next
    /// occurrence. Dispatch failures are logged and do not block the
    /// next-occurrence registration or the alarm's own transition to
    /// Done — delivery retries belong to the durable queue.
    async fn fire(&self, alarm: &Alarm) -> Result<(), EngineError> {
        let handlers = self.registry.handlers_for(alarm.action);
        if handlers.is_empty() {
            tracing::warn!(alarm = %alarm.id, action = %alarm.action, "no handlers registered for action");
        }
        for handler in &handlers {
            if let Err(e) = self.dispatch.enqueue(alarm, handler).await {
                tracing::warn!(
                    alarm = %alarm.id,
                    handler = handler.unique_id(),
                    error = %e,
                    "dispatch enqueue failed"
                );
            }
        }
        self.register_next_occurrence(alarm).await
    }

    /// Compute and persist the successor row of a recurring alarm.
    ///
    /// A store failure here breaks the recurring chain for this
    /// occurrence only (no backfill); it surfaces as the alarm's Error
    /// details. A snapshot that no longer parses ends the sequence
    /// like an exhausted rule would.
    async fn register_next_occurrence(&self, alarm: &Alarm) -> Result<(), EngineError> {
        let snapshot = match CalendarSnapshot::parse(&alarm.ics) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(alarm = %alarm.id, error = %e, "stored snapshot unparseable, ending sequence");
                return Ok(());
            }
        };
        let Some(valarm) = pick_valarm(&snapshot, alarm) else {
            return Ok(());
        };

        match compute_next_due_date(&snapshot.event, valarm, Some(alarm.due_date)) {
            Some(next_due) => {
                let next = self.store.create(alarm.successor(next_due)).await?;
                tracing::info!(
                    alarm = %alarm.id,
                    next = %next.id,
                    due = %next_due,
                    "registered next occurrence"
                );
            }
            None => {
                tracing::debug!(alarm = %alarm.id, "no further occurrences");
            }
        }
        Ok(())
    }
}

/// The VALARM that produced this alarm row: first one matching the
/// row's action. Rows don't record which VALARM spawned them, so with
/// several same-action VALARMs on one event the first wins; each of
/// those VALARMs produced its own row at creation time, all carrying
/// the same snapshot.
fn pick_valarm<'a>(snapshot: &'a CalendarSnapshot, alarm: &Alarm) -> Option<&'a VAlarm> {
    snapshot.event.valarms.iter().find(|v| v.action == Some(alarm.action))
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
