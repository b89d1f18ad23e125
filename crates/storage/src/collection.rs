// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared row operations over an in-memory alarm map.
//!
//! Both backends keep the working set in memory; the JSON backend
//! additionally persists after every mutation. The map operations and
//! validation live here so the two stay behaviorally identical.

use crate::store::StoreError;
use calarm_core::{Alarm, AlarmConfig, AlarmId, AlarmState};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub(crate) struct Collection {
    rows: HashMap<AlarmId, Alarm>,
}

impl Collection {
    pub(crate) fn from_rows(rows: Vec<Alarm>) -> Self {
        Self { rows: rows.into_iter().map(|a| (a.id.clone(), a)).collect() }
    }

    pub(crate) fn rows(&self) -> Vec<Alarm> {
        self.rows.values().cloned().collect()
    }

    pub(crate) fn create(
        &mut self,
        config: AlarmConfig,
        now: DateTime<Utc>,
    ) -> Result<Alarm, StoreError> {
        validate(&config)?;
        let alarm = Alarm::from_config(config, AlarmId::new(), now);
        self.rows.insert(alarm.id.clone(), alarm.clone());
        Ok(alarm)
    }

    pub(crate) fn get(&self, id: &AlarmId) -> Result<Alarm, StoreError> {
        self.rows.get(id).cloned().ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    pub(crate) fn find_due(&self, now: DateTime<Utc>) -> Vec<Alarm> {
        let mut due: Vec<Alarm> = self
            .rows
            .values()
            .filter(|a| a.state == AlarmState::Waiting && a.due_date <= now)
            .cloned()
            .collect();
        due.sort_by(|a, b| {
            a.due_date.cmp(&b.due_date).then_with(|| a.id.as_str().cmp(b.id.as_str()))
        });
        due
    }

    pub(crate) fn set_state(
        &mut self,
        id: &AlarmId,
        state: AlarmState,
        details: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Alarm, StoreError> {
        let alarm = self.rows.get_mut(id).ok_or_else(|| StoreError::NotFound(id.clone()))?;
        if !alarm.state.accepts(state) {
            return Err(StoreError::InvalidTransition { id: id.clone(), from: alarm.state, to: state });
        }
        alarm.state = state;
        if details.is_some() {
            alarm.details = details;
        }
        alarm.updated_at = now;
        Ok(alarm.clone())
    }

    pub(crate) fn claim(&mut self, id: &AlarmId, now: DateTime<Utc>) -> bool {
        match self.rows.get_mut(id) {
            Some(alarm) if alarm.state == AlarmState::Waiting => {
                alarm.state = AlarmState::Running;
                alarm.updated_at = now;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn remove_by_event_path(
        &mut self,
        event_path: &str,
        state_filter: Option<AlarmState>,
    ) -> usize {
        let before = self.rows.len();
        self.rows.retain(|_, a| {
            a.event_path != event_path || state_filter.is_some_and(|s| a.state != s)
        });
        before - self.rows.len()
    }
}

fn validate(config: &AlarmConfig) -> Result<(), StoreError> {
    if config.event_path.is_empty() {
        return Err(StoreError::Validation { field: "event_path" });
    }
    if config.event_uid.is_empty() {
        return Err(StoreError::Validation { field: "event_uid" });
    }
    if config.ics.is_empty() {
        return Err(StoreError::Validation { field: "ics" });
    }
    if config.action.requires_attendee()
        && config.attendee.as_deref().map_or(true, str::is_empty)
    {
        return Err(StoreError::Validation { field: "attendee" });
    }
    Ok(())
}
