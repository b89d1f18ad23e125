// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory alarm store.

use crate::collection::Collection;
use crate::store::{AlarmStore, StoreError};
use async_trait::async_trait;
use calarm_core::{Alarm, AlarmConfig, AlarmId, AlarmState, Clock, SystemClock};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;

/// Map-backed store. The default backend for tests and the reference
/// for what every other backend must do.
#[derive(Clone)]
pub struct MemoryAlarmStore<C: Clock = SystemClock> {
    inner: Arc<Mutex<Collection>>,
    clock: C,
}

impl MemoryAlarmStore<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for MemoryAlarmStore<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> MemoryAlarmStore<C> {
    pub fn with_clock(clock: C) -> Self {
        Self { inner: Arc::new(Mutex::new(Collection::default())), clock }
    }
}

#[async_trait]
impl<C: Clock> AlarmStore for MemoryAlarmStore<C> {
    async fn create(&self, config: AlarmConfig) -> Result<Alarm, StoreError> {
        self.inner.lock().create(config, self.clock.now_utc())
    }

    async fn get(&self, id: &AlarmId) -> Result<Alarm, StoreError> {
        self.inner.lock().get(id)
    }

    async fn find_due(&self, now: DateTime<Utc>) -> Result<Vec<Alarm>, StoreError> {
        Ok(self.inner.lock().find_due(now))
    }

    async fn set_state(
        &self,
        id: &AlarmId,
        state: AlarmState,
        details: Option<String>,
    ) -> Result<Alarm, StoreError> {
        self.inner.lock().set_state(id, state, details, self.clock.now_utc())
    }

    async fn claim(&self, id: &AlarmId) -> Result<bool, StoreError> {
        Ok(self.inner.lock().claim(id, self.clock.now_utc()))
    }

    async fn remove_by_event_path(
        &self,
        event_path: &str,
        state_filter: Option<AlarmState>,
    ) -> Result<usize, StoreError> {
        Ok(self.inner.lock().remove_by_event_path(event_path, state_filter))
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
