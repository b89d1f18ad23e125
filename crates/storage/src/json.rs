// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON document file alarm store.
//!
//! Single-node stand-in for the platform document store: the whole
//! collection is one JSON array on disk, rewritten through a temp file
//! and atomic rename on every mutation, reloaded on open. Good enough
//! for the write rates alarms see (a handful of rows per event).

use crate::collection::Collection;
use crate::store::{AlarmStore, StoreError};
use async_trait::async_trait;
use calarm_core::{Alarm, AlarmConfig, AlarmId, AlarmState, Clock, SystemClock};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Clone)]
pub struct JsonAlarmStore<C: Clock = SystemClock> {
    path: PathBuf,
    inner: Arc<Mutex<Collection>>,
    clock: C,
}

impl JsonAlarmStore<SystemClock> {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        Self::open_with_clock(path, SystemClock)
    }
}

impl<C: Clock> JsonAlarmStore<C> {
    pub fn open_with_clock(path: impl Into<PathBuf>, clock: C) -> Result<Self, StoreError> {
        let path = path.into();
        let collection = match std::fs::read(&path) {
            Ok(bytes) => {
                let rows: Vec<Alarm> = serde_json::from_slice(&bytes)?;
                tracing::debug!(path = %path.display(), rows = rows.len(), "loaded alarm collection");
                Collection::from_rows(rows)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Collection::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, inner: Arc::new(Mutex::new(collection)), clock })
    }

    /// Write the collection through a temp file and rename, so a crash
    /// mid-write never leaves a truncated document behind.
    fn persist(path: &Path, collection: &Collection) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(&collection.rows())?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

#[async_trait]
impl<C: Clock> AlarmStore for JsonAlarmStore<C> {
    async fn create(&self, config: AlarmConfig) -> Result<Alarm, StoreError> {
        let mut inner = self.inner.lock();
        let alarm = inner.create(config, self.clock.now_utc())?;
        Self::persist(&self.path, &inner)?;
        Ok(alarm)
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
        let mut inner = self.inner.lock();
        let alarm = inner.set_state(id, state, details, self.clock.now_utc())?;
        Self::persist(&self.path, &inner)?;
        Ok(alarm)
    }

    async fn claim(&self, id: &AlarmId) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock();
        let claimed = inner.claim(id, self.clock.now_utc());
        if claimed {
            Self::persist(&self.path, &inner)?;
        }
        Ok(claimed)
    }

    async fn remove_by_event_path(
        &self,
        event_path: &str,
        state_filter: Option<AlarmState>,
    ) -> Result<usize, StoreError> {
        let mut inner = self.inner.lock();
        let removed = inner.remove_by_event_path(event_path, state_filter);
        if removed > 0 {
            Self::persist(&self.path, &inner)?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
#[path = "json_tests.rs"]
mod tests;
