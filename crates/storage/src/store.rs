// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `AlarmStore` persistence contract.

use async_trait::async_trait;
use calarm_core::{Alarm, AlarmConfig, AlarmId, AlarmState};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A required field is absent or empty on a create payload.
    #[error("validation failed: missing required field '{field}'")]
    Validation { field: &'static str },

    /// No row with the given id.
    #[error("alarm {0} not found")]
    NotFound(AlarmId),

    /// The requested state change violates Waiting → Running → {Done | Error}.
    #[error("illegal state transition {from} -> {to} for alarm {id}")]
    InvalidTransition { id: AlarmId, from: AlarmState, to: AlarmState },

    /// Backend I/O failure.
    #[error("store i/o failed: {0}")]
    Io(#[from] std::io::Error),

    /// Backend (de)serialization failure.
    #[error("store serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Persistence abstraction over the alarm collection.
///
/// Writes are per-row and commute across alarms; no multi-row
/// transactions are required. `claim` is the one conditional update,
/// needed so overlapping cron ticks cannot double-fire a row.
#[async_trait]
pub trait AlarmStore: Send + Sync + 'static {
    /// Insert a new row with default state Waiting. Fails with
    /// [`StoreError::Validation`] when a required field is absent.
    async fn create(&self, config: AlarmConfig) -> Result<Alarm, StoreError>;

    /// Fetch a single row by id.
    async fn get(&self, id: &AlarmId) -> Result<Alarm, StoreError>;

    /// All Waiting rows with `due_date <= now`, sorted by due date
    /// ascending (id as tiebreak for test stability).
    async fn find_due(&self, now: DateTime<Utc>) -> Result<Vec<Alarm>, StoreError>;

    /// Persist a new state (and optional details) for one row,
    /// rejecting non-monotonic transitions.
    async fn set_state(
        &self,
        id: &AlarmId,
        state: AlarmState,
        details: Option<String>,
    ) -> Result<Alarm, StoreError>;

    /// Conditional Waiting → Running compare-and-swap. Returns `false`
    /// when the row is no longer Waiting (or no longer exists): some
    /// other tick already claimed it, skip.
    async fn claim(&self, id: &AlarmId) -> Result<bool, StoreError>;

    /// Delete rows for an event path, optionally restricted to one
    /// state (pass `Some(Waiting)` to cancel pending alarms while
    /// leaving already-fired history intact). Returns the count
    /// removed; a repeat call is a no-op returning zero.
    async fn remove_by_event_path(
        &self,
        event_path: &str,
        state_filter: Option<AlarmState>,
    ) -> Result<usize, StoreError>;
}
