// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the engine crate.

use calarm_core::{AlarmId, IcalError};
use calarm_storage::StoreError;
use thiserror::Error;

/// A handler's `handle` invocation failed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HandlerError {
    #[error("handler failed: {0}")]
    Failed(String),

    /// The alarm targets a recipient-bound channel but carries no attendee.
    #[error("alarm {0} has no attendee")]
    MissingAttendee(AlarmId),
}

/// Errors from the dispatch queue layer.
///
/// These never block an alarm's own state transitions or its
/// next-occurrence registration; redelivery is the durable queue's
/// concern, not the engine's.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("no worker registered under '{0}'")]
    UnknownWorker(String),

    #[error("queue rejected job '{job}': {reason}")]
    Rejected { job: String, reason: String },
}

/// Errors surfaced by engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("invalid snapshot for event '{event_path}': {source}")]
    Ical {
        event_path: String,
        #[source]
        source: IcalError,
    },

    #[error("invalid handler: {0}")]
    InvalidHandler(String),

    /// The engine enforces single initialization per process.
    #[error("engine already initialized")]
    AlreadyInitialized,

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}
