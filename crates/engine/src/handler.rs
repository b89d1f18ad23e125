// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Alarm handler contract and the action-keyed registry.

use crate::error::{EngineError, HandlerError};
use async_trait::async_trait;
use calarm_core::{Alarm, AlarmAction};
use std::collections::HashMap;
use std::sync::Arc;

/// A notification channel implementation.
///
/// Handlers are registered at process startup and invoked through the
/// dispatch queue whenever an alarm with their action fires. `handle`
/// must be safe to call more than once for the same alarm (the queue
/// guarantees at-least-once, not exactly-once).
#[async_trait]
pub trait AlarmHandler: Send + Sync + 'static {
    /// Stable identifier, unique per action. Part of the durable
    /// worker name, so renaming it orphans queued jobs.
    fn unique_id(&self) -> &str;

    /// The alarm action this handler serves.
    fn action(&self) -> AlarmAction;

    async fn handle(&self, alarm: &Alarm) -> Result<(), HandlerError>;
}

/// In-memory mapping from alarm action to the handlers registered for
/// it. Mutated only during startup, read-only afterwards.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<AlarmAction, Vec<Arc<dyn AlarmHandler>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for its action. Multiple handlers per action
    /// are allowed and are invoked independently; a duplicate
    /// `(action, unique_id)` pair or an empty unique_id is rejected.
    pub fn register(&mut self, handler: Arc<dyn AlarmHandler>) -> Result<(), EngineError> {
        let id = handler.unique_id();
        if id.is_empty() {
            return Err(EngineError::InvalidHandler("empty unique_id".to_string()));
        }
        let entry = self.handlers.entry(handler.action()).or_default();
        if entry.iter().any(|h| h.unique_id() == id) {
            return Err(EngineError::InvalidHandler(format!(
                "duplicate unique_id '{}' for action {}",
                id,
                handler.action()
            )));
        }
        tracing::info!(unique_id = id, action = %handler.action(), "registered alarm handler");
        entry.push(handler);
        Ok(())
    }

    /// Handlers registered for an action, in registration order.
    /// Empty when none.
    pub fn handlers_for(&self, action: AlarmAction) -> Vec<Arc<dyn AlarmHandler>> {
        self.handlers.get(&action).cloned().unwrap_or_default()
    }

    /// Every registered handler, for queue worker creation.
    pub fn all(&self) -> Vec<Arc<dyn AlarmHandler>> {
        self.handlers.values().flatten().cloned().collect()
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{AlarmHandler, HandlerError};
    use async_trait::async_trait;
    use calarm_core::{Alarm, AlarmAction, AlarmId};
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Recording handler for tests. Clones share the call log.
    #[derive(Clone)]
    pub struct FakeHandler {
        unique_id: String,
        action: AlarmAction,
        calls: Arc<Mutex<Vec<AlarmId>>>,
        fail_with: Arc<Mutex<Option<String>>>,
    }

    impl FakeHandler {
        pub fn new(unique_id: impl Into<String>, action: AlarmAction) -> Self {
            Self {
                unique_id: unique_id.into(),
                action,
                calls: Arc::new(Mutex::new(Vec::new())),
                fail_with: Arc::new(Mutex::new(None)),
            }
        }

        /// Make every subsequent `handle` call fail with this message.
        pub fn fail_with(&self, message: impl Into<String>) {
            *self.fail_with.lock() = Some(message.into());
        }

        /// IDs of the alarms handled so far.
        pub fn handled(&self) -> Vec<AlarmId> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl AlarmHandler for FakeHandler {
        fn unique_id(&self) -> &str {
            &self.unique_id
        }

        fn action(&self) -> AlarmAction {
            self.action
        }

        async fn handle(&self, alarm: &Alarm) -> Result<(), HandlerError> {
            self.calls.lock().push(alarm.id.clone());
            match self.fail_with.lock().clone() {
                Some(message) => Err(HandlerError::Failed(message)),
                None => Ok(()),
            }
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeHandler;

#[cfg(test)]
#[path = "handler_tests.rs"]
mod tests;
