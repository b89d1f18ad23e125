// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable dispatch of handler invocations.
//!
//! The scheduling loop must not wait on slow notification channels,
//! and a crashed worker must not silently drop a scheduled
//! notification. [`JobQueue`] is the narrow port onto the platform's
//! durable job queue; [`AlarmDispatchQueue`] owns the naming scheme
//! that makes resubmission of the same alarm/handler pair idempotent.

use crate::error::DispatchError;
use crate::handler::AlarmHandler;
use async_trait::async_trait;
use calarm_core::Alarm;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Port onto the durable job queue collaborator.
#[async_trait]
pub trait JobQueue: Send + Sync + 'static {
    /// Register a durable worker whose execution body invokes the
    /// handler. Re-adding a name replaces the worker.
    async fn add_worker(
        &self,
        name: &str,
        handler: Arc<dyn AlarmHandler>,
    ) -> Result<(), DispatchError>;

    /// Submit one job. Returns once the queue has *accepted* the job;
    /// completion is tracked inside the queue, not by the caller.
    async fn submit_job(
        &self,
        worker_name: &str,
        job_name: &str,
        alarm: Alarm,
    ) -> Result<(), DispatchError>;
}

/// Durable worker name for a handler: `alarm:{action}:{unique_id}`.
pub fn worker_name(handler: &dyn AlarmHandler) -> String {
    format!("alarm:{}:{}", handler.action(), handler.unique_id())
}

/// The engine's view of the queue: worker creation plus uniquely-named
/// job submission.
#[derive(Clone)]
pub struct AlarmDispatchQueue {
    queue: Arc<dyn JobQueue>,
}

impl AlarmDispatchQueue {
    pub fn new(queue: Arc<dyn JobQueue>) -> Self {
        Self { queue }
    }

    /// Register the durable worker backing one handler.
    pub async fn create_worker(&self, handler: Arc<dyn AlarmHandler>) -> Result<(), DispatchError> {
        let name = worker_name(handler.as_ref());
        self.queue.add_worker(&name, handler).await
    }

    /// Submit one handler invocation for one alarm. The job name
    /// `{worker}:{alarm_id}:{event_path}` makes resubmission of the
    /// same pair a no-op at the queue layer.
    pub async fn enqueue(
        &self,
        alarm: &Alarm,
        handler: &Arc<dyn AlarmHandler>,
    ) -> Result<(), DispatchError> {
        let worker = worker_name(handler.as_ref());
        let job = format!("{}:{}:{}", worker, alarm.id, alarm.event_path);
        self.queue.submit_job(&worker, &job, alarm.clone()).await
    }
}

/// In-process queue backend: jobs run as detached tokio tasks.
///
/// Stands in for the platform's persistent queue in single-node
/// deployments and tests. Deduplicates by job name while a job is in
/// flight; job-body failures are logged, never propagated.
#[derive(Clone, Default)]
pub struct TokioJobQueue {
    inner: Arc<TokioQueueInner>,
}

#[derive(Default)]
struct TokioQueueInner {
    workers: Mutex<HashMap<String, Arc<dyn AlarmHandler>>>,
    in_flight: Mutex<HashSet<String>>,
}

impl TokioJobQueue {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobQueue for TokioJobQueue {
    async fn add_worker(
        &self,
        name: &str,
        handler: Arc<dyn AlarmHandler>,
    ) -> Result<(), DispatchError> {
        self.inner.workers.lock().insert(name.to_string(), handler);
        Ok(())
    }

    async fn submit_job(
        &self,
        worker_name: &str,
        job_name: &str,
        alarm: Alarm,
    ) -> Result<(), DispatchError> {
        let handler = self
            .inner
            .workers
            .lock()
            .get(worker_name)
            .cloned()
            .ok_or_else(|| DispatchError::UnknownWorker(worker_name.to_string()))?;

        if !self.inner.in_flight.lock().insert(job_name.to_string()) {
            tracing::debug!(job = job_name, "duplicate submission, already in flight");
            return Ok(());
        }

        let inner = Arc::clone(&self.inner);
        let job = job_name.to_string();
        // Detached: the enqueuing caller only needs "accepted". The
        // completion handler exists for logging alone.
        tokio::spawn(async move {
            match handler.handle(&alarm).await {
                Ok(()) => tracing::info!(job = %job, alarm = %alarm.id, "dispatch job completed"),
                Err(e) => {
                    tracing::warn!(job = %job, alarm = %alarm.id, error = %e, "dispatch job failed")
                }
            }
            inner.in_flight.lock().remove(&job);
        });
        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{AlarmHandler, DispatchError, JobQueue};
    use async_trait::async_trait;
    use calarm_core::Alarm;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;

    /// Recorded job submission.
    #[derive(Debug, Clone)]
    pub struct Submission {
        pub worker: String,
        pub job: String,
        pub alarm: Alarm,
    }

    #[derive(Default)]
    struct FakeQueueState {
        workers: HashMap<String, Arc<dyn AlarmHandler>>,
        submissions: Vec<Submission>,
        reject: Option<String>,
    }

    /// Fake queue for tests: runs handlers inline (awaited) so tests
    /// observe handler effects without sleeping, and records every
    /// submission.
    #[derive(Clone, Default)]
    pub struct FakeJobQueue {
        state: Arc<Mutex<FakeQueueState>>,
    }

    impl FakeJobQueue {
        pub fn new() -> Self {
            Self::default()
        }

        /// Reject every subsequent submission with this reason.
        pub fn reject_with(&self, reason: impl Into<String>) {
            self.state.lock().reject = Some(reason.into());
        }

        pub fn submissions(&self) -> Vec<Submission> {
            self.state.lock().submissions.clone()
        }

        pub fn worker_names(&self) -> Vec<String> {
            let mut names: Vec<String> = self.state.lock().workers.keys().cloned().collect();
            names.sort();
            names
        }
    }

    #[async_trait]
    impl JobQueue for FakeJobQueue {
        async fn add_worker(
            &self,
            name: &str,
            handler: Arc<dyn AlarmHandler>,
        ) -> Result<(), DispatchError> {
            self.state.lock().workers.insert(name.to_string(), handler);
            Ok(())
        }

        async fn submit_job(
            &self,
            worker_name: &str,
            job_name: &str,
            alarm: Alarm,
        ) -> Result<(), DispatchError> {
            let handler = {
                let mut state = self.state.lock();
                if let Some(reason) = state.reject.clone() {
                    return Err(DispatchError::Rejected { job: job_name.to_string(), reason });
                }
                let handler = state
                    .workers
                    .get(worker_name)
                    .cloned()
                    .ok_or_else(|| DispatchError::UnknownWorker(worker_name.to_string()))?;
                state.submissions.push(Submission {
                    worker: worker_name.to_string(),
                    job: job_name.to_string(),
                    alarm: alarm.clone(),
                });
                handler
            };
            // Inline execution; failures stay inside the queue layer,
            // mirroring the real queue's contract.
            if let Err(e) = handler.handle(&alarm).await {
                tracing::warn!(job = job_name, error = %e, "fake queue job failed");
            }
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeJobQueue, Submission};

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
