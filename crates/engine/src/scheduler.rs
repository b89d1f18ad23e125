// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cron-driven tick loop.
//!
//! The platform's configuration decides how often due alarms are
//! discovered; an unset or unreadable value falls back to the default
//! so a configuration outage never silences alarms entirely.

use crate::lifecycle::AlarmLifecycleEngine;
use async_trait::async_trait;
use calarm_core::Clock;
use chrono::Utc;
use cron::Schedule;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Configuration key holding the tick cadence.
pub const CRON_EXPRESSION_KEY: &str = "alarm.cron-expression";

/// Tick cadence when the key is unset or unreadable: every minute, on
/// the minute.
pub const DEFAULT_CRON_EXPRESSION: &str = "0 * * * * *";

/// The configuration backend could not be read.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("config unavailable: {0}")]
pub struct ConfigError(pub String);

/// Port onto the platform's key/value configuration.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, ConfigError>;
}

#[derive(Debug, Error)]
pub enum SchedulingError {
    #[error("invalid cron expression '{expression}': {reason}")]
    InvalidExpression { expression: String, reason: String },
}

/// Resolve the tick cadence from configuration, falling back to
/// [`DEFAULT_CRON_EXPRESSION`] when the key is unset or the backend
/// errors.
pub async fn resolve_cron_expression(config: &dyn ConfigSource) -> String {
    match config.get(CRON_EXPRESSION_KEY).await {
        Ok(Some(expression)) => expression,
        Ok(None) => {
            tracing::debug!(
                key = CRON_EXPRESSION_KEY,
                default = DEFAULT_CRON_EXPRESSION,
                "cron expression unset, using default"
            );
            DEFAULT_CRON_EXPRESSION.to_string()
        }
        Err(e) => {
            tracing::warn!(
                key = CRON_EXPRESSION_KEY,
                default = DEFAULT_CRON_EXPRESSION,
                error = %e,
                "config unreadable, using default cron expression"
            );
            DEFAULT_CRON_EXPRESSION.to_string()
        }
    }
}

/// Background task that runs one engine tick per cron firing.
#[derive(Debug)]
pub struct CronScheduler {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl CronScheduler {
    /// Validate the expression and spawn the tick loop.
    pub fn start<C: Clock>(
        engine: Arc<AlarmLifecycleEngine<C>>,
        expression: &str,
    ) -> Result<Self, SchedulingError> {
        let schedule =
            Schedule::from_str(expression).map_err(|e| SchedulingError::InvalidExpression {
                expression: expression.to_string(),
                reason: e.to_string(),
            })?;
        tracing::info!(expression, "starting alarm tick scheduler");

        let cancel = CancellationToken::new();
        let loop_cancel = cancel.clone();
        let handle = tokio::spawn(async move {
            loop {
                let Some(next) = schedule.after(&Utc::now()).next() else {
                    tracing::warn!("cron schedule has no further firings, stopping");
                    return;
                };
                let wait = (next - Utc::now()).to_std().unwrap_or_default();
                tokio::select! {
                    _ = loop_cancel.cancelled() => {
                        tracing::debug!("tick scheduler cancelled");
                        return;
                    }
                    _ = tokio::time::sleep(wait) => {}
                }
                if let Err(e) = engine.run_tick().await {
                    tracing::error!(error = %e, "tick failed");
                }
            }
        });
        Ok(Self { cancel, handle })
    }

    /// Cancel the loop and wait for it to wind down.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            tracing::warn!(error = %e, "tick scheduler task aborted");
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
