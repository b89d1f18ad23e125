// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! calarm-engine: the alarm scheduling and lifecycle engine.
//!
//! Calendar event messages come in over the bus and become alarm rows;
//! a cron-driven tick discovers due rows, claims them, fans dispatch
//! out to registered handlers through a durable queue, and registers
//! the next occurrence of recurring alarms.

pub mod bus;
pub mod dispatch;
pub mod email;
pub mod error;
pub mod handler;
pub mod lifecycle;
pub mod scheduler;

pub use bus::{run_bus, CalendarMessage};
#[cfg(any(test, feature = "test-support"))]
pub use dispatch::FakeJobQueue;
pub use dispatch::{AlarmDispatchQueue, JobQueue, TokioJobQueue};
#[cfg(any(test, feature = "test-support"))]
pub use email::{RecordingGateway, SentEmail};
pub use email::{EmailAlarmHandler, EmailGateway};
pub use error::{DispatchError, EngineError, HandlerError};
#[cfg(any(test, feature = "test-support"))]
pub use handler::FakeHandler;
pub use handler::{AlarmHandler, HandlerRegistry};
pub use lifecycle::{AlarmLifecycleEngine, TickSummary};
pub use scheduler::{
    resolve_cron_expression, ConfigError, ConfigSource, CronScheduler, SchedulingError,
    CRON_EXPRESSION_KEY, DEFAULT_CRON_EXPRESSION,
};
