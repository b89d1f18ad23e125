// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! calarm-core: domain types for the calendar alarm scheduling engine.
//!
//! Pure types and computations only — no I/O. Persistence lives in
//! `calarm-storage`, orchestration in `calarm-engine`.

pub mod macros;

pub mod alarm;
pub mod clock;
pub mod ical;
pub mod recurrence;

#[cfg(any(test, feature = "test-support"))]
pub use alarm::AlarmBuilder;
pub use alarm::{Alarm, AlarmAction, AlarmConfig, AlarmId, AlarmState};
pub use clock::{Clock, FakeClock, SystemClock};
pub use ical::{CalendarSnapshot, IcalError, TriggerDuration, VAlarm, VEvent};
pub use recurrence::compute_next_due_date;
