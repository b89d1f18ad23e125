// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! calarm-storage: persistence contract and backends for alarm rows.
//!
//! The engine talks to an [`AlarmStore`] trait object; the concrete
//! backend is an implementation detail of the deployment. Two backends
//! live here: an in-memory map (tests, ephemeral deployments) and a
//! JSON document file (single-node stand-in for the platform's
//! document store collection).

mod collection;
pub mod json;
pub mod memory;
pub mod store;

pub use json::JsonAlarmStore;
pub use memory::MemoryAlarmStore;
pub use store::{AlarmStore, StoreError};
