// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! herald event bus: write-ahead logging, fan-out and redelivery

mod bus;
mod config;
mod confirm;
mod dispatch;
mod error;
mod listener;
mod redelivery;

pub use bus::{EventBus, EventQuery, InitOptions, BUS_INITIALIZED_EVENT};
pub use config::{BusConfig, RetryPolicy};
pub use confirm::BusConfirmer;
pub use dispatch::FanOutReport;
pub use error::BusError;

#[cfg(test)]
mod test_helpers;
