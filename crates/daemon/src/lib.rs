// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! heraldd: the process that owns the event bus
//!
//! Producers and admin tools talk to it over a Unix socket using the
//! frames in [`protocol`].

pub mod client;
pub mod config;
pub mod lifecycle;
pub mod protocol;
pub mod server;

pub use client::{ClientError, DaemonClient};
pub use config::{Config, ConfigError, LogBackend};
pub use lifecycle::{DaemonState, LifecycleError};
pub use protocol::{DaemonStatus, Request, Response, PROTOCOL_VERSION};
