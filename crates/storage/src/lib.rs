// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! herald-storage: durable state behind the event bus
//!
//! - [`LogWriter`]: append-only message log with sent/unsent status
//! - [`DestinationStore`]: persisted destination records keyed by id

pub mod destinations;
pub mod log;

pub use destinations::{
    DestinationStore, DestinationStoreError, JsonDestinationStore, MemoryDestinationStore,
    UpsertOutcome,
};
pub use log::{
    FileLogWriter, FileLogWriterConfig, LogEntry, LogWriter, LogWriterError, MemoryLogWriter,
};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use destinations::{FakeDestinationStore, StoreCall};
#[cfg(any(test, feature = "test-support"))]
pub use log::FlakyLogWriter;
