// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Destinations: the sinks the event bus delivers to

pub mod destination;
pub mod traced;

pub use destination::{
    delete_from_db, destination_from_options, destination_from_record, DeliveryError,
    DeliveryReceipt, Destination, DestinationCore, FactoryError, FileDestination, SentConfirmer,
    FILE_DESTINATION_TYPE,
};
pub use traced::TracedDestination;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use destination::{FakeDestination, RecordingConfirmer, FAKE_DESTINATION_TYPE};
