// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the event bus

use herald_storage::{DestinationStoreError, LogWriterError};
use thiserror::Error;

/// Errors that can occur in bus operations
#[derive(Debug, Error)]
pub enum BusError {
    #[error("log writer error: {0}")]
    Log(#[from] LogWriterError),
    #[error("destination store error: {0}")]
    Store(#[from] DestinationStoreError),
    #[error("destination not found: {0}")]
    UnknownDestination(String),
    #[error("event bus is closed")]
    Closed,
}
