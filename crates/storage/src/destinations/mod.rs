// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persisted destination records

mod json;
mod memory;

pub use json::JsonDestinationStore;
pub use memory::MemoryDestinationStore;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeDestinationStore, StoreCall};

use async_trait::async_trait;
use herald_core::PersistedDestination;
use thiserror::Error;

/// Errors from destination store operations
#[derive(Debug, Error)]
pub enum DestinationStoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid destination id: {0:?}")]
    InvalidId(String),
    #[error("destination store unavailable: {0}")]
    Unavailable(String),
}

/// Result of an upsert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    /// Stored record already equal; nothing written
    Unchanged,
}

/// Store of `{ id, destination }` records with a unique key on `id`
#[async_trait]
pub trait DestinationStore: Send + Sync + 'static {
    /// Insert, or overwrite on id conflict. Skips the write when nothing changed.
    async fn upsert(&self, record: &PersistedDestination) -> Result<UpsertOutcome, DestinationStoreError>;

    /// Delete by id. Returns whether a record existed.
    async fn delete(&self, id: &str) -> Result<bool, DestinationStoreError>;

    /// All records, ordered by id
    async fn load_all(&self) -> Result<Vec<PersistedDestination>, DestinationStoreError>;
}
