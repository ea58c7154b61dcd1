// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake destination store for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{DestinationStore, DestinationStoreError, MemoryDestinationStore, UpsertOutcome};
use async_trait::async_trait;
use herald_core::PersistedDestination;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Recorded store operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Upsert { id: String, outcome: Option<UpsertOutcome> },
    Delete { id: String },
    LoadAll,
}

#[derive(Default)]
struct State {
    store: MemoryDestinationStore,
    calls: Mutex<Vec<StoreCall>>,
    fail_upserts: AtomicBool,
    fail_deletes: AtomicBool,
}

/// In-memory store that records calls and can be told to fail
#[derive(Clone, Default)]
pub struct FakeDestinationStore {
    state: Arc<State>,
}

impl FakeDestinationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.state
            .calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn get(&self, id: &str) -> Option<PersistedDestination> {
        self.state.store.get(id)
    }

    pub fn set_fail_upserts(&self, fail: bool) {
        self.state.fail_upserts.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_deletes(&self, fail: bool) {
        self.state.fail_deletes.store(fail, Ordering::SeqCst);
    }

    fn record(&self, call: StoreCall) {
        self.state
            .calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
    }
}

#[async_trait]
impl DestinationStore for FakeDestinationStore {
    async fn upsert(&self, record: &PersistedDestination) -> Result<UpsertOutcome, DestinationStoreError> {
        if self.state.fail_upserts.load(Ordering::SeqCst) {
            self.record(StoreCall::Upsert {
                id: record.id.clone(),
                outcome: None,
            });
            return Err(DestinationStoreError::Unavailable("upsert rejected".to_string()));
        }
        let outcome = self.state.store.upsert(record).await?;
        self.record(StoreCall::Upsert {
            id: record.id.clone(),
            outcome: Some(outcome),
        });
        Ok(outcome)
    }

    async fn delete(&self, id: &str) -> Result<bool, DestinationStoreError> {
        self.record(StoreCall::Delete { id: id.to_string() });
        if self.state.fail_deletes.load(Ordering::SeqCst) {
            return Err(DestinationStoreError::Unavailable("delete rejected".to_string()));
        }
        self.state.store.delete(id).await
    }

    async fn load_all(&self) -> Result<Vec<PersistedDestination>, DestinationStoreError> {
        self.record(StoreCall::LoadAll);
        self.state.store.load_all().await
    }
}
