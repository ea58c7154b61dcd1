// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared setup for bus specs

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

pub use herald_adapters::{Destination, FakeDestination};
pub use herald_core::{DestinationOptions, EventLevel, EventMessage, SubscriptionSet};
pub use herald_engine::{BusConfig, BusError, EventBus, EventQuery, InitOptions};
pub use herald_storage::{
    DestinationStore, FakeDestinationStore, FileLogWriter, FileLogWriterConfig, LogWriter,
};
pub use tempfile::TempDir;

/// Sweep interval long enough that only explicit sweeps happen
pub const QUIET: Duration = Duration::from_secs(3600);

/// A bus over a file log in a temp directory and a recording store
pub struct TestBus {
    pub bus: EventBus,
    pub store: FakeDestinationStore,
    pub dir: TempDir,
}

impl TestBus {
    pub fn new() -> Self {
        Self::with_interval(QUIET)
    }

    pub fn with_interval(interval: Duration) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = FakeDestinationStore::new();
        let bus = open_bus(dir.path(), &store, interval);
        Self { bus, store, dir }
    }

    /// A second bus over the same log directory, as after a restart
    pub fn reopen(&self) -> EventBus {
        open_bus(self.dir.path(), &self.store, QUIET)
    }
}

fn open_bus(dir: &Path, store: &FakeDestinationStore, interval: Duration) -> EventBus {
    let log = FileLogWriter::open(&dir.join("log"), FileLogWriterConfig::default()).unwrap();
    EventBus::new(
        Arc::new(log),
        Arc::new(store.clone()),
        BusConfig {
            redelivery_interval: interval,
            ..BusConfig::default()
        },
    )
}

/// Enabled fake destination plus the handle the bus takes
pub fn fake(id: &str) -> (FakeDestination, Arc<dyn Destination>) {
    let dest = FakeDestination::with_id(id);
    let handle: Arc<dyn Destination> = Arc::new(dest.clone());
    (dest, handle)
}

/// Fake destination that receives but never confirms
pub fn silent(id: &str) -> (FakeDestination, Arc<dyn Destination>) {
    let (dest, handle) = fake(id);
    dest.set_auto_confirm(false);
    (dest, handle)
}

pub fn message(name: &str) -> EventMessage {
    EventMessage::new(name, EventLevel::Info)
}

pub fn ids(messages: &[EventMessage]) -> Vec<String> {
    messages.iter().map(|m| m.id().to_string()).collect()
}

/// Poll until `condition` holds, failing after two seconds
pub async fn eventually<F: FnMut() -> bool>(mut condition: F) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not met within 2s"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
