// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Failure-injecting log writer for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{LogEntry, LogWriter, LogWriterError, MemoryLogWriter};
use async_trait::async_trait;
use herald_core::EventMessage;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct State {
    writes_unavailable: AtomicBool,
    reads_unavailable: AtomicBool,
    start_logging_unavailable: AtomicBool,
    put_calls: AtomicUsize,
    confirm_calls: AtomicUsize,
    start_logging_calls: AtomicUsize,
}

/// In-memory log writer whose store can be made unavailable on demand
#[derive(Clone, Default)]
pub struct FlakyLogWriter {
    inner: Arc<MemoryLogWriter>,
    state: Arc<State>,
}

impl FlakyLogWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every operation that touches the store
    pub fn set_unavailable(&self, unavailable: bool) {
        self.set_writes_unavailable(unavailable);
        self.set_reads_unavailable(unavailable);
        self.set_start_logging_unavailable(unavailable);
    }

    /// Fail `put_message` and `confirm_message_sent`
    pub fn set_writes_unavailable(&self, unavailable: bool) {
        self.state.writes_unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Fail queries
    pub fn set_reads_unavailable(&self, unavailable: bool) {
        self.state.reads_unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn set_start_logging_unavailable(&self, unavailable: bool) {
        self.state
            .start_logging_unavailable
            .store(unavailable, Ordering::SeqCst);
    }

    pub fn put_calls(&self) -> usize {
        self.state.put_calls.load(Ordering::SeqCst)
    }

    pub fn confirm_calls(&self) -> usize {
        self.state.confirm_calls.load(Ordering::SeqCst)
    }

    pub fn start_logging_calls(&self) -> usize {
        self.state.start_logging_calls.load(Ordering::SeqCst)
    }

    fn check(flag: &AtomicBool, op: &str) -> Result<(), LogWriterError> {
        if flag.load(Ordering::SeqCst) {
            return Err(LogWriterError::Unavailable(format!("{} rejected", op)));
        }
        Ok(())
    }
}

#[async_trait]
impl LogWriter for FlakyLogWriter {
    async fn put_message(&self, message: &EventMessage) -> Result<(), LogWriterError> {
        self.state.put_calls.fetch_add(1, Ordering::SeqCst);
        Self::check(&self.state.writes_unavailable, "put_message")?;
        self.inner.put_message(message).await
    }

    async fn confirm_message_sent(&self, id: &str) -> Result<(), LogWriterError> {
        self.state.confirm_calls.fetch_add(1, Ordering::SeqCst);
        Self::check(&self.state.writes_unavailable, "confirm_message_sent")?;
        self.inner.confirm_message_sent(id).await
    }

    async fn entries(&self) -> Result<Vec<LogEntry>, LogWriterError> {
        Self::check(&self.state.reads_unavailable, "entries")?;
        self.inner.entries().await
    }

    async fn start_logging(&self) -> Result<(), LogWriterError> {
        self.state.start_logging_calls.fetch_add(1, Ordering::SeqCst);
        Self::check(&self.state.start_logging_unavailable, "start_logging")?;
        self.inner.start_logging().await
    }

    async fn close(&self) -> Result<(), LogWriterError> {
        self.inner.close().await
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
