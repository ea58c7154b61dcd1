// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory log writer for ephemeral deployments and tests

use super::{LogEntry, LogWriter, LogWriterError};
use async_trait::async_trait;
use herald_core::{Clock, EventMessage, SystemClock};
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
struct Inner {
    entries: Vec<LogEntry>,
    index: HashMap<String, usize>,
    /// Incremented by each `start_logging`
    generation: u64,
    closed: bool,
}

/// Log writer that keeps entries in process memory
pub struct MemoryLogWriter<C: Clock = SystemClock> {
    clock: C,
    inner: Mutex<Inner>,
}

impl MemoryLogWriter<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for MemoryLogWriter<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> MemoryLogWriter<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// How many times `start_logging` has run
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn open(&self) -> Result<std::sync::MutexGuard<'_, Inner>, LogWriterError> {
        let inner = self.lock();
        if inner.closed {
            return Err(LogWriterError::Closed);
        }
        Ok(inner)
    }
}

#[async_trait]
impl<C: Clock> LogWriter for MemoryLogWriter<C> {
    async fn put_message(&self, message: &EventMessage) -> Result<(), LogWriterError> {
        let mut inner = self.open()?;
        if inner.index.contains_key(message.id()) {
            return Ok(());
        }
        let position = inner.entries.len();
        inner.index.insert(message.id().to_string(), position);
        inner.entries.push(LogEntry::unsent(message.clone()));
        Ok(())
    }

    async fn confirm_message_sent(&self, id: &str) -> Result<(), LogWriterError> {
        let mut inner = self.open()?;
        let Some(&position) = inner.index.get(id) else {
            return Ok(());
        };
        let now = self.clock.now();
        let entry = &mut inner.entries[position];
        if !entry.sent {
            entry.sent = true;
            entry.confirmed_at = Some(now);
        }
        Ok(())
    }

    async fn entries(&self) -> Result<Vec<LogEntry>, LogWriterError> {
        Ok(self.open()?.entries.clone())
    }

    async fn start_logging(&self) -> Result<(), LogWriterError> {
        self.open()?.generation += 1;
        Ok(())
    }

    async fn close(&self) -> Result<(), LogWriterError> {
        self.lock().closed = true;
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
