// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Message log: durable record of every message handed to the bus
//!
//! An entry is written before any destination is contacted and moves from
//! unsent to sent exactly once.

mod entry;
mod file;
mod memory;
mod segment;

pub use entry::{LogLine, LogRecord};
pub use file::{FileLogWriter, FileLogWriterConfig};
pub use memory::MemoryLogWriter;
pub use segment::{list_segments, read_segment, segment_file_name, SegmentContents};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FlakyLogWriter;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use herald_core::{EventMessage, MessageError};
use thiserror::Error;

/// Errors from log writer operations
#[derive(Debug, Error)]
pub enum LogWriterError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("stored message is invalid: {0}")]
    Message(#[from] MessageError),
    #[error("log writer is closed")]
    Closed,
    #[error("log store unavailable: {0}")]
    Unavailable(String),
}

/// One message and its delivery status
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub message: EventMessage,
    pub sent: bool,
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl LogEntry {
    pub fn unsent(message: EventMessage) -> Self {
        Self {
            message,
            sent: false,
            confirmed_at: None,
        }
    }
}

/// Durable, queryable store of messages and their sent status
#[async_trait]
pub trait LogWriter: Send + Sync + 'static {
    /// Append a new unsent entry keyed by the message id.
    ///
    /// The entry is durable when this returns `Ok`. A message id already in
    /// the log is left as is.
    async fn put_message(&self, message: &EventMessage) -> Result<(), LogWriterError>;

    /// Mark an entry sent. Confirming a sent or unknown id is a no-op.
    async fn confirm_message_sent(&self, id: &str) -> Result<(), LogWriterError>;

    /// Every entry, in storage order
    async fn entries(&self) -> Result<Vec<LogEntry>, LogWriterError>;

    /// Begin a fresh segment for this process lifetime
    async fn start_logging(&self) -> Result<(), LogWriterError>;

    /// Flush and release resources. Idempotent.
    async fn close(&self) -> Result<(), LogWriterError>;

    async fn get_messages(&self) -> Result<Vec<EventMessage>, LogWriterError> {
        Ok(self.entries().await?.into_iter().map(|e| e.message).collect())
    }

    async fn get_messages_sent(&self) -> Result<Vec<EventMessage>, LogWriterError> {
        Ok(self
            .entries()
            .await?
            .into_iter()
            .filter(|e| e.sent)
            .map(|e| e.message)
            .collect())
    }

    async fn get_messages_unsent(&self) -> Result<Vec<EventMessage>, LogWriterError> {
        Ok(self
            .entries()
            .await?
            .into_iter()
            .filter(|e| !e.sent)
            .map(|e| e.message)
            .collect())
    }
}
