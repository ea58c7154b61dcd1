// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Segmented JSON-lines log writer
//!
//! Every append is fsync'd before returning. Sent status is kept in memory
//! (rebuilt from disk on open) so confirmations stay idempotent without a
//! rescan; queries read the segments back in storage order.

use super::entry::{LogLine, LogRecord};
use super::segment::{list_segments, read_segment, segment_file_name};
use super::{LogEntry, LogWriter, LogWriterError};
use async_trait::async_trait;
use herald_core::{Clock, EventMessage, SystemClock};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Rotation and retention settings for [`FileLogWriter`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLogWriterConfig {
    /// A segment at or past this size is rotated before the next append
    pub max_segment_bytes: u64,
    /// Fully-confirmed segments beyond this count are pruned, oldest first
    pub keep_segments: usize,
}

impl Default for FileLogWriterConfig {
    fn default() -> Self {
        Self {
            max_segment_bytes: 10 * 1024 * 1024,
            keep_segments: 3,
        }
    }
}

struct Inner {
    /// None once closed
    file: Option<File>,
    segment: u64,
    segment_bytes: u64,
    next_sequence: u64,
    /// Message id -> sent
    status: HashMap<String, bool>,
}

/// Log writer backed by `events-<n>.jsonl` segments in one directory
pub struct FileLogWriter<C: Clock = SystemClock> {
    dir: PathBuf,
    config: FileLogWriterConfig,
    clock: C,
    inner: Mutex<Inner>,
}

impl FileLogWriter<SystemClock> {
    pub fn open(dir: &Path, config: FileLogWriterConfig) -> Result<Self, LogWriterError> {
        Self::open_with_clock(dir, config, SystemClock)
    }
}

impl<C: Clock> FileLogWriter<C> {
    /// Open the log in `dir`, replaying existing segments.
    ///
    /// Appends continue in the newest segment unless its tail is torn, in
    /// which case a new segment is started.
    pub fn open_with_clock(
        dir: &Path,
        config: FileLogWriterConfig,
        clock: C,
    ) -> Result<Self, LogWriterError> {
        std::fs::create_dir_all(dir)?;

        let segments = list_segments(dir)?;
        let mut status = HashMap::new();
        let mut next_sequence = 0;
        let mut last_clean = true;

        for (_, path) in &segments {
            let contents = read_segment(path)?;
            for line in &contents.lines {
                next_sequence = next_sequence.max(line.sequence + 1);
                match &line.record {
                    LogRecord::Message { message } => {
                        status.entry(message.id.clone()).or_insert(false);
                    }
                    LogRecord::Confirmed { id, .. } => {
                        if let Some(sent) = status.get_mut(id) {
                            *sent = true;
                        }
                    }
                }
            }
            last_clean = contents.is_clean();
        }

        let (segment, segment_bytes) = match segments.last() {
            Some((number, _)) if !last_clean => {
                tracing::warn!(segment = number, "newest segment has a torn tail, starting a new one");
                (number + 1, 0)
            }
            Some((number, path)) => (*number, std::fs::metadata(path)?.len()),
            None => (1, 0),
        };
        let file = open_segment(dir, segment)?;

        tracing::debug!(
            dir = %dir.display(),
            segment,
            messages = status.len(),
            "log opened"
        );

        Ok(Self {
            dir: dir.to_path_buf(),
            config,
            clock,
            inner: Mutex::new(Inner {
                file: Some(file),
                segment,
                segment_bytes,
                next_sequence,
                status,
            }),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of the segment new lines are appended to
    pub fn current_segment(&self) -> u64 {
        self.lock().segment
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn append(&self, inner: &mut Inner, record: LogRecord) -> Result<(), LogWriterError> {
        let line = LogLine::new(inner.next_sequence, self.clock.now(), record).to_line()?;
        let file = inner.file.as_mut().ok_or(LogWriterError::Closed)?;

        file.write_all(line.as_bytes())?;
        file.write_all(b"\n")?;
        // Durable before returning
        file.sync_all()?;

        inner.next_sequence += 1;
        inner.segment_bytes += line.len() as u64 + 1;
        Ok(())
    }

    fn rotate(&self, inner: &mut Inner) -> Result<(), LogWriterError> {
        let next = inner.segment + 1;
        let file = open_segment(&self.dir, next)?;
        if let Some(old) = inner.file.replace(file) {
            old.sync_all()?;
        }
        tracing::debug!(from = inner.segment, to = next, "rotated log segment");
        inner.segment = next;
        inner.segment_bytes = 0;
        Ok(())
    }

    /// Remove the oldest segments while there are more than `keep_segments`
    /// and every message they hold has been confirmed.
    ///
    /// Ids of pruned messages are forgotten along with their segment.
    fn prune(&self, inner: &mut Inner) -> Result<(), LogWriterError> {
        let segments = list_segments(&self.dir)?;
        let excess = segments.len().saturating_sub(self.config.keep_segments);

        for (number, path) in segments.into_iter().take(excess) {
            if number == inner.segment {
                break;
            }
            let contents = read_segment(&path)?;
            let drained = contents.lines.iter().all(|line| match &line.record {
                LogRecord::Message { message } => {
                    inner.status.get(&message.id).copied().unwrap_or(false)
                }
                LogRecord::Confirmed { .. } => true,
            });
            if !drained {
                break;
            }
            std::fs::remove_file(&path)?;
            for line in &contents.lines {
                if let LogRecord::Message { message } = &line.record {
                    inner.status.remove(&message.id);
                }
            }
            tracing::info!(segment = number, "pruned confirmed log segment");
        }
        Ok(())
    }
}

fn open_segment(dir: &Path, number: u64) -> std::io::Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(segment_file_name(number)))
}

#[async_trait]
impl<C: Clock> LogWriter for FileLogWriter<C> {
    async fn put_message(&self, message: &EventMessage) -> Result<(), LogWriterError> {
        let mut inner = self.lock();
        if inner.file.is_none() {
            return Err(LogWriterError::Closed);
        }
        if inner.status.contains_key(message.id()) {
            tracing::debug!(message_id = message.id(), "message already logged");
            return Ok(());
        }
        if inner.segment_bytes >= self.config.max_segment_bytes {
            self.rotate(&mut inner)?;
            self.prune(&mut inner)?;
        }

        self.append(
            &mut inner,
            LogRecord::Message {
                message: message.serialize(),
            },
        )?;
        inner.status.insert(message.id().to_string(), false);
        Ok(())
    }

    async fn confirm_message_sent(&self, id: &str) -> Result<(), LogWriterError> {
        let mut inner = self.lock();
        if inner.file.is_none() {
            return Err(LogWriterError::Closed);
        }
        match inner.status.get(id) {
            None => {
                tracing::debug!(message_id = id, "confirm for unknown message ignored");
                return Ok(());
            }
            Some(true) => return Ok(()),
            Some(false) => {}
        }

        let confirmed_at = self.clock.now();
        self.append(
            &mut inner,
            LogRecord::Confirmed {
                id: id.to_string(),
                confirmed_at,
            },
        )?;
        inner.status.insert(id.to_string(), true);
        Ok(())
    }

    async fn entries(&self) -> Result<Vec<LogEntry>, LogWriterError> {
        // Held so a concurrent append cannot be observed half-written
        let inner = self.lock();
        if inner.file.is_none() {
            return Err(LogWriterError::Closed);
        }

        let mut entries: Vec<LogEntry> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for (_, path) in list_segments(&self.dir)? {
            for line in read_segment(&path)?.lines {
                match line.record {
                    LogRecord::Message { message } => {
                        if index.contains_key(&message.id) {
                            continue;
                        }
                        match EventMessage::from_record(message) {
                            Ok(message) => {
                                index.insert(message.id().to_string(), entries.len());
                                entries.push(LogEntry::unsent(message));
                            }
                            Err(e) => tracing::warn!(error = %e, "skipping unreadable message"),
                        }
                    }
                    LogRecord::Confirmed { id, confirmed_at } => {
                        if let Some(&i) = index.get(&id) {
                            let entry = &mut entries[i];
                            if !entry.sent {
                                entry.sent = true;
                                entry.confirmed_at = Some(confirmed_at);
                            }
                        }
                    }
                }
            }
        }
        Ok(entries)
    }

    async fn start_logging(&self) -> Result<(), LogWriterError> {
        let mut inner = self.lock();
        if inner.file.is_none() {
            return Err(LogWriterError::Closed);
        }
        if inner.segment_bytes > 0 {
            self.rotate(&mut inner)?;
        }
        self.prune(&mut inner)?;
        tracing::info!(segment = inner.segment, "logging to fresh segment");
        Ok(())
    }

    async fn close(&self) -> Result<(), LogWriterError> {
        let mut inner = self.lock();
        if let Some(file) = inner.file.take() {
            file.sync_all()?;
            tracing::debug!(dir = %self.dir.display(), "log closed");
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
