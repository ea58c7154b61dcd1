// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Destination that appends messages to a JSON-lines file

use super::{DeliveryError, DeliveryReceipt, Destination, DestinationCore};
use async_trait::async_trait;
use herald_core::{DestinationOptions, EventMessage};
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

pub const FILE_DESTINATION_TYPE: &str = "$$MessageEventBusDestinationFile";

const PATH_OPTION: &str = "path";

#[derive(Default)]
struct Sink {
    file: Option<File>,
    /// Ids written during this process lifetime
    written: HashSet<String>,
}

/// Writes each message's wire record as one line, fsyncs, then confirms
pub struct FileDestination {
    core: DestinationCore,
    path: PathBuf,
    sink: Mutex<Sink>,
    closed: AtomicBool,
}

impl FileDestination {
    pub fn new(options: &DestinationOptions, path: impl Into<PathBuf>) -> Self {
        Self {
            core: DestinationCore::new(FILE_DESTINATION_TYPE, options),
            path: path.into(),
            sink: Mutex::new(Sink::default()),
            closed: AtomicBool::new(false),
        }
    }

    /// Build from options, reading the target from the `path` option
    pub fn from_options(options: &DestinationOptions) -> Option<Self> {
        let path = options.options.get(PATH_OPTION)?.as_str()?;
        Some(Self::new(options, path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append the line unless this id was already written. Returns whether it wrote.
    fn write_once(&self, message: &EventMessage) -> Result<bool, DeliveryError> {
        let mut sink = self.sink.lock().unwrap_or_else(|e| e.into_inner());
        if sink.written.contains(message.id()) {
            return Ok(false);
        }

        let line = serde_json::to_string(&message.serialize())?;
        if sink.file.is_none() {
            if let Some(parent) = self.path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            sink.file = Some(OpenOptions::new().create(true).append(true).open(&self.path)?);
        }
        let file = sink.file.as_mut().ok_or(DeliveryError::Closed)?;
        file.write_all(line.as_bytes())?;
        file.write_all(b"\n")?;
        file.sync_data()?;

        sink.written.insert(message.id().to_string());
        Ok(true)
    }
}

#[async_trait]
impl Destination for FileDestination {
    fn core(&self) -> &DestinationCore {
        &self.core
    }

    async fn receive_from_event_bus(
        &self,
        message: &EventMessage,
        receipt: DeliveryReceipt,
    ) -> Result<bool, DeliveryError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(DeliveryError::Closed);
        }
        if !self.write_once(message)? {
            tracing::debug!(destination_id = self.id(), message_id = message.id(), "already written");
        }
        // A repeat means the earlier confirm may not have landed
        receipt.confirm().await?;
        Ok(true)
    }

    fn options(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut options = serde_json::Map::new();
        options.insert(
            PATH_OPTION.to_string(),
            serde_json::Value::String(self.path.display().to_string()),
        );
        options
    }

    async fn close(&self) -> Result<(), DeliveryError> {
        self.closed.store(true, Ordering::SeqCst);
        let file = self
            .sink
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .file
            .take();
        if let Some(file) = file {
            file.sync_all()?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
