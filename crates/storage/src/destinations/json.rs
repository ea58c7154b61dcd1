// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON file-based destination store
//!
//! One `<id>.json` file per destination. Writes go through a temp file and a
//! rename so a crash never leaves a half-written record.

use super::{DestinationStore, DestinationStoreError, UpsertOutcome};
use async_trait::async_trait;
use herald_core::PersistedDestination;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Destination store backed by a directory of JSON files
pub struct JsonDestinationStore {
    base_path: PathBuf,
    /// Serializes read-compare-write in `upsert`
    write_lock: Mutex<()>,
}

impl JsonDestinationStore {
    /// Open a store at the given path
    pub fn open(base_path: impl Into<PathBuf>) -> Result<Self, DestinationStoreError> {
        let base_path = base_path.into();
        fs::create_dir_all(&base_path)?;
        Ok(Self {
            base_path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.base_path
    }

    fn path_for(&self, id: &str) -> Result<PathBuf, DestinationStoreError> {
        let invalid = id.is_empty()
            || id == "."
            || id == ".."
            || id.contains(['/', '\\', '\0']);
        if invalid {
            return Err(DestinationStoreError::InvalidId(id.to_string()));
        }
        Ok(self.base_path.join(format!("{}.json", id)))
    }
}

#[async_trait]
impl DestinationStore for JsonDestinationStore {
    async fn upsert(&self, record: &PersistedDestination) -> Result<UpsertOutcome, DestinationStoreError> {
        let path = self.path_for(&record.id)?;
        let json = serde_json::to_string_pretty(record)?;

        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let outcome = match fs::read_to_string(&path) {
            Ok(existing) if existing == json => return Ok(UpsertOutcome::Unchanged),
            Ok(_) => UpsertOutcome::Updated,
            Err(e) if e.kind() == io::ErrorKind::NotFound => UpsertOutcome::Inserted,
            Err(e) => return Err(e.into()),
        };

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, &json)?;
        fs::rename(&tmp, &path)?;
        tracing::debug!(destination_id = %record.id, ?outcome, "destination saved");
        Ok(outcome)
    }

    async fn delete(&self, id: &str) -> Result<bool, DestinationStoreError> {
        let path = self.path_for(id)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn load_all(&self) -> Result<Vec<PersistedDestination>, DestinationStoreError> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(&self.base_path)? {
            let path = entry?.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                paths.push(path);
            }
        }
        paths.sort();

        let mut records = Vec::with_capacity(paths.len());
        for path in paths {
            let json = fs::read_to_string(&path)?;
            match serde_json::from_str::<PersistedDestination>(&json) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping unreadable destination record")
                }
            }
        }
        Ok(records)
    }
}

#[cfg(test)]
#[path = "json_tests.rs"]
mod tests;
