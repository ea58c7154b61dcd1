//! In-memory destination store

use super::{DestinationStore, DestinationStoreError, UpsertOutcome};
use async_trait::async_trait;
use herald_core::PersistedDestination;
use std::collections::BTreeMap;
use std::sync::Mutex;

#[derive(Default)]
pub struct MemoryDestinationStore {
    records: Mutex<BTreeMap<String, PersistedDestination>>,
}

impl MemoryDestinationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<PersistedDestination> {
        self.lock().get(id).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, PersistedDestination>> {
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl DestinationStore for MemoryDestinationStore {
    async fn upsert(&self, record: &PersistedDestination) -> Result<UpsertOutcome, DestinationStoreError> {
        let mut records = self.lock();
        let outcome = match records.get(&record.id) {
            Some(existing) if existing == record => return Ok(UpsertOutcome::Unchanged),
            Some(_) => UpsertOutcome::Updated,
            None => UpsertOutcome::Inserted,
        };
        records.insert(record.id.clone(), record.clone());
        Ok(outcome)
    }

    async fn delete(&self, id: &str) -> Result<bool, DestinationStoreError> {
        Ok(self.lock().remove(id).is_some())
    }

    async fn load_all(&self) -> Result<Vec<PersistedDestination>, DestinationStoreError> {
        Ok(self.lock().values().cloned().collect())
    }
}
