// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The event bus: write-ahead log, destination registry and redelivery
//!
//! Message lifecycle:
//!
//! ```text
//! send ──> put_message (unsent) ──> broadcast ──> receipt.confirm() ──> sent
//!                                       ^
//!                 redelivery sweep ─────┘ (every unsent message, each period)
//! ```
//!
//! The bus is constructed explicitly by the composition root and shared by
//! cloning; clones share one registry, one log writer and one sweep.

use crate::config::BusConfig;
use crate::confirm::BusConfirmer;
use crate::dispatch::{self, FanOutReport};
use crate::error::BusError;
use crate::listener::Listeners;
use crate::redelivery::RedeliveryTask;
use herald_adapters::{delete_from_db, Destination, SentConfirmer};
use herald_core::{
    DestinationRecord, EventLevel, EventMessage, SubscriptionSet, SubscriptionSetOptions,
};
use herald_storage::{DestinationStore, LogWriter, UpsertOutcome};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

/// Name of the synthetic event sent by `initialize`
pub const BUS_INITIALIZED_EVENT: &str = "herald.core.eventBusInitialized";

/// Which log entries `get_events` returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventQuery {
    #[default]
    All,
    Sent,
    Unsent,
}

/// Destinations to register during `initialize`
#[derive(Clone, Default)]
pub struct InitOptions {
    pub destinations: Vec<Arc<dyn Destination>>,
}

impl InitOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_destination(mut self, destination: Arc<dyn Destination>) -> Self {
        self.destinations.push(destination);
        self
    }
}

pub(crate) struct BusInner {
    config: BusConfig,
    log: Arc<dyn LogWriter>,
    store: Arc<dyn DestinationStore>,
    confirmer: Arc<dyn SentConfirmer>,
    destinations: RwLock<HashMap<String, Arc<dyn Destination>>>,
    listeners: Listeners,
    initialized: AtomicBool,
    closed: AtomicBool,
    /// Serializes initialize and close
    lifecycle: tokio::sync::Mutex<()>,
    redelivery: Mutex<Option<RedeliveryTask>>,
}

impl BusInner {
    fn snapshot(&self) -> Vec<Arc<dyn Destination>> {
        self.destinations
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect()
    }

    fn get(&self, id: &str) -> Option<Arc<dyn Destination>> {
        self.destinations
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned()
    }

    fn evict(&self, id: &str) -> Option<Arc<dyn Destination>> {
        self.destinations
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(id)
    }

    fn take_redelivery(&self) -> Option<RedeliveryTask> {
        self.redelivery
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
    }

    /// Broadcast to the destinations registered right now. With none
    /// registered the message counts as delivered and is confirmed here.
    async fn fan_out(&self, message: &EventMessage) -> Result<FanOutReport, BusError> {
        let destinations = self.snapshot();
        if destinations.is_empty() {
            self.log.confirm_message_sent(message.id()).await?;
            tracing::debug!(message_id = message.id(), "no destinations, confirmed");
            return Ok(FanOutReport::default());
        }
        Ok(dispatch::broadcast(message, destinations, Arc::clone(&self.confirmer)).await)
    }

    /// Re-broadcast every unsent message. Returns how many were swept.
    pub(crate) async fn redeliver_unsent(&self) -> Result<usize, BusError> {
        let unsent = self.log.get_messages_unsent().await?;
        for message in &unsent {
            self.fan_out(message).await?;
        }
        Ok(unsent.len())
    }

    /// Stop listening and close a destination that has left the registry
    async fn retire(&self, destination: &Arc<dyn Destination>) {
        self.listeners.stop(destination.id());
        if let Err(e) = destination.close().await {
            tracing::warn!(destination_id = destination.id(), error = %e, "close failed");
        }
    }
}

/// Event bus handle. Cheap to clone.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {
    /// Construct without any I/O; call [`EventBus::initialize`] before use
    pub fn new(
        log: Arc<dyn LogWriter>,
        store: Arc<dyn DestinationStore>,
        config: BusConfig,
    ) -> Self {
        let confirmer: Arc<dyn SentConfirmer> = Arc::new(BusConfirmer::new(Arc::clone(&log)));
        Self {
            inner: Arc::new(BusInner {
                config,
                log,
                store,
                confirmer,
                destinations: RwLock::new(HashMap::new()),
                listeners: Listeners::default(),
                initialized: AtomicBool::new(false),
                closed: AtomicBool::new(false),
                lifecycle: tokio::sync::Mutex::new(()),
                redelivery: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &BusConfig {
        &self.inner.config
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.initialized.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// One-time setup. Returns immediately once initialized.
    ///
    /// Registers the given destinations, sends the bus-initialized event,
    /// sweeps unsent messages left by a previous run, starts a fresh log
    /// segment and schedules the recurring sweep. On error the bus stays
    /// uninitialized and a later call starts over.
    pub async fn initialize(&self, options: InitOptions) -> Result<(), BusError> {
        let _lifecycle = self.inner.lifecycle.lock().await;
        if self.is_closed() {
            return Err(BusError::Closed);
        }
        if self.is_initialized() {
            return Ok(());
        }

        if let Some(previous) = self.inner.take_redelivery() {
            previous.stop().await;
        }

        for destination in options.destinations {
            self.add_destination(destination).await?;
        }

        self.send(EventMessage::new(BUS_INITIALIZED_EVENT, EventLevel::Debug))
            .await?;

        let swept = self.inner.redeliver_unsent().await?;
        if swept > 0 {
            tracing::info!(count = swept, "recovered unsent messages");
        }

        self.inner.log.start_logging().await?;

        let task = RedeliveryTask::spawn(
            Arc::downgrade(&self.inner),
            self.inner.config.redelivery_interval,
        );
        *self
            .inner
            .redelivery
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(task);

        self.inner.initialized.store(true, Ordering::SeqCst);
        tracing::info!(
            destinations = self.destination_count(),
            interval_ms = self.inner.config.redelivery_interval.as_millis() as u64,
            "event bus initialized"
        );
        Ok(())
    }

    /// `initialize`, retried with exponential backoff per the config's policy
    pub async fn initialize_with_retry(&self, options: InitOptions) -> Result<(), BusError> {
        let policy = &self.inner.config.retry;
        let mut attempt = 1;
        loop {
            match self.initialize(options.clone()).await {
                Ok(()) => return Ok(()),
                Err(BusError::Closed) => return Err(BusError::Closed),
                Err(e) if attempt >= policy.attempts => {
                    tracing::error!(attempt, error = %e, "event bus initialization failed, giving up");
                    return Err(e);
                }
                Err(e) => {
                    let backoff = policy.backoff(attempt);
                    tracing::warn!(
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "event bus initialization failed, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Log the message, then broadcast it to every registered destination.
    ///
    /// A log failure aborts the send before any destination is contacted.
    /// Delivery failures are isolated per destination and only logged.
    pub async fn send(&self, message: EventMessage) -> Result<FanOutReport, BusError> {
        if self.is_closed() {
            return Err(BusError::Closed);
        }
        self.inner.log.put_message(&message).await?;
        tracing::debug!(message_id = message.id(), event_name = message.event_name(), "message logged");
        self.inner.fan_out(&message).await
    }

    /// Mark a message sent. Idempotent.
    pub async fn confirm_sent(&self, message: &EventMessage) -> Result<(), BusError> {
        self.confirm_sent_id(message.id()).await
    }

    pub async fn confirm_sent_id(&self, id: &str) -> Result<(), BusError> {
        self.inner.log.confirm_message_sent(id).await?;
        Ok(())
    }

    /// Re-broadcast every unsent message now, outside the schedule
    pub async fn redeliver_unsent(&self) -> Result<usize, BusError> {
        self.inner.redeliver_unsent().await
    }

    /// Register a destination, replacing (and closing) any other instance
    /// under the same id. The persisted record is left to the caller.
    pub async fn add_destination(
        &self,
        destination: Arc<dyn Destination>,
    ) -> Result<Arc<dyn Destination>, BusError> {
        if self.is_closed() {
            return Err(BusError::Closed);
        }
        let id = destination.id().to_string();
        if let Some(previous) = self.inner.get(&id) {
            if !Arc::ptr_eq(&previous, &destination) {
                self.inner.evict(&id);
                self.inner.retire(&previous).await;
                tracing::info!(destination_id = %id, "replaced destination");
            }
        }

        self.inner
            .destinations
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id.clone(), Arc::clone(&destination));
        tracing::debug!(destination_id = %id, type_tag = destination.type_tag(), "destination registered");
        Ok(destination)
    }

    /// Delete the persisted record, then evict, stop listening and close.
    ///
    /// Returns `Ok(None)` for an unknown id. If the delete fails the
    /// destination stays registered and the error is returned.
    pub async fn remove_destination(
        &self,
        id: &str,
    ) -> Result<Option<Arc<dyn Destination>>, BusError> {
        if self.inner.get(id).is_none() {
            return Ok(None);
        }
        delete_from_db(self.inner.store.as_ref(), id).await?;

        let Some(destination) = self.inner.evict(id) else {
            // Removed concurrently
            return Ok(None);
        };
        self.inner.retire(&destination).await;
        tracing::info!(destination_id = id, "destination removed");
        Ok(Some(destination))
    }

    pub fn get_destination(&self, id: &str) -> Option<Arc<dyn Destination>> {
        self.inner.get(id)
    }

    pub fn destination_count(&self) -> usize {
        self.inner
            .destinations
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    /// Serialized destinations: the one with `id` if it is registered,
    /// otherwise all of them, ordered by id
    pub fn find_destination(&self, id: Option<&str>) -> Vec<DestinationRecord> {
        if let Some(destination) = id.and_then(|id| self.inner.get(id)) {
            return vec![destination.serialize()];
        }
        let mut records: Vec<DestinationRecord> = self
            .inner
            .snapshot()
            .iter()
            .map(|d| d.serialize())
            .collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        records
    }

    fn require(&self, id: &str) -> Result<Arc<dyn Destination>, BusError> {
        self.inner
            .get(id)
            .ok_or_else(|| BusError::UnknownDestination(id.to_string()))
    }

    pub fn get_destination_subscription_set(
        &self,
        id: &str,
    ) -> Result<SubscriptionSetOptions, BusError> {
        Ok(self.require(id)?.subscription_set().serialize())
    }

    pub fn set_destination_subscription_set(
        &self,
        id: &str,
        options: &SubscriptionSetOptions,
    ) -> Result<Arc<dyn Destination>, BusError> {
        let destination = self.require(id)?;
        destination.set_subscription_set(SubscriptionSet::from_options(options));
        Ok(destination)
    }

    /// Clear all three filter sets of a destination
    pub fn reset_destination_subscription_set(
        &self,
        id: &str,
    ) -> Result<Arc<dyn Destination>, BusError> {
        let destination = self.require(id)?;
        destination.core().reset_subscription_set();
        Ok(destination)
    }

    /// Persist a registered destination's current record
    pub async fn save_destination(&self, id: &str) -> Result<UpsertOutcome, BusError> {
        let destination = self.require(id)?;
        Ok(destination.save_to_db(self.inner.store.as_ref()).await?)
    }

    pub async fn get_events(&self, query: EventQuery) -> Result<Vec<EventMessage>, BusError> {
        let log = &self.inner.log;
        let messages = match query {
            EventQuery::All => log.get_messages().await?,
            EventQuery::Sent => log.get_messages_sent().await?,
            EventQuery::Unsent => log.get_messages_unsent().await?,
        };
        Ok(messages)
    }

    pub async fn get_events_sent(&self) -> Result<Vec<EventMessage>, BusError> {
        self.get_events(EventQuery::Sent).await
    }

    pub async fn get_events_unsent(&self) -> Result<Vec<EventMessage>, BusError> {
        self.get_events(EventQuery::Unsent).await
    }

    /// Open the point-to-point channel for a registered destination.
    /// Returns false if it is disabled or was already listening.
    pub fn start_listening(&self, id: &str) -> Result<bool, BusError> {
        let destination = self.require(id)?;
        Ok(self
            .inner
            .listeners
            .start(destination, Arc::clone(&self.inner.confirmer)))
    }

    pub fn stop_listening(&self, id: &str) -> bool {
        self.inner.listeners.stop(id)
    }

    pub fn is_listening(&self, id: &str) -> bool {
        self.inner.listeners.is_listening(id)
    }

    pub fn listening_count(&self) -> usize {
        self.inner.listeners.count()
    }

    /// Hand a message to one listening destination. Not logged.
    pub fn emit_to(&self, id: &str, message: &EventMessage) -> bool {
        self.inner.listeners.emit(id, message)
    }

    /// Offer a message to every listening destination that wants it. Not logged.
    pub fn publish(&self, message: &EventMessage) -> usize {
        self.inner.listeners.publish(message)
    }

    /// Stop the sweep, close the log writer, then close every destination.
    ///
    /// Idempotent. Destination close errors are logged; a log writer close
    /// error is returned after the destinations are closed.
    pub async fn close(&self) -> Result<(), BusError> {
        let _lifecycle = self.inner.lifecycle.lock().await;
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        if let Some(task) = self.inner.take_redelivery() {
            task.stop().await;
        }
        self.inner.listeners.stop_all();

        let log_result = self.inner.log.close().await;

        let destinations: Vec<Arc<dyn Destination>> = self
            .inner
            .destinations
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .drain()
            .map(|(_, d)| d)
            .collect();
        for destination in &destinations {
            self.inner.retire(destination).await;
        }

        self.inner.initialized.store(false, Ordering::SeqCst);
        tracing::info!(destinations = destinations.len(), "event bus closed");
        Ok(log_result?)
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
