// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Point-to-point push path
//!
//! A listening destination owns an unbounded channel on the bus and a task
//! draining it. `emit` addresses one destination by id; `publish` offers a
//! message to every listener that wants it. Disabled destinations receive
//! nothing on this path.

use herald_adapters::{DeliveryReceipt, Destination, SentConfirmer};
use herald_core::EventMessage;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

struct Listener {
    destination: Arc<dyn Destination>,
    tx: mpsc::UnboundedSender<EventMessage>,
    task: JoinHandle<()>,
}

#[derive(Default)]
pub(crate) struct Listeners {
    active: Mutex<HashMap<String, Listener>>,
}

impl Listeners {
    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Listener>> {
        self.active.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns false if the destination is disabled or already listening
    pub fn start(&self, destination: Arc<dyn Destination>, confirmer: Arc<dyn SentConfirmer>) -> bool {
        let mut active = self.lock();
        let id = destination.id().to_string();
        if !destination.is_enabled() {
            tracing::debug!(destination_id = %id, "disabled, not listening");
            return false;
        }
        if active.contains_key(&id) {
            return false;
        }

        let (tx, mut rx) = mpsc::unbounded_channel::<EventMessage>();
        let target = Arc::clone(&destination);
        let task = tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                // Disabled after the message was queued
                if !target.is_enabled() {
                    continue;
                }
                let receipt = DeliveryReceipt::new(message.id(), Arc::clone(&confirmer));
                if let Err(e) = target.receive_from_event_bus(&message, receipt).await {
                    tracing::warn!(
                        destination_id = target.id(),
                        message_id = message.id(),
                        error = %e,
                        "push delivery failed"
                    );
                }
            }
        });

        tracing::debug!(destination_id = %id, "listening");
        active.insert(
            id,
            Listener {
                destination,
                tx,
                task,
            },
        );
        true
    }

    /// Returns false if the destination was not listening
    pub fn stop(&self, id: &str) -> bool {
        let Some(listener) = self.lock().remove(id) else {
            return false;
        };
        listener.task.abort();
        tracing::debug!(destination_id = id, "stopped listening");
        true
    }

    pub fn stop_all(&self) {
        for (_, listener) in self.lock().drain() {
            listener.task.abort();
        }
    }

    pub fn is_listening(&self, id: &str) -> bool {
        self.lock().contains_key(id)
    }

    pub fn count(&self) -> usize {
        self.lock().len()
    }

    /// Queue a message for one listener. Returns false if it is not
    /// listening or has been disabled since it started.
    pub fn emit(&self, id: &str, message: &EventMessage) -> bool {
        self.lock()
            .get(id)
            .filter(|listener| listener.destination.is_enabled())
            .map(|listener| listener.tx.send(message.clone()).is_ok())
            .unwrap_or(false)
    }

    /// Queue a message for every listener that wants it. Returns how many took it.
    pub fn publish(&self, message: &EventMessage) -> usize {
        self.lock()
            .values()
            .filter(|listener| listener.destination.wants(message))
            .filter(|listener| listener.tx.send(message.clone()).is_ok())
            .count()
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
