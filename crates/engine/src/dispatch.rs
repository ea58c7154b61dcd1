// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Broadcast fan-out with per-destination isolation
//!
//! Each destination gets its own task, so an error, a panic or a slow
//! delivery in one never reaches its siblings.

use herald_adapters::{DeliveryReceipt, Destination, SentConfirmer};
use herald_core::EventMessage;
use std::sync::Arc;

/// Outcome counts of one fan-out pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOutReport {
    pub delivered: usize,
    /// Destination returned `Ok(false)`
    pub declined: usize,
    pub failed: usize,
    pub panicked: usize,
}

impl FanOutReport {
    pub fn attempted(&self) -> usize {
        self.delivered + self.declined + self.failed + self.panicked
    }
}

/// Deliver `message` to every destination in the snapshot and wait for all of them
pub(crate) async fn broadcast(
    message: &EventMessage,
    destinations: Vec<Arc<dyn Destination>>,
    confirmer: Arc<dyn SentConfirmer>,
) -> FanOutReport {
    let message = Arc::new(message.clone());
    let tasks: Vec<_> = destinations
        .into_iter()
        .map(|destination| {
            let id = destination.id().to_string();
            let message = Arc::clone(&message);
            let receipt = DeliveryReceipt::new(message.id(), Arc::clone(&confirmer));
            let handle = tokio::spawn(async move {
                destination.receive_from_event_bus(&message, receipt).await
            });
            (id, handle)
        })
        .collect();

    let mut report = FanOutReport::default();
    for (destination_id, handle) in tasks {
        match handle.await {
            Ok(Ok(true)) => report.delivered += 1,
            Ok(Ok(false)) => report.declined += 1,
            Ok(Err(e)) => {
                report.failed += 1;
                tracing::warn!(
                    destination_id = %destination_id,
                    message_id = message.id(),
                    error = %e,
                    "delivery failed"
                );
            }
            Err(e) => {
                report.panicked += 1;
                tracing::error!(
                    destination_id = %destination_id,
                    message_id = message.id(),
                    error = %e,
                    "delivery task aborted"
                );
            }
        }
    }
    report
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
