// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced destination wrapper for consistent observability

use crate::destination::{DeliveryError, DeliveryReceipt, Destination, DestinationCore};
use async_trait::async_trait;
use herald_core::EventMessage;
use tracing::Instrument;

/// Wrapper that adds tracing to any Destination
pub struct TracedDestination<D> {
    inner: D,
}

impl<D> TracedDestination<D> {
    pub fn new(inner: D) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }
}

#[async_trait]
impl<D: Destination> Destination for TracedDestination<D> {
    fn core(&self) -> &DestinationCore {
        self.inner.core()
    }

    async fn receive_from_event_bus(
        &self,
        message: &EventMessage,
        receipt: DeliveryReceipt,
    ) -> Result<bool, DeliveryError> {
        let span = tracing::info_span!(
            "destination.receive",
            destination_id = self.id(),
            message_id = message.id()
        );

        async move {
            tracing::debug!(event_name = message.event_name(), "delivering");

            let start = std::time::Instant::now();
            let result = self.inner.receive_from_event_bus(message, receipt).await;
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &result {
                Ok(true) => tracing::debug!(elapsed_ms, "delivered"),
                Ok(false) => tracing::info!(elapsed_ms, "not delivered"),
                Err(e) => tracing::error!(elapsed_ms, error = %e, "delivery failed"),
            }

            result
        }
        .instrument(span)
        .await
    }

    fn options(&self) -> serde_json::Map<String, serde_json::Value> {
        self.inner.options()
    }

    async fn close(&self) -> Result<(), DeliveryError> {
        let span = tracing::info_span!("destination.close", destination_id = self.id());

        async move {
            let result = self.inner.close().await;
            match &result {
                Ok(()) => tracing::info!("closed"),
                Err(e) => tracing::warn!(error = %e, "close failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
