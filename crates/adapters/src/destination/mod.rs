// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Destination capability and its concrete variants

mod base;
mod factory;
mod file;
mod receipt;

pub use base::DestinationCore;
pub use factory::{destination_from_options, destination_from_record, FactoryError};
pub use file::{FileDestination, FILE_DESTINATION_TYPE};
pub use receipt::{DeliveryReceipt, SentConfirmer};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeDestination, RecordingConfirmer, FAKE_DESTINATION_TYPE};

use async_trait::async_trait;
use herald_core::{DestinationRecord, EventMessage, PersistedDestination, SubscriptionSet};
use herald_storage::{DestinationStore, DestinationStoreError, UpsertOutcome};
use thiserror::Error;

/// Errors from delivering a message to a destination
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("delivery failed: {0}")]
    Failed(String),
    #[error("confirmation failed: {0}")]
    Confirm(String),
    #[error("destination is closed")]
    Closed,
}

/// A configured sink for event messages
///
/// Variants supply [`Destination::receive_from_event_bus`] and embed a
/// [`DestinationCore`] for identity, enable state and filters; everything
/// else has a default built on the core.
#[async_trait]
pub trait Destination: Send + Sync + 'static {
    fn core(&self) -> &DestinationCore;

    /// Deliver one message. Call `receipt.confirm()` once delivery is observed.
    ///
    /// Returns whether the message was delivered. The same message may arrive
    /// more than once; receiving it again must be harmless.
    async fn receive_from_event_bus(
        &self,
        message: &EventMessage,
        receipt: DeliveryReceipt,
    ) -> Result<bool, DeliveryError>;

    /// Variant-specific settings included in the serialized record
    fn options(&self) -> serde_json::Map<String, serde_json::Value> {
        serde_json::Map::new()
    }

    /// Release held resources. The bus stops the push listener before calling this.
    async fn close(&self) -> Result<(), DeliveryError> {
        Ok(())
    }

    fn id(&self) -> &str {
        self.core().id()
    }

    fn type_tag(&self) -> &str {
        self.core().type_tag()
    }

    fn label(&self) -> &str {
        self.core().label()
    }

    fn is_enabled(&self) -> bool {
        self.core().is_enabled()
    }

    fn enable(&self) {
        self.core().enable();
    }

    fn disable(&self) {
        self.core().disable();
    }

    fn has_subscribed_to_event(&self, message: &EventMessage) -> bool {
        self.core().has_subscribed_to_event(message)
    }

    /// Whether the push path should hand this message over
    fn wants(&self, message: &EventMessage) -> bool {
        self.core().wants(message)
    }

    fn subscription_set(&self) -> SubscriptionSet {
        self.core().subscription_set()
    }

    fn set_subscription_set(&self, set: SubscriptionSet) {
        self.core().set_subscription_set(set);
    }

    fn serialize(&self) -> DestinationRecord {
        self.core().record(self.options())
    }

    /// Upsert `{ id, destination: serialize() }`
    async fn save_to_db(
        &self,
        store: &dyn DestinationStore,
    ) -> Result<UpsertOutcome, DestinationStoreError> {
        store.upsert(&PersistedDestination::new(self.serialize())).await
    }

    async fn delete_from_db(&self, store: &dyn DestinationStore) -> Result<bool, DestinationStoreError> {
        delete_from_db(store, self.id()).await
    }
}

/// Delete a persisted destination record without needing an instance
pub async fn delete_from_db(
    store: &dyn DestinationStore,
    id: &str,
) -> Result<bool, DestinationStoreError> {
    let existed = store.delete(id).await?;
    tracing::debug!(destination_id = id, existed, "destination record deleted");
    Ok(existed)
}
