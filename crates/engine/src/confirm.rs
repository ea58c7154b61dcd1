// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Confirmation path from destinations back to the log

use async_trait::async_trait;
use herald_adapters::{DeliveryError, SentConfirmer};
use herald_storage::LogWriter;
use std::sync::Arc;

/// Marks messages sent in the bus's log writer on behalf of destinations
#[derive(Clone)]
pub struct BusConfirmer {
    log: Arc<dyn LogWriter>,
}

impl BusConfirmer {
    pub fn new(log: Arc<dyn LogWriter>) -> Self {
        Self { log }
    }
}

#[async_trait]
impl SentConfirmer for BusConfirmer {
    async fn confirm_sent(&self, message_id: &str) -> Result<(), DeliveryError> {
        self.log
            .confirm_message_sent(message_id)
            .await
            .map_err(|e| DeliveryError::Confirm(e.to_string()))?;
        tracing::debug!(message_id, "message confirmed sent");
        Ok(())
    }
}
