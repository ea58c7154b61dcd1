//! Delivery receipts: how a destination reports a message as delivered

use super::DeliveryError;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Marks messages sent in the bus's log
#[async_trait]
pub trait SentConfirmer: Send + Sync + 'static {
    async fn confirm_sent(&self, message_id: &str) -> Result<(), DeliveryError>;
}

/// Handed to a destination alongside each message
#[derive(Clone)]
pub struct DeliveryReceipt {
    message_id: String,
    confirmer: Arc<dyn SentConfirmer>,
}

impl DeliveryReceipt {
    pub fn new(message_id: impl Into<String>, confirmer: Arc<dyn SentConfirmer>) -> Self {
        Self {
            message_id: message_id.into(),
            confirmer,
        }
    }

    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    /// Confirm the message as sent. Safe to call more than once.
    pub async fn confirm(&self) -> Result<(), DeliveryError> {
        self.confirmer.confirm_sent(&self.message_id).await
    }
}

impl fmt::Debug for DeliveryReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeliveryReceipt")
            .field("message_id", &self.message_id)
            .finish_non_exhaustive()
    }
}
