// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake destination and confirmer for testing
#![cfg_attr(coverage_nightly, coverage(off))]
#![allow(clippy::panic)]

use super::{DeliveryError, DeliveryReceipt, Destination, DestinationCore, SentConfirmer};
use async_trait::async_trait;
use herald_core::{DestinationOptions, EventMessage};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const FAKE_DESTINATION_TYPE: &str = "$$FakeDestination";

struct FakeState {
    core: DestinationCore,
    received: Mutex<Vec<EventMessage>>,
    close_calls: AtomicUsize,
    auto_confirm: AtomicBool,
    fail: AtomicBool,
    panic: AtomicBool,
    delay: Mutex<Option<Duration>>,
}

/// Destination that records deliveries
///
/// Confirms each message by default. Clones share state, so a test can keep
/// a handle after registering the destination with a bus.
#[derive(Clone)]
pub struct FakeDestination {
    state: Arc<FakeState>,
}

impl FakeDestination {
    pub fn new(options: &DestinationOptions) -> Self {
        Self {
            state: Arc::new(FakeState {
                core: DestinationCore::new(FAKE_DESTINATION_TYPE, options),
                received: Mutex::new(Vec::new()),
                close_calls: AtomicUsize::new(0),
                auto_confirm: AtomicBool::new(true),
                fail: AtomicBool::new(false),
                panic: AtomicBool::new(false),
                delay: Mutex::new(None),
            }),
        }
    }

    /// Enabled destination with the given id
    pub fn with_id(id: &str) -> Self {
        Self::new(&DestinationOptions::new().with_id(id).enabled(true))
    }

    /// Every message received, in arrival order (repeats included)
    pub fn received(&self) -> Vec<EventMessage> {
        self.state
            .received
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn received_ids(&self) -> Vec<String> {
        self.received().iter().map(|m| m.id().to_string()).collect()
    }

    /// How many times a message with this id arrived
    pub fn deliveries_of(&self, id: &str) -> usize {
        self.received().iter().filter(|m| m.id() == id).count()
    }

    pub fn close_calls(&self) -> usize {
        self.state.close_calls.load(Ordering::SeqCst)
    }

    pub fn set_auto_confirm(&self, confirm: bool) {
        self.state.auto_confirm.store(confirm, Ordering::SeqCst);
    }

    /// Return an error from every delivery
    pub fn set_fail(&self, fail: bool) {
        self.state.fail.store(fail, Ordering::SeqCst);
    }

    /// Panic inside every delivery
    pub fn set_panic(&self, panic: bool) {
        self.state.panic.store(panic, Ordering::SeqCst);
    }

    /// Sleep before recording each delivery
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.state.delay.lock().unwrap_or_else(|e| e.into_inner()) = delay;
    }
}

#[async_trait]
impl Destination for FakeDestination {
    fn core(&self) -> &DestinationCore {
        &self.state.core
    }

    async fn receive_from_event_bus(
        &self,
        message: &EventMessage,
        receipt: DeliveryReceipt,
    ) -> Result<bool, DeliveryError> {
        let delay = *self.state.delay.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.state
            .received
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(message.clone());

        if self.state.panic.load(Ordering::SeqCst) {
            panic!("fake destination {} panicked", self.id());
        }
        if self.state.fail.load(Ordering::SeqCst) {
            return Err(DeliveryError::Failed(format!(
                "fake destination {} failed",
                self.id()
            )));
        }
        if self.state.auto_confirm.load(Ordering::SeqCst) {
            receipt.confirm().await?;
        }
        Ok(true)
    }

    async fn close(&self) -> Result<(), DeliveryError> {
        self.state.close_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Confirmer that records confirmed ids
#[derive(Clone, Default)]
pub struct RecordingConfirmer {
    confirmed: Arc<Mutex<Vec<String>>>,
    fail: Arc<AtomicBool>,
}

impl RecordingConfirmer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn confirmed(&self) -> Vec<String> {
        self.confirmed
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// A receipt for `message_id` that confirms into this recorder
    pub fn receipt(&self, message_id: &str) -> DeliveryReceipt {
        DeliveryReceipt::new(message_id, Arc::new(self.clone()))
    }
}

#[async_trait]
impl SentConfirmer for RecordingConfirmer {
    async fn confirm_sent(&self, message_id: &str) -> Result<(), DeliveryError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(DeliveryError::Confirm("recording confirmer set to fail".to_string()));
        }
        self.confirmed
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(message_id.to_string());
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
