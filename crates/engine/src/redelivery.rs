// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recurring sweep that re-broadcasts unsent messages

use crate::bus::BusInner;
use std::sync::Weak;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Handle to the running sweep, owned by the bus
pub(crate) struct RedeliveryTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl RedeliveryTask {
    /// Start sweeping every `period`, first sweep one period from now.
    ///
    /// The task holds only a weak reference, so it ends on its own once the
    /// bus is dropped.
    pub fn spawn(bus: Weak<BusInner>, period: Duration) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        // tokio intervals reject a zero period
        let period = period.max(Duration::from_millis(1));

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {}
                }
                let Some(bus) = bus.upgrade() else {
                    break;
                };
                tokio::select! {
                    _ = token.cancelled() => break,
                    result = bus.redeliver_unsent() => match result {
                        Ok(0) => {}
                        Ok(count) => tracing::info!(count, "redelivered unsent messages"),
                        Err(e) => tracing::warn!(error = %e, "redelivery sweep failed"),
                    },
                }
            }
            tracing::debug!("redelivery task stopped");
        });

        Self { cancel, handle }
    }

    /// Cancel the sweep and wait for the task to finish
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            tracing::warn!(error = %e, "redelivery task ended abnormally");
        }
    }
}
