// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle: startup, destination restore, shutdown.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::sync::Arc;
use std::time::Instant;

use fs2::FileExt;
use herald_adapters::{destination_from_record, Destination};
use herald_engine::{BusError, EventBus, InitOptions};
use herald_storage::{
    DestinationStore, DestinationStoreError, FileLogWriter, JsonDestinationStore, LogWriter,
    LogWriterError, MemoryLogWriter,
};
use thiserror::Error;
use tokio::net::UnixListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::{Config, LogBackend};

/// Daemon state during operation
pub struct DaemonState {
    pub config: Config,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
    pub listener: UnixListener,
    pub bus: EventBus,
    pub store: Arc<dyn DestinationStore>,
    pub start_time: Instant,
    /// Cancelled by a `Shutdown` request
    pub shutdown: CancellationToken,
}

impl DaemonState {
    /// Close the bus and remove the socket and PID files
    pub async fn shutdown(&self) -> Result<(), LifecycleError> {
        info!("Shutting down daemon...");
        self.shutdown.cancel();

        let result = self.bus.close().await;
        if let Err(e) = &result {
            warn!("Event bus closed with error: {}", e);
        }

        if self.config.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.socket_path) {
                warn!("Failed to remove socket file: {}", e);
            }
        }
        if self.config.lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.lock_path) {
                warn!("Failed to remove PID file: {}", e);
            }
        }

        info!("Daemon shutdown complete");
        Ok(result?)
    }
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("Failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),

    #[error("Failed to bind socket at {0}: {1}")]
    BindFailed(std::path::PathBuf, std::io::Error),

    #[error("Event log error: {0}")]
    Log(#[from] LogWriterError),

    #[error("Destination store error: {0}")]
    Store(#[from] DestinationStoreError),

    #[error("Event bus error: {0}")]
    Bus(#[from] BusError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Start the daemon
pub async fn startup(config: &Config) -> Result<DaemonState, LifecycleError> {
    match startup_inner(config).await {
        Ok(state) => Ok(state),
        Err(LifecycleError::LockFailed(e)) => Err(LifecycleError::LockFailed(e)),
        Err(e) => {
            cleanup_on_failure(config);
            Err(e)
        }
    }
}

async fn startup_inner(config: &Config) -> Result<DaemonState, LifecycleError> {
    // 1. Lock first: one bus per state directory
    std::fs::create_dir_all(&config.state_dir)?;
    let mut lock_file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&config.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;

    // 2. Durable stores
    let log = open_log_writer(config)?;
    let store: Arc<dyn DestinationStore> =
        Arc::new(JsonDestinationStore::open(&config.destinations_dir)?);

    // 3. Rebuild configured destinations
    let destinations = restore_destinations(store.as_ref()).await?;
    info!("Restored {} destinations", destinations.len());

    // 4. Bus: registers destinations and sweeps what the last run left unsent
    let bus = EventBus::new(log, Arc::clone(&store), config.bus.clone());
    bus.initialize_with_retry(InitOptions { destinations })
        .await?;

    // 5. Bind last, once everything behind the socket is ready
    if let Some(parent) = config.socket_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let listener = match UnixListener::bind(&config.socket_path) {
        Ok(listener) => listener,
        Err(e) => {
            if let Err(close_err) = bus.close().await {
                warn!("Failed to close event bus: {}", close_err);
            }
            return Err(LifecycleError::BindFailed(config.socket_path.clone(), e));
        }
    };

    info!("Daemon started in {}", config.state_dir.display());

    Ok(DaemonState {
        config: config.clone(),
        lock_file,
        listener,
        bus,
        store,
        start_time: Instant::now(),
        shutdown: CancellationToken::new(),
    })
}

fn open_log_writer(config: &Config) -> Result<Arc<dyn LogWriter>, LifecycleError> {
    match config.log_backend {
        LogBackend::File => Ok(Arc::new(FileLogWriter::open(
            &config.event_log_dir,
            config.log_writer.clone(),
        )?)),
        LogBackend::Memory => {
            warn!("Using in-memory event log; unsent messages will not survive a restart");
            Ok(Arc::new(MemoryLogWriter::new()))
        }
    }
}

/// Build a destination for every persisted record, skipping records whose
/// type is unknown or whose options are invalid
pub async fn restore_destinations(
    store: &dyn DestinationStore,
) -> Result<Vec<Arc<dyn Destination>>, LifecycleError> {
    let mut destinations = Vec::new();
    for persisted in store.load_all().await? {
        let id = persisted.id.clone();
        match destination_from_record(persisted.destination) {
            Ok(destination) => destinations.push(destination),
            Err(e) => warn!(destination_id = %id, error = %e, "skipping persisted destination"),
        }
    }
    Ok(destinations)
}

/// Clean up resources on startup failure. Only called while holding the lock.
fn cleanup_on_failure(config: &Config) {
    if config.socket_path.exists() {
        let _ = std::fs::remove_file(&config.socket_path);
    }
    if config.lock_path.exists() {
        let _ = std::fs::remove_file(&config.lock_path);
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
