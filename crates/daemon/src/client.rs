// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client for producers and admin tools

use std::path::{Path, PathBuf};
use std::time::Duration;

use herald_core::{DestinationRecord, EventMessage, EventMessageRecord, SubscriptionSetOptions};
use herald_engine::EventQuery;
use thiserror::Error;
use tokio::net::UnixStream;

use crate::config::Config;
use crate::protocol::{self, DaemonStatus, ProtocolError, Request, Response};

/// Timeout for one request/response exchange. `HERALD_TIMEOUT_IPC_MS` overrides.
pub fn timeout_ipc() -> Duration {
    std::env::var("HERALD_TIMEOUT_IPC_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Daemon not running")]
    DaemonNotRunning,

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Unexpected response from daemon")]
    UnexpectedResponse,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of a `send`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReceipt {
    pub id: String,
    pub delivered: usize,
    pub failed: usize,
}

/// Daemon client. Each call opens a fresh connection.
pub struct DaemonClient {
    socket_path: PathBuf,
}

impl DaemonClient {
    /// Connect to a running daemon
    pub fn connect(socket_path: impl Into<PathBuf>) -> Result<Self, ClientError> {
        let socket_path = socket_path.into();
        if !socket_path.exists() {
            return Err(ClientError::DaemonNotRunning);
        }
        Ok(Self { socket_path })
    }

    pub fn for_config(config: &Config) -> Result<Self, ClientError> {
        Self::connect(&config.socket_path)
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Send a request and receive a response
    pub async fn request(&self, request: Request) -> Result<Response, ClientError> {
        let timeout = timeout_ipc();
        let stream = UnixStream::connect(&self.socket_path).await?;
        let (mut reader, mut writer) = stream.into_split();

        let data = protocol::encode(&request)?;
        tokio::time::timeout(timeout, protocol::write_message(&mut writer, &data))
            .await
            .map_err(|_| ProtocolError::Timeout)??;

        let response_bytes = tokio::time::timeout(timeout, protocol::read_message(&mut reader))
            .await
            .map_err(|_| ProtocolError::Timeout)??;

        Ok(protocol::decode(&response_bytes)?)
    }

    pub async fn ping(&self) -> Result<(), ClientError> {
        match self.request(Request::Ping).await? {
            Response::Pong => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    /// Protocol version reported by the daemon
    pub async fn hello(&self) -> Result<String, ClientError> {
        match self
            .request(Request::Hello {
                version: protocol::PROTOCOL_VERSION.to_string(),
            })
            .await?
        {
            Response::Hello { version } => Ok(version),
            other => Err(unexpected(other)),
        }
    }

    /// Log and broadcast a message through the daemon's bus
    pub async fn send(&self, message: &EventMessage) -> Result<SendReceipt, ClientError> {
        match self
            .request(Request::Send {
                message: message.serialize(),
            })
            .await?
        {
            Response::Sent {
                id,
                delivered,
                failed,
            } => Ok(SendReceipt {
                id,
                delivered,
                failed,
            }),
            other => Err(unexpected(other)),
        }
    }

    pub async fn confirm(&self, id: &str) -> Result<(), ClientError> {
        match self.request(Request::Confirm { id: id.to_string() }).await? {
            Response::Ok => Ok(()),
            other => Err(unexpected(other)),
        }
    }

    pub async fn events(&self, mode: EventQuery) -> Result<Vec<EventMessageRecord>, ClientError> {
        match self.request(Request::Events { mode }).await? {
            Response::Events { messages } => Ok(messages),
            other => Err(unexpected(other)),
        }
    }

    pub async fn destinations(&self, id: Option<&str>) -> Result<Vec<DestinationRecord>, ClientError> {
        match self
            .request(Request::Destinations {
                id: id.map(str::to_string),
            })
            .await?
        {
            Response::Destinations { destinations } => Ok(destinations),
            other => Err(unexpected(other)),
        }
    }

    /// Create, register and persist a destination from raw options
    pub async fn add_destination(
        &self,
        options: serde_json::Value,
    ) -> Result<DestinationRecord, ClientError> {
        match self.request(Request::AddDestination { options }).await? {
            Response::Destination { destination } => Ok(destination),
            other => Err(unexpected(other)),
        }
    }

    /// Returns false if no destination had that id
    pub async fn remove_destination(&self, id: &str) -> Result<bool, ClientError> {
        match self
            .request(Request::RemoveDestination { id: id.to_string() })
            .await?
        {
            Response::Removed { removed } => Ok(removed),
            other => Err(unexpected(other)),
        }
    }

    pub async fn subscription(&self, id: &str) -> Result<SubscriptionSetOptions, ClientError> {
        self.subscription_request(Request::GetSubscription { id: id.to_string() })
            .await
    }

    pub async fn set_subscription(
        &self,
        id: &str,
        subscription: SubscriptionSetOptions,
    ) -> Result<SubscriptionSetOptions, ClientError> {
        self.subscription_request(Request::SetSubscription {
            id: id.to_string(),
            subscription,
        })
        .await
    }

    pub async fn reset_subscription(&self, id: &str) -> Result<SubscriptionSetOptions, ClientError> {
        self.subscription_request(Request::ResetSubscription { id: id.to_string() })
            .await
    }

    async fn subscription_request(
        &self,
        request: Request,
    ) -> Result<SubscriptionSetOptions, ClientError> {
        match self.request(request).await? {
            Response::Subscription { subscription } => Ok(subscription),
            other => Err(unexpected(other)),
        }
    }

    pub async fn status(&self) -> Result<DaemonStatus, ClientError> {
        match self.request(Request::Status).await? {
            Response::Status { status } => Ok(status),
            other => Err(unexpected(other)),
        }
    }

    /// Request daemon shutdown
    pub async fn shutdown(&self) -> Result<(), ClientError> {
        match self.request(Request::Shutdown).await? {
            Response::Ok | Response::ShuttingDown => Ok(()),
            other => Err(unexpected(other)),
        }
    }
}

fn unexpected(response: Response) -> ClientError {
    match response {
        Response::Error { message } => ClientError::Rejected(message),
        _ => ClientError::UnexpectedResponse,
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
