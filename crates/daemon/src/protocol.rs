// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire protocol between heraldd and its clients
//!
//! Each frame is a 4-byte big-endian length followed by that many bytes of
//! JSON. A connection carries one request and one response.

use std::time::Duration;

use herald_core::{DestinationRecord, EventMessageRecord, SubscriptionSetOptions};
use herald_engine::EventQuery;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Bumped when request or response shapes change incompatibly
pub const PROTOCOL_VERSION: &str = "1";

/// Read/write timeout applied by the server to each frame
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Frames above this size are rejected before allocation
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    Ping,

    Hello { version: String },

    /// Log and broadcast a message
    Send { message: EventMessageRecord },

    /// Mark a message sent
    Confirm { id: String },

    Events {
        #[serde(default)]
        mode: EventQuery,
    },

    /// One destination, or all of them when `id` is absent or unknown
    Destinations {
        #[serde(default)]
        id: Option<String>,
    },

    /// Build a destination from options, register it and persist its record
    AddDestination { options: serde_json::Value },

    RemoveDestination { id: String },

    GetSubscription { id: String },

    SetSubscription {
        id: String,
        subscription: SubscriptionSetOptions,
    },

    ResetSubscription { id: String },

    Status,

    Shutdown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonStatus {
    pub uptime_secs: u64,
    pub destinations: usize,
    pub listening: usize,
    pub unsent: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Response {
    Pong,

    Hello { version: String },

    Ok,

    /// Message was logged; counts are from the broadcast pass
    Sent {
        id: String,
        delivered: usize,
        failed: usize,
    },

    Events { messages: Vec<EventMessageRecord> },

    Destinations { destinations: Vec<DestinationRecord> },

    Destination { destination: DestinationRecord },

    Removed { removed: bool },

    Subscription { subscription: SubscriptionSetOptions },

    Status { status: DaemonStatus },

    ShuttingDown,

    Error { message: String },
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Timeout")]
    Timeout,
}

/// Serialize to JSON without the length prefix
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, ProtocolError> {
    Ok(serde_json::to_vec(value)?)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ProtocolError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Read one length-prefixed frame
pub async fn read_message<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, ProtocolError> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(ProtocolError::ConnectionClosed);
        }
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: len,
            max: MAX_MESSAGE_SIZE,
        });
    }

    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).await?;
    Ok(buf)
}

/// Write one length-prefixed frame
pub async fn write_message<W: AsyncWrite + Unpin>(
    writer: &mut W,
    data: &[u8],
) -> Result<(), ProtocolError> {
    if data.len() > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge {
            size: data.len(),
            max: MAX_MESSAGE_SIZE,
        });
    }
    let len = data.len() as u32;
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(data).await?;
    writer.flush().await?;
    Ok(())
}

pub async fn read_request<R: AsyncRead + Unpin>(
    reader: &mut R,
    timeout: Duration,
) -> Result<Request, ProtocolError> {
    let bytes = tokio::time::timeout(timeout, read_message(reader))
        .await
        .map_err(|_| ProtocolError::Timeout)??;
    decode(&bytes)
}

pub async fn write_response<W: AsyncWrite + Unpin>(
    writer: &mut W,
    response: &Response,
    timeout: Duration,
) -> Result<(), ProtocolError> {
    let data = encode(response)?;
    tokio::time::timeout(timeout, write_message(writer, &data))
        .await
        .map_err(|_| ProtocolError::Timeout)?
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
