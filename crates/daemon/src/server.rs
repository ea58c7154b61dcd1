// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Socket server and connection handling.

use herald_adapters::destination_from_options;
use herald_core::{DestinationOptions, EventMessage, SubscriptionSet};
use herald_engine::BusError;
use std::sync::Arc;
use tokio::net::UnixStream;
use tracing::{debug, error, info};

use crate::lifecycle::DaemonState;
use crate::protocol::{self, DaemonStatus, Request, Response, DEFAULT_TIMEOUT, PROTOCOL_VERSION};

/// Accept connections until a `Shutdown` request cancels the daemon's token
///
/// Each connection is handled on its own task, so a send stalled on a slow
/// destination does not hold up other clients.
pub async fn serve(daemon: Arc<DaemonState>) {
    loop {
        tokio::select! {
            _ = daemon.shutdown.cancelled() => {
                info!("Shutdown requested via IPC");
                break;
            }
            result = daemon.listener.accept() => match result {
                Ok((stream, _)) => {
                    let daemon = Arc::clone(&daemon);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(&daemon, stream).await {
                            error!("Error handling connection: {}", e);
                        }
                    });
                }
                Err(e) => error!("Error accepting connection: {}", e),
            },
        }
    }
}

/// Handle a single client connection
pub async fn handle_connection(
    daemon: &DaemonState,
    stream: UnixStream,
) -> Result<(), ServerError> {
    let (mut reader, mut writer) = stream.into_split();

    let request = match protocol::read_request(&mut reader, DEFAULT_TIMEOUT).await {
        Ok(req) => req,
        Err(protocol::ProtocolError::Timeout) => {
            error!("Request read timeout");
            return Err(ServerError::Timeout);
        }
        Err(protocol::ProtocolError::ConnectionClosed) => {
            debug!("Client disconnected before sending request");
            return Ok(());
        }
        Err(e) => {
            error!("Failed to read request: {}", e);
            return Err(ServerError::Protocol(e));
        }
    };

    debug!("Received request: {:?}", request);
    let response = handle_request(daemon, request).await;
    debug!("Sending response: {:?}", response);

    protocol::write_response(&mut writer, &response, DEFAULT_TIMEOUT)
        .await
        .map_err(ServerError::Protocol)?;

    Ok(())
}

fn error_response(e: impl std::fmt::Display) -> Response {
    Response::Error {
        message: e.to_string(),
    }
}

/// Handle a single request and return a response
async fn handle_request(daemon: &DaemonState, request: Request) -> Response {
    match handle_bus_request(daemon, request).await {
        Ok(response) => response,
        Err(e) => error_response(e),
    }
}

async fn handle_bus_request(daemon: &DaemonState, request: Request) -> Result<Response, HandlerError> {
    let bus = &daemon.bus;
    let response = match request {
        Request::Ping => Response::Pong,

        Request::Hello { version: _ } => Response::Hello {
            version: PROTOCOL_VERSION.to_string(),
        },

        Request::Send { message } => {
            let message = EventMessage::from_record(message).map_err(HandlerError::invalid)?;
            let id = message.id().to_string();
            let report = bus.send(message).await?;
            Response::Sent {
                id,
                delivered: report.delivered,
                failed: report.failed + report.panicked,
            }
        }

        Request::Confirm { id } => {
            bus.confirm_sent_id(&id).await?;
            Response::Ok
        }

        Request::Events { mode } => Response::Events {
            messages: bus
                .get_events(mode)
                .await?
                .iter()
                .map(EventMessage::serialize)
                .collect(),
        },

        Request::Destinations { id } => Response::Destinations {
            destinations: bus.find_destination(id.as_deref()),
        },

        Request::AddDestination { options } => {
            let options: DestinationOptions =
                serde_json::from_value(options).map_err(HandlerError::invalid)?;
            let destination = destination_from_options(options).map_err(HandlerError::invalid)?;
            destination.save_to_db(daemon.store.as_ref()).await.map_err(BusError::from)?;
            let destination = bus.add_destination(destination).await?;
            info!(destination_id = destination.id(), "destination added via IPC");
            Response::Destination {
                destination: destination.serialize(),
            }
        }

        Request::RemoveDestination { id } => Response::Removed {
            removed: bus.remove_destination(&id).await?.is_some(),
        },

        Request::GetSubscription { id } => Response::Subscription {
            subscription: bus.get_destination_subscription_set(&id)?,
        },

        Request::SetSubscription { id, subscription } => {
            // Normalize through the set so the reply shows what was stored
            let normalized = SubscriptionSet::from_options(&subscription).serialize();
            bus.set_destination_subscription_set(&id, &normalized)?;
            bus.save_destination(&id).await?;
            Response::Subscription {
                subscription: normalized,
            }
        }

        Request::ResetSubscription { id } => {
            bus.reset_destination_subscription_set(&id)?;
            bus.save_destination(&id).await?;
            Response::Subscription {
                subscription: bus.get_destination_subscription_set(&id)?,
            }
        }

        Request::Status => Response::Status {
            status: DaemonStatus {
                uptime_secs: daemon.start_time.elapsed().as_secs(),
                destinations: bus.destination_count(),
                listening: bus.listening_count(),
                unsent: bus.get_events_unsent().await?.len(),
            },
        },

        Request::Shutdown => {
            daemon.shutdown.cancel();
            Response::ShuttingDown
        }
    };
    Ok(response)
}

/// Why a request could not be served; reported to the client as `Response::Error`
#[derive(Debug, thiserror::Error)]
enum HandlerError {
    #[error("{0}")]
    Bus(#[from] BusError),

    #[error("invalid request: {0}")]
    Invalid(String),
}

impl HandlerError {
    fn invalid(e: impl std::fmt::Display) -> Self {
        Self::Invalid(e.to_string())
    }
}

/// Server errors
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] protocol::ProtocolError),

    #[error("Request timeout")]
    Timeout,
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
