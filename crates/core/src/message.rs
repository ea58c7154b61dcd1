// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event messages and their wire record
//!
//! An [`EventMessage`] is built once by a producer (payload included) and
//! handed to the bus by value; nothing mutates it afterwards. The wire form is
//! [`EventMessageRecord`]:
//!
//! ```text
//! { "__type": "$$EventMessage", "id": "...", "ts": "2026-01-01T00:00:00Z",
//!   "eventName": "herald.core.eventBusInitialized", "level": "debug", "payload": {} }
//! ```

use crate::clock::{Clock, SystemClock};
use crate::id::{IdGen, UuidIdGen};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Opaque structured payload carried by a message
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Errors from building a message out of its wire form
#[derive(Debug, Error)]
pub enum MessageError {
    #[error("unknown message type: {0}")]
    UnknownType(String),
    #[error("message type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },
    #[error("unknown event level: {0}")]
    UnknownLevel(String),
    #[error("invalid message record: {0}")]
    Json(#[from] serde_json::Error),
}

/// Severity of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventLevel {
    Debug,
    Info,
    Warning,
    Error,
    Verbose,
}

impl EventLevel {
    pub const ALL: [EventLevel; 5] = [
        EventLevel::Debug,
        EventLevel::Info,
        EventLevel::Warning,
        EventLevel::Error,
        EventLevel::Verbose,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventLevel::Debug => "debug",
            EventLevel::Info => "info",
            EventLevel::Warning => "warning",
            EventLevel::Error => "error",
            EventLevel::Verbose => "verbose",
        }
    }
}

impl fmt::Display for EventLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventLevel {
    type Err = MessageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventLevel::ALL
            .into_iter()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| MessageError::UnknownLevel(s.to_string()))
    }
}

/// Message variant, carried on the wire as the `__type` discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Generic,
    Workflow,
    Audit,
}

impl MessageKind {
    pub fn type_tag(&self) -> &'static str {
        match self {
            MessageKind::Generic => "$$EventMessage",
            MessageKind::Workflow => "$$EventMessageWorkflow",
            MessageKind::Audit => "$$EventMessageAudit",
        }
    }

    pub fn from_type_tag(tag: &str) -> Option<Self> {
        [MessageKind::Generic, MessageKind::Workflow, MessageKind::Audit]
            .into_iter()
            .find(|kind| kind.type_tag() == tag)
    }
}

/// Serialized form of an [`EventMessage`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMessageRecord {
    #[serde(rename = "__type")]
    pub type_tag: String,
    pub id: String,
    pub ts: DateTime<Utc>,
    #[serde(rename = "eventName")]
    pub event_name: String,
    pub level: EventLevel,
    #[serde(default)]
    pub payload: Payload,
}

/// One occurrence of an application-level event
#[derive(Debug, Clone, PartialEq)]
pub struct EventMessage {
    kind: MessageKind,
    id: String,
    ts: DateTime<Utc>,
    event_name: String,
    level: EventLevel,
    payload: Payload,
}

impl EventMessage {
    /// Create a generic message with a fresh UUID and the current time
    pub fn new(event_name: impl Into<String>, level: EventLevel) -> Self {
        Self::of_kind(MessageKind::Generic, event_name, level)
    }

    /// Create a message of a specific kind with a fresh UUID and the current time
    pub fn of_kind(kind: MessageKind, event_name: impl Into<String>, level: EventLevel) -> Self {
        Self::generate(kind, event_name, level, &UuidIdGen, &SystemClock)
    }

    /// Create a message drawing its identity from the given generators
    pub fn generate(
        kind: MessageKind,
        event_name: impl Into<String>,
        level: EventLevel,
        id_gen: &impl IdGen,
        clock: &impl Clock,
    ) -> Self {
        Self {
            kind,
            id: id_gen.next_id(),
            ts: clock.now(),
            event_name: event_name.into(),
            level,
            payload: Payload::new(),
        }
    }

    /// Attach the payload. Call before handing the message to the bus.
    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn type_tag(&self) -> &'static str {
        self.kind.type_tag()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn ts(&self) -> DateTime<Utc> {
        self.ts
    }

    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    pub fn level(&self) -> EventLevel {
        self.level
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Produce the wire record. An unset payload serializes as `{}`.
    pub fn serialize(&self) -> EventMessageRecord {
        EventMessageRecord {
            type_tag: self.kind.type_tag().to_string(),
            id: self.id.clone(),
            ts: self.ts,
            event_name: self.event_name.clone(),
            level: self.level,
            payload: self.payload.clone(),
        }
    }

    /// Populate this message from raw wire data.
    ///
    /// Returns the message unchanged when `data` is not a complete record of
    /// this message's kind; callers detect that by re-checking fields.
    pub fn deserialize(self, data: &serde_json::Value) -> Self {
        let Ok(record) = serde_json::from_value::<EventMessageRecord>(data.clone()) else {
            return self;
        };
        if record.type_tag != self.kind.type_tag() {
            return self;
        }
        Self {
            kind: self.kind,
            id: record.id,
            ts: record.ts,
            event_name: record.event_name,
            level: record.level,
            payload: record.payload,
        }
    }

    /// Rebuild a message from its record, choosing the kind from the type tag
    pub fn from_record(record: EventMessageRecord) -> Result<Self, MessageError> {
        let kind = MessageKind::from_type_tag(&record.type_tag)
            .ok_or_else(|| MessageError::UnknownType(record.type_tag.clone()))?;
        Ok(Self {
            kind,
            id: record.id,
            ts: record.ts,
            event_name: record.event_name,
            level: record.level,
            payload: record.payload,
        })
    }

    /// Rebuild a message of an expected kind, rejecting any other type tag
    pub fn from_record_of_kind(
        kind: MessageKind,
        record: EventMessageRecord,
    ) -> Result<Self, MessageError> {
        if record.type_tag != kind.type_tag() {
            return Err(MessageError::TypeMismatch {
                expected: kind.type_tag().to_string(),
                found: record.type_tag,
            });
        }
        Self::from_record(record)
    }

    /// Parse raw JSON into a message of whichever kind its tag names
    pub fn from_value(data: &serde_json::Value) -> Result<Self, MessageError> {
        let record: EventMessageRecord = serde_json::from_value(data.clone())?;
        Self::from_record(record)
    }

    pub fn to_value(&self) -> serde_json::Value {
        // A record of strings, a timestamp and a JSON map always serializes
        serde_json::to_value(self.serialize()).unwrap_or(serde_json::Value::Null)
    }
}

impl From<&EventMessage> for EventMessageRecord {
    fn from(message: &EventMessage) -> Self {
        message.serialize()
    }
}

impl fmt::Display for EventMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}) {}", self.event_name, self.level, self.id)
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
