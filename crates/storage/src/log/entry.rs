// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log line structure with checksum verification
//!
//! Each line carries a sequence number, a timestamp, the record and a CRC32
//! checksum of the serialized record.

use chrono::{DateTime, Utc};
use herald_core::EventMessageRecord;
use serde::{Deserialize, Serialize};

/// What a log line records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LogRecord {
    /// A message was accepted by the bus
    Message { message: EventMessageRecord },
    /// A message was confirmed delivered
    Confirmed {
        id: String,
        #[serde(rename = "confirmedAt")]
        confirmed_at: DateTime<Utc>,
    },
}

impl LogRecord {
    pub fn message_id(&self) -> &str {
        match self {
            LogRecord::Message { message } => &message.id,
            LogRecord::Confirmed { id, .. } => id,
        }
    }
}

/// A single line in a log segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogLine {
    /// Monotonically increasing across segments
    pub sequence: u64,
    /// Microseconds since Unix epoch
    pub timestamp_micros: i64,
    pub record: LogRecord,
    /// CRC32 checksum of the serialized record
    pub checksum: u32,
}

impl LogLine {
    pub fn new(sequence: u64, timestamp: DateTime<Utc>, record: LogRecord) -> Self {
        let checksum = Self::calculate_checksum(&record);
        Self {
            sequence,
            timestamp_micros: timestamp.timestamp_micros(),
            record,
            checksum,
        }
    }

    fn calculate_checksum(record: &LogRecord) -> u32 {
        // Records hold strings, a timestamp and JSON values, which always serialize
        let json = serde_json::to_string(record).unwrap_or_default();
        crc32fast::hash(json.as_bytes())
    }

    /// Verify the checksum matches the record
    pub fn verify(&self) -> bool {
        self.checksum == Self::calculate_checksum(&self.record)
    }

    /// Serialize to newline-delimited JSON (one line, no trailing newline)
    pub fn to_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse from a single line of JSON
    pub fn from_line(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}

#[cfg(test)]
#[path = "entry_tests.rs"]
mod tests;
