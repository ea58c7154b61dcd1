// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Destination wire records
//!
//! The behavior of a destination lives in `herald-adapters`; this module only
//! holds the shapes that cross a process or storage boundary.

use crate::subscription::SubscriptionSetOptions;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Label given to a destination constructed without one
pub const DEFAULT_DESTINATION_LABEL: &str = "Log Destination";

/// Type tag of a destination with no concrete variant
pub const ABSTRACT_DESTINATION_TYPE: &str = "$$AbstractMessageEventBusDestination";

/// Serialized form of a destination. Credentials are never part of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationRecord {
    #[serde(rename = "__type")]
    pub type_tag: String,
    pub id: String,
    pub label: String,
    pub enabled: bool,
    #[serde(default)]
    pub subscribed_events: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_set: Option<SubscriptionSetOptions>,
    /// Variant-specific settings (file path, endpoint, ...)
    #[serde(flatten)]
    pub options: serde_json::Map<String, serde_json::Value>,
}

/// Row in the destination store: `{ id, destination }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedDestination {
    pub id: String,
    pub destination: DestinationRecord,
}

impl PersistedDestination {
    pub fn new(destination: DestinationRecord) -> Self {
        Self {
            id: destination.id.clone(),
            destination,
        }
    }
}

/// Secret material for outbound delivery
///
/// Deserializable so it can arrive with construction options, but it has no
/// `Serialize` impl and its `Debug` output is redacted.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Credentials(BTreeMap<String, String>);

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.0.keys().map(|k| (k, "<redacted>")))
            .finish()
    }
}

/// Construction options for a destination. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationOptions {
    #[serde(default, rename = "__type")]
    pub type_tag: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub subscribed_events: Option<Vec<String>>,
    #[serde(default)]
    pub subscription_set: Option<SubscriptionSetOptions>,
    #[serde(default)]
    pub credentials: Option<Credentials>,
    #[serde(flatten)]
    pub options: serde_json::Map<String, serde_json::Value>,
}

impl DestinationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    pub fn with_subscribed_events<I, S>(mut self, events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subscribed_events = Some(events.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_subscription_set(mut self, set: SubscriptionSetOptions) -> Self {
        self.subscription_set = Some(set);
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}

impl From<DestinationRecord> for DestinationOptions {
    fn from(record: DestinationRecord) -> Self {
        Self {
            type_tag: Some(record.type_tag),
            id: Some(record.id),
            label: Some(record.label),
            enabled: Some(record.enabled),
            subscribed_events: Some(record.subscribed_events),
            subscription_set: record.subscription_set,
            credentials: None,
            options: record.options,
        }
    }
}

#[cfg(test)]
#[path = "destination_tests.rs"]
mod tests;
