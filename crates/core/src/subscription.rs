// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event name patterns and subscription filters

use crate::message::{EventLevel, EventMessage};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Pattern entry that matches every event name
pub const WILDCARD: &str = "*";

/// Pattern for matching dot-hierarchical event names
/// Supports:
///   - Prefix: "herald.core" matches "herald.core.eventBusInitialized"
///   - Wildcard: "*" matches everything
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventPattern(String);

impl EventPattern {
    pub fn new(pattern: &str) -> Self {
        Self(pattern.to_string())
    }

    /// Check if this pattern matches an event name
    pub fn matches(&self, event_name: &str) -> bool {
        // Empty pattern matches nothing
        if self.0.is_empty() {
            return false;
        }
        self.is_wildcard() || event_name.starts_with(&self.0)
    }

    pub fn is_wildcard(&self) -> bool {
        self.0 == WILDCARD
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EventPattern {
    fn from(pattern: &str) -> Self {
        Self::new(pattern)
    }
}

/// Serialized form of a [`SubscriptionSet`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionSetOptions {
    #[serde(default)]
    pub event_groups: Vec<String>,
    #[serde(default)]
    pub event_names: Vec<String>,
    #[serde(default)]
    pub event_levels: Vec<EventLevel>,
}

/// Predicate over (event name, level) deciding whether a destination wants a message
///
/// Groups are name prefixes, names are exact matches, and an empty level set
/// admits any level. With no groups and no names the set matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionSet {
    event_groups: BTreeSet<EventPattern>,
    event_names: BTreeSet<String>,
    event_levels: BTreeSet<EventLevel>,
}

impl SubscriptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_options(options: &SubscriptionSetOptions) -> Self {
        Self {
            event_groups: options
                .event_groups
                .iter()
                .map(|g| EventPattern::new(g))
                .collect(),
            event_names: options.event_names.iter().cloned().collect(),
            event_levels: options.event_levels.iter().copied().collect(),
        }
    }

    pub fn with_group(mut self, group: &str) -> Self {
        self.event_groups.insert(EventPattern::new(group));
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.event_names.insert(name.to_string());
        self
    }

    pub fn with_level(mut self, level: EventLevel) -> Self {
        self.event_levels.insert(level);
        self
    }

    pub fn matches(&self, message: &EventMessage) -> bool {
        self.matches_parts(message.event_name(), message.level())
    }

    /// Both the level check and the name check must pass
    pub fn matches_parts(&self, event_name: &str, level: EventLevel) -> bool {
        self.level_matches(level) && self.name_matches(event_name)
    }

    fn level_matches(&self, level: EventLevel) -> bool {
        self.event_levels.is_empty() || self.event_levels.contains(&level)
    }

    fn name_matches(&self, event_name: &str) -> bool {
        self.event_names.contains(event_name)
            || self.event_names.contains(WILDCARD)
            || self.event_groups.iter().any(|g| g.matches(event_name))
    }

    /// True when no name or group is configured, i.e. nothing can match
    pub fn is_empty(&self) -> bool {
        self.event_groups.is_empty() && self.event_names.is_empty()
    }

    /// Clear all three sets
    pub fn reset_to_empty(&mut self) {
        self.event_groups.clear();
        self.event_names.clear();
        self.event_levels.clear();
    }

    pub fn serialize(&self) -> SubscriptionSetOptions {
        SubscriptionSetOptions {
            event_groups: self
                .event_groups
                .iter()
                .map(|g| g.as_str().to_string())
                .collect(),
            event_names: self.event_names.iter().cloned().collect(),
            event_levels: self.event_levels.iter().copied().collect(),
        }
    }
}

#[cfg(test)]
#[path = "subscription_tests.rs"]
mod tests;
