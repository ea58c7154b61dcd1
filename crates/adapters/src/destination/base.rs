// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State shared by every destination variant

use herald_core::{
    Credentials, DestinationOptions, DestinationRecord, EventMessage, EventPattern, IdGen,
    SubscriptionSet, UuidIdGen, DEFAULT_DESTINATION_LABEL,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

/// Identity, enable state and filters of a destination
///
/// Interior mutability lets a registered destination be toggled and
/// re-filtered through a shared handle.
#[derive(Debug)]
pub struct DestinationCore {
    type_tag: String,
    id: String,
    label: String,
    enabled: AtomicBool,
    subscribed_events: RwLock<Vec<String>>,
    subscription: RwLock<SubscriptionSet>,
    credentials: Credentials,
}

impl DestinationCore {
    /// Build from options: a missing id is generated, a missing label is
    /// "Log Destination", and destinations start disabled.
    pub fn new(type_tag: impl Into<String>, options: &DestinationOptions) -> Self {
        Self::with_id_gen(type_tag, options, &UuidIdGen)
    }

    pub fn with_id_gen(
        type_tag: impl Into<String>,
        options: &DestinationOptions,
        id_gen: &impl IdGen,
    ) -> Self {
        Self {
            type_tag: type_tag.into(),
            id: options.id.clone().unwrap_or_else(|| id_gen.next_id()),
            label: options
                .label
                .clone()
                .unwrap_or_else(|| DEFAULT_DESTINATION_LABEL.to_string()),
            enabled: AtomicBool::new(options.enabled.unwrap_or(false)),
            subscribed_events: RwLock::new(options.subscribed_events.clone().unwrap_or_default()),
            subscription: RwLock::new(
                options
                    .subscription_set
                    .as_ref()
                    .map(SubscriptionSet::from_options)
                    .unwrap_or_default(),
            ),
            credentials: options.credentials.clone().unwrap_or_default(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn enable(&self) {
        self.enabled.store(true, Ordering::SeqCst);
    }

    pub fn disable(&self) {
        self.enabled.store(false, Ordering::SeqCst);
    }

    pub fn subscribed_events(&self) -> Vec<String> {
        self.subscribed_events
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn set_subscribed_events(&self, events: Vec<String>) {
        *self
            .subscribed_events
            .write()
            .unwrap_or_else(|e| e.into_inner()) = events;
    }

    /// False while disabled; otherwise true when any subscribed entry is the
    /// wildcard or a prefix of the event name
    pub fn has_subscribed_to_event(&self, message: &EventMessage) -> bool {
        if !self.is_enabled() {
            return false;
        }
        self.subscribed_events
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .any(|entry| EventPattern::new(entry).matches(message.event_name()))
    }

    pub fn subscription_set(&self) -> SubscriptionSet {
        self.subscription
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn set_subscription_set(&self, set: SubscriptionSet) {
        *self.subscription.write().unwrap_or_else(|e| e.into_inner()) = set;
    }

    pub fn reset_subscription_set(&self) {
        self.subscription
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .reset_to_empty();
    }

    /// Enabled, and either subscribed to the event or matched by the filter
    pub fn wants(&self, message: &EventMessage) -> bool {
        self.has_subscribed_to_event(message)
            || (self.is_enabled()
                && self
                    .subscription
                    .read()
                    .unwrap_or_else(|e| e.into_inner())
                    .matches(message))
    }

    /// Serialized form; credentials are left out
    pub fn record(&self, options: serde_json::Map<String, serde_json::Value>) -> DestinationRecord {
        let subscription = self.subscription_set();
        DestinationRecord {
            type_tag: self.type_tag.clone(),
            id: self.id.clone(),
            label: self.label.clone(),
            enabled: self.is_enabled(),
            subscribed_events: self.subscribed_events(),
            subscription_set: (!subscription.is_empty()).then(|| subscription.serialize()),
            options,
        }
    }
}

#[cfg(test)]
#[path = "base_tests.rs"]
mod tests;
