// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Delivery specs
//!
//! Write-ahead logging, broadcast fan-out and confirmation.

use crate::prelude::*;

#[tokio::test]
async fn initialize_with_no_destinations_leaves_one_sent_event() {
    let t = TestBus::new();

    t.bus.initialize(InitOptions::new()).await.unwrap();

    let sent = t.bus.get_events_sent().await.unwrap();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].event_name(), herald_engine::BUS_INITIALIZED_EVENT);
    assert_eq!(sent[0].level(), EventLevel::Debug);
    assert!(t.bus.get_events_unsent().await.unwrap().is_empty());
}

#[tokio::test]
async fn send_with_no_destinations_is_sent_not_unsent() {
    let t = TestBus::new();
    let m = message("herald.workflow.started");

    t.bus.send(m.clone()).await.unwrap();

    assert_eq!(ids(&t.bus.get_events_sent().await.unwrap()), vec![m.id()]);
    assert!(t.bus.get_events_unsent().await.unwrap().is_empty());
}

#[tokio::test]
async fn message_is_logged_unsent_until_confirmed() {
    let t = TestBus::new();
    let (dest, handle) = silent("audit");
    t.bus.add_destination(handle).await.unwrap();
    let m = message("herald.workflow.started");

    t.bus.send(m.clone()).await.unwrap();

    assert_eq!(dest.received_ids(), vec![m.id()]);
    assert_eq!(ids(&t.bus.get_events_unsent().await.unwrap()), vec![m.id()]);
    assert!(t.bus.get_events_sent().await.unwrap().is_empty());
}

#[tokio::test]
async fn confirming_twice_is_harmless() {
    let t = TestBus::new();
    let (_dest, handle) = silent("audit");
    t.bus.add_destination(handle).await.unwrap();
    let m = message("herald.workflow.started");
    t.bus.send(m.clone()).await.unwrap();

    t.bus.confirm_sent(&m).await.unwrap();
    let after_first = t.bus.get_events(EventQuery::Sent).await.unwrap();
    t.bus.confirm_sent(&m).await.unwrap();
    let after_second = t.bus.get_events(EventQuery::Sent).await.unwrap();

    assert_eq!(ids(&after_first), vec![m.id()]);
    assert_eq!(after_first, after_second);
    assert!(t.bus.get_events_unsent().await.unwrap().is_empty());
}

#[tokio::test]
async fn any_destination_confirming_marks_the_message_sent() {
    let t = TestBus::new();
    let (_quiet, quiet_handle) = silent("quiet");
    let (_loud, loud_handle) = fake("loud");
    t.bus.add_destination(quiet_handle).await.unwrap();
    t.bus.add_destination(loud_handle).await.unwrap();
    let m = message("herald.workflow.started");

    t.bus.send(m.clone()).await.unwrap();

    assert_eq!(ids(&t.bus.get_events_sent().await.unwrap()), vec![m.id()]);
}

#[tokio::test]
async fn one_failing_destination_does_not_starve_the_others() {
    let t = TestBus::new();
    let (broken, broken_handle) = fake("broken");
    broken.set_fail(true);
    let (crashing, crashing_handle) = fake("crashing");
    crashing.set_panic(true);
    let (healthy, healthy_handle) = fake("healthy");
    for handle in [broken_handle, crashing_handle, healthy_handle] {
        t.bus.add_destination(handle).await.unwrap();
    }
    let m = message("herald.workflow.failed");

    let report = t.bus.send(m.clone()).await.unwrap();

    assert_eq!(report.delivered, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.panicked, 1);
    assert_eq!(healthy.received_ids(), vec![m.id()]);
    assert_eq!(ids(&t.bus.get_events_sent().await.unwrap()), vec![m.id()]);
}

#[tokio::test]
async fn broadcast_reaches_disabled_and_filtered_destinations() {
    let t = TestBus::new();
    let disabled = FakeDestination::new(&DestinationOptions::new().with_id("disabled"));
    t.bus.add_destination(std::sync::Arc::new(disabled.clone())).await.unwrap();
    let (narrow, narrow_handle) = fake("narrow");
    narrow.set_subscription_set(SubscriptionSet::new().with_group("herald.audit"));
    t.bus.add_destination(narrow_handle).await.unwrap();

    t.bus.send(message("herald.workflow.started")).await.unwrap();

    assert_eq!(disabled.received().len(), 1);
    assert_eq!(narrow.received().len(), 1);
}
