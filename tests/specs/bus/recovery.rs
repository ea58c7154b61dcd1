//! Redelivery and restart specs

use crate::prelude::*;
use std::time::Duration;

#[tokio::test]
async fn unconfirmed_message_is_redelivered_to_every_destination() {
    let t = TestBus::with_interval(Duration::from_millis(25));
    let (a, a_handle) = silent("a");
    let (b, b_handle) = silent("b");
    t.bus
        .initialize(InitOptions::new().with_destination(a_handle).with_destination(b_handle))
        .await
        .unwrap();
    let m = message("herald.workflow.started");

    t.bus.send(m.clone()).await.unwrap();
    assert_eq!(a.deliveries_of(m.id()), 1);

    eventually(|| a.deliveries_of(m.id()) >= 2 && b.deliveries_of(m.id()) >= 2).await;
    t.bus.close().await.unwrap();
}

#[tokio::test]
async fn redelivery_stops_once_confirmed() {
    let t = TestBus::new();
    let (dest, handle) = silent("a");
    t.bus.add_destination(handle).await.unwrap();
    let m = message("herald.workflow.started");
    t.bus.send(m.clone()).await.unwrap();

    dest.set_auto_confirm(true);
    assert_eq!(t.bus.redeliver_unsent().await.unwrap(), 1);
    assert_eq!(t.bus.redeliver_unsent().await.unwrap(), 0);
    assert_eq!(dest.deliveries_of(m.id()), 2);
}

#[tokio::test]
async fn destinations_added_later_receive_the_next_sweep() {
    let t = TestBus::new();
    let (_first, first_handle) = silent("first");
    t.bus.add_destination(first_handle).await.unwrap();
    let m = message("herald.workflow.started");
    t.bus.send(m.clone()).await.unwrap();

    let (late, late_handle) = fake("late");
    t.bus.add_destination(late_handle).await.unwrap();
    t.bus.redeliver_unsent().await.unwrap();

    assert_eq!(late.received_ids(), vec![m.id()]);
    assert!(t.bus.get_events_unsent().await.unwrap().is_empty());
}

#[tokio::test]
async fn unsent_messages_survive_a_restart() {
    let t = TestBus::new();
    let (_before, before_handle) = silent("audit");
    t.bus.add_destination(before_handle).await.unwrap();
    let m = message("herald.workflow.started");
    t.bus.send(m.clone()).await.unwrap();
    t.bus.close().await.unwrap();

    let restarted = t.reopen();
    assert_eq!(ids(&restarted.get_events_unsent().await.unwrap()), vec![m.id()]);

    let (after, after_handle) = fake("audit");
    restarted
        .initialize(InitOptions::new().with_destination(after_handle))
        .await
        .unwrap();

    assert_eq!(after.deliveries_of(m.id()), 1);
    assert!(restarted.get_events_unsent().await.unwrap().is_empty());
    restarted.close().await.unwrap();
}

#[tokio::test]
async fn closed_bus_refuses_new_messages() {
    let t = TestBus::new();
    let (dest, handle) = fake("audit");
    t.bus.initialize(InitOptions::new().with_destination(handle)).await.unwrap();

    t.bus.close().await.unwrap();
    t.bus.close().await.unwrap();

    assert_eq!(dest.close_calls(), 1);
    assert!(matches!(
        t.bus.send(message("herald.late")).await,
        Err(BusError::Closed)
    ));
}
