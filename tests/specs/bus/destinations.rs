//! Destination registry specs

use crate::prelude::*;

#[tokio::test]
async fn adding_the_same_id_twice_keeps_one_entry_and_closes_the_first() {
    let t = TestBus::new();
    let (first, first_handle) = fake("audit");
    let (second, second_handle) = fake("audit");

    t.bus.add_destination(first_handle).await.unwrap();
    t.bus.add_destination(second_handle).await.unwrap();

    assert_eq!(t.bus.destination_count(), 1);
    assert_eq!(first.close_calls(), 1);
    assert_eq!(second.close_calls(), 0);

    let m = message("herald.workflow.started");
    t.bus.send(m.clone()).await.unwrap();
    assert!(first.received().is_empty());
    assert_eq!(second.received_ids(), vec![m.id()]);
}

#[tokio::test]
async fn removing_a_destination_evicts_and_deletes_its_record() {
    let t = TestBus::new();
    let (dest, handle) = fake("audit");
    t.bus.add_destination(handle).await.unwrap();
    t.bus.save_destination("audit").await.unwrap();
    assert!(t.store.get("audit").is_some());

    let removed = t.bus.remove_destination("audit").await.unwrap();

    assert!(removed.is_some());
    assert!(t.bus.get_destination("audit").is_none());
    assert!(t.store.get("audit").is_none());
    assert_eq!(dest.close_calls(), 1);
}

#[tokio::test]
async fn removing_an_unknown_destination_is_a_quiet_no_op() {
    let t = TestBus::new();
    t.bus.add_destination(fake("audit").1).await.unwrap();

    let removed = t.bus.remove_destination("missing").await.unwrap();

    assert!(removed.is_none());
    assert_eq!(t.bus.destination_count(), 1);
}

#[tokio::test]
async fn failed_record_delete_keeps_the_destination() {
    let t = TestBus::new();
    t.bus.add_destination(fake("audit").1).await.unwrap();
    t.store.set_fail_deletes(true);

    assert!(matches!(
        t.bus.remove_destination("audit").await,
        Err(BusError::Store(_))
    ));
    assert!(t.bus.get_destination("audit").is_some());
}

#[tokio::test]
async fn disabled_destination_has_not_subscribed_until_enabled() {
    let t = TestBus::new();
    let dest = FakeDestination::new(
        &DestinationOptions::new()
            .with_id("core")
            .with_subscribed_events(["herald.core"]),
    );
    t.bus.add_destination(std::sync::Arc::new(dest.clone())).await.unwrap();
    let core_event = message("herald.core.eventBusInitialized");
    let other_event = message("herald.workflow.started");

    assert!(!dest.has_subscribed_to_event(&core_event));
    assert!(!dest.has_subscribed_to_event(&other_event));

    t.bus.get_destination("core").unwrap().enable();

    assert!(dest.has_subscribed_to_event(&core_event));
    assert!(dest.has_subscribed_to_event(&message("herald.core.shutdown")));
    assert!(!dest.has_subscribed_to_event(&other_event));
}

#[tokio::test]
async fn find_destination_returns_all_for_an_unknown_id() {
    let t = TestBus::new();
    for id in ["b", "a"] {
        t.bus.add_destination(fake(id).1).await.unwrap();
    }

    let found: Vec<String> = t
        .bus
        .find_destination(Some("zzz"))
        .into_iter()
        .map(|r| r.id)
        .collect();

    assert_eq!(found, vec!["a", "b"]);
    assert_eq!(t.bus.find_destination(Some("b"))[0].id, "b");
}
