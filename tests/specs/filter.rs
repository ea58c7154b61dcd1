//! Subscription filter specs

use crate::prelude::*;

#[test]
fn group_matches_names_under_it_only() {
    let set = SubscriptionSet::new().with_group("herald.core");

    assert!(set.matches(&message("herald.core.eventBusInitialized")));
    assert!(!set.matches(&message("herald.workflow.started")));
}

#[test]
fn empty_filter_matches_nothing() {
    let set = SubscriptionSet::new();

    assert!(!set.matches(&message("herald.core.eventBusInitialized")));
    assert!(!set.matches(&message("")));
}

#[test]
fn wildcard_matches_every_name() {
    let set = SubscriptionSet::new().with_name("*");

    for name in ["herald.core.eventBusInitialized", "anything", ""] {
        assert!(set.matches(&message(name)), "{name}");
    }
}

#[tokio::test]
async fn publish_only_reaches_interested_listeners() {
    let t = TestBus::new();
    let (audit, audit_handle) = fake("audit");
    audit.set_subscription_set(SubscriptionSet::new().with_group("herald.audit"));
    let (workflow, workflow_handle) = fake("workflow");
    workflow.set_subscription_set(SubscriptionSet::new().with_group("herald.workflow"));
    for handle in [audit_handle, workflow_handle] {
        let id = handle.id().to_string();
        t.bus.add_destination(handle).await.unwrap();
        t.bus.start_listening(&id).unwrap();
    }
    let m = message("herald.audit.login");

    assert_eq!(t.bus.publish(&m), 1);

    eventually(|| audit.deliveries_of(m.id()) == 1).await;
    assert!(workflow.received().is_empty());
    // The push path does not log
    assert!(t.bus.get_events(EventQuery::All).await.unwrap().is_empty());
}
