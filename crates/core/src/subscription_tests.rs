use super::*;
use yare::parameterized;

#[test]
fn prefix_pattern_matches_names_below_it() {
    let pattern = EventPattern::new("herald.core");
    assert!(pattern.matches("herald.core.eventBusInitialized"));
    assert!(pattern.matches("herald.core"));
    assert!(!pattern.matches("herald.workflow.started"));
}

#[test]
fn wildcard_pattern_matches_everything() {
    let pattern = EventPattern::new(WILDCARD);
    assert!(pattern.is_wildcard());
    assert!(pattern.matches("anything.at.all"));
    assert!(pattern.matches(""));
}

#[test]
fn empty_pattern_matches_nothing() {
    assert!(!EventPattern::new("").matches("herald.core"));
}

#[parameterized(
    group_matches_child = { "n8n.core.eventBusInitialized", EventLevel::Debug, true },
    group_rejects_sibling = { "n8n.workflow.started", EventLevel::Debug, false },
    exact_name_matches = { "herald.audit.login", EventLevel::Info, true },
    exact_name_needs_full_match = { "herald.audit", EventLevel::Info, false },
)]
fn groups_and_names(event_name: &str, level: EventLevel, expected: bool) {
    let set = SubscriptionSet::new()
        .with_group("n8n.core")
        .with_name("herald.audit.login");

    assert_eq!(set.matches_parts(event_name, level), expected);
}

#[parameterized(
    allowed_level = { EventLevel::Error, true },
    other_allowed_level = { EventLevel::Warning, true },
    disallowed_level = { EventLevel::Debug, false },
)]
fn level_restriction(level: EventLevel, expected: bool) {
    let set = SubscriptionSet::new()
        .with_group("herald")
        .with_level(EventLevel::Error)
        .with_level(EventLevel::Warning);

    assert_eq!(set.matches_parts("herald.core.failure", level), expected);
}

#[test]
fn empty_level_set_matches_any_level() {
    let set = SubscriptionSet::new().with_group("herald");
    for level in EventLevel::ALL {
        assert!(set.matches_parts("herald.x", level));
    }
}

#[test]
fn empty_set_matches_nothing() {
    let set = SubscriptionSet::new().with_level(EventLevel::Info);
    assert!(set.is_empty());
    assert!(!set.matches_parts("n8n.core.eventBusInitialized", EventLevel::Info));
}

#[test]
fn wildcard_group_matches_every_name() {
    let set = SubscriptionSet::new().with_group(WILDCARD);
    assert!(set.matches_parts("n8n.workflow.started", EventLevel::Info));
    assert!(set.matches_parts("other", EventLevel::Verbose));
}

#[test]
fn wildcard_name_matches_every_name() {
    let set = SubscriptionSet::new().with_name(WILDCARD);
    assert!(set.matches_parts("anything", EventLevel::Debug));
}

#[test]
fn reset_to_empty_clears_all_sets() {
    let mut set = SubscriptionSet::new()
        .with_group("a")
        .with_name("b")
        .with_level(EventLevel::Info);

    set.reset_to_empty();

    assert_eq!(set, SubscriptionSet::new());
    assert_eq!(set.serialize(), SubscriptionSetOptions::default());
}

#[test]
fn options_round_trip_through_serialized_form() {
    let options = SubscriptionSetOptions {
        event_groups: vec!["herald.core".to_string()],
        event_names: vec!["herald.audit.login".to_string()],
        event_levels: vec![EventLevel::Info],
    };

    let set = SubscriptionSet::from_options(&options);
    let json = serde_json::to_value(set.serialize()).unwrap();

    assert_eq!(json["eventGroups"][0], "herald.core");
    assert_eq!(json["eventNames"][0], "herald.audit.login");
    assert_eq!(json["eventLevels"][0], "info");
    assert_eq!(set.serialize(), options);
}
