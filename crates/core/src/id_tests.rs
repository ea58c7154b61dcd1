use super::*;

#[test]
fn uuid_ids_are_distinct_hyphenated_v4() {
    let first = UuidIdGen.next_id();
    let second = UuidIdGen.next_id();

    assert_ne!(first, second);
    let parsed = uuid::Uuid::parse_str(&first).unwrap();
    assert_eq!(parsed.get_version_num(), 4);
}

#[test]
fn sequential_ids_count_across_clones() {
    let messages = SequentialIdGen::new("msg");
    let copy = messages.clone();

    assert_eq!(messages.next_id(), "msg-1");
    assert_eq!(copy.next_id(), "msg-2");
    assert_eq!(SequentialIdGen::new("dest").next_id(), "dest-1");
}
