// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use herald_core::{EventLevel, FakeClock, MessageKind, SequentialIdGen};
use std::time::Duration;

struct Fixture {
    _dir: tempfile::TempDir,
    path: PathBuf,
    clock: FakeClock,
    ids: SequentialIdGen,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log");
        Self {
            _dir: dir,
            path,
            clock: FakeClock::new(),
            ids: SequentialIdGen::new("msg"),
        }
    }

    fn open(&self, config: FileLogWriterConfig) -> FileLogWriter<FakeClock> {
        FileLogWriter::open_with_clock(&self.path, config, self.clock.clone()).unwrap()
    }

    fn message(&self, name: &str) -> EventMessage {
        EventMessage::generate(MessageKind::Generic, name, EventLevel::Info, &self.ids, &self.clock)
    }

    fn segment_numbers(&self) -> Vec<u64> {
        list_segments(&self.path)
            .unwrap()
            .into_iter()
            .map(|(n, _)| n)
            .collect()
    }
}

fn ids(messages: &[EventMessage]) -> Vec<&str> {
    messages.iter().map(|m| m.id()).collect()
}

#[tokio::test]
async fn put_message_is_unsent_and_survives_reopen() {
    let fx = Fixture::new();
    let message = fx.message("herald.test.one");
    {
        let log = fx.open(FileLogWriterConfig::default());
        log.put_message(&message).await.unwrap();
        assert_eq!(ids(&log.get_messages_unsent().await.unwrap()), vec!["msg-1"]);
        log.close().await.unwrap();
    }

    let log = fx.open(FileLogWriterConfig::default());
    let unsent = log.get_messages_unsent().await.unwrap();
    assert_eq!(unsent, vec![message]);
    assert!(log.get_messages_sent().await.unwrap().is_empty());
}

#[tokio::test]
async fn confirm_marks_sent_once() {
    let fx = Fixture::new();
    let log = fx.open(FileLogWriterConfig::default());
    let message = fx.message("herald.test.one");
    log.put_message(&message).await.unwrap();

    fx.clock.advance(Duration::from_secs(5));
    log.confirm_message_sent(message.id()).await.unwrap();
    fx.clock.advance(Duration::from_secs(5));
    log.confirm_message_sent(message.id()).await.unwrap();

    let entries = log.entries().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].sent);
    assert_eq!(
        entries[0].confirmed_at.map(|t| t.to_rfc3339()),
        Some("2026-01-01T00:00:05+00:00".to_string())
    );

    // Second confirm wrote nothing
    let lines = read_segment(&fx.path.join(segment_file_name(1))).unwrap().lines;
    assert_eq!(lines.len(), 2);
}

#[tokio::test]
async fn confirm_unknown_id_is_a_no_op() {
    let fx = Fixture::new();
    let log = fx.open(FileLogWriterConfig::default());

    log.confirm_message_sent("nope").await.unwrap();

    assert!(log.entries().await.unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_put_keeps_first_entry() {
    let fx = Fixture::new();
    let log = fx.open(FileLogWriterConfig::default());
    let message = fx.message("herald.test.one");

    log.put_message(&message).await.unwrap();
    log.confirm_message_sent(message.id()).await.unwrap();
    log.put_message(&message).await.unwrap();

    let entries = log.entries().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].sent);
}

#[tokio::test]
async fn queries_preserve_storage_order() {
    let fx = Fixture::new();
    let log = fx.open(FileLogWriterConfig::default());
    for name in ["a", "b", "c", "d"] {
        log.put_message(&fx.message(name)).await.unwrap();
    }
    log.confirm_message_sent("msg-3").await.unwrap();
    log.confirm_message_sent("msg-1").await.unwrap();

    assert_eq!(
        ids(&log.get_messages().await.unwrap()),
        vec!["msg-1", "msg-2", "msg-3", "msg-4"]
    );
    assert_eq!(ids(&log.get_messages_sent().await.unwrap()), vec!["msg-1", "msg-3"]);
    assert_eq!(ids(&log.get_messages_unsent().await.unwrap()), vec!["msg-2", "msg-4"]);
}

#[tokio::test]
async fn start_logging_rotates_only_a_used_segment() {
    let fx = Fixture::new();
    let log = fx.open(FileLogWriterConfig::default());

    log.start_logging().await.unwrap();
    assert_eq!(log.current_segment(), 1);

    log.put_message(&fx.message("a")).await.unwrap();
    log.start_logging().await.unwrap();
    assert_eq!(log.current_segment(), 2);

    log.put_message(&fx.message("b")).await.unwrap();
    assert_eq!(fx.segment_numbers(), vec![1, 2]);
    assert_eq!(ids(&log.get_messages_unsent().await.unwrap()), vec!["msg-1", "msg-2"]);
}

#[tokio::test]
async fn confirmation_in_later_segment_applies_to_earlier_message() {
    let fx = Fixture::new();
    {
        let log = fx.open(FileLogWriterConfig::default());
        log.put_message(&fx.message("a")).await.unwrap();
        log.start_logging().await.unwrap();
        log.confirm_message_sent("msg-1").await.unwrap();
        log.close().await.unwrap();
    }

    let log = fx.open(FileLogWriterConfig::default());
    assert_eq!(ids(&log.get_messages_sent().await.unwrap()), vec!["msg-1"]);

    // Status was rebuilt, so this is a no-op
    log.confirm_message_sent("msg-1").await.unwrap();
    let lines = read_segment(&fx.path.join(segment_file_name(2))).unwrap().lines;
    assert_eq!(lines.len(), 1);
}

#[tokio::test]
async fn oversized_segment_rotates_on_next_put() {
    let fx = Fixture::new();
    let log = fx.open(FileLogWriterConfig {
        max_segment_bytes: 1,
        keep_segments: 10,
    });

    for name in ["a", "b", "c"] {
        log.put_message(&fx.message(name)).await.unwrap();
    }

    assert_eq!(fx.segment_numbers(), vec![1, 2, 3]);
    assert_eq!(log.get_messages().await.unwrap().len(), 3);
}

#[tokio::test]
async fn start_logging_prunes_confirmed_segments_beyond_retention() {
    let fx = Fixture::new();
    let log = fx.open(FileLogWriterConfig {
        max_segment_bytes: u64::MAX,
        keep_segments: 2,
    });

    for name in ["a", "b", "c"] {
        log.put_message(&fx.message(name)).await.unwrap();
        log.start_logging().await.unwrap();
    }
    // Segments 1..=3 hold one message each, 4 is current
    log.confirm_message_sent("msg-1").await.unwrap();
    log.confirm_message_sent("msg-3").await.unwrap();
    log.put_message(&fx.message("d")).await.unwrap();
    log.start_logging().await.unwrap();

    // Segment 1 was drained and pruned; segment 2 holds unsent msg-2 and stops pruning
    assert_eq!(fx.segment_numbers(), vec![2, 3, 4, 5]);
    assert_eq!(
        ids(&log.get_messages_unsent().await.unwrap()),
        vec!["msg-2", "msg-4"]
    );
    assert_eq!(ids(&log.get_messages_sent().await.unwrap()), vec!["msg-3"]);
}

#[tokio::test]
async fn rotation_prunes_confirmed_segments_without_start_logging() {
    let fx = Fixture::new();
    let log = fx.open(FileLogWriterConfig {
        max_segment_bytes: 1,
        keep_segments: 2,
    });

    for i in 0..10 {
        let message = fx.message(&format!("herald.test.{i}"));
        log.put_message(&message).await.unwrap();
        log.confirm_message_sent(message.id()).await.unwrap();
    }

    assert_eq!(fx.segment_numbers(), vec![9, 10]);
    assert_eq!(ids(&log.get_messages_sent().await.unwrap()), vec!["msg-9", "msg-10"]);
}

#[tokio::test]
async fn rotation_keeps_segments_with_unsent_messages() {
    let fx = Fixture::new();
    let log = fx.open(FileLogWriterConfig {
        max_segment_bytes: 1,
        keep_segments: 1,
    });

    log.put_message(&fx.message("a")).await.unwrap();
    for name in ["b", "c"] {
        let message = fx.message(name);
        log.put_message(&message).await.unwrap();
        log.confirm_message_sent(message.id()).await.unwrap();
    }

    assert_eq!(fx.segment_numbers(), vec![1, 2, 3]);
    assert_eq!(ids(&log.get_messages_unsent().await.unwrap()), vec!["msg-1"]);
}

#[tokio::test]
async fn torn_tail_starts_new_segment_and_keeps_valid_lines() {
    let fx = Fixture::new();
    {
        let log = fx.open(FileLogWriterConfig::default());
        log.put_message(&fx.message("a")).await.unwrap();
        log.close().await.unwrap();
    }
    let mut file = OpenOptions::new()
        .append(true)
        .open(fx.path.join(segment_file_name(1)))
        .unwrap();
    file.write_all(b"{\"sequence\":1,\"timestamp_mic").unwrap();
    drop(file);

    let log = fx.open(FileLogWriterConfig::default());
    assert_eq!(log.current_segment(), 2);

    log.put_message(&fx.message("b")).await.unwrap();
    assert_eq!(ids(&log.get_messages().await.unwrap()), vec!["msg-1", "msg-2"]);
}

#[tokio::test]
async fn operations_after_close_fail_and_close_is_idempotent() {
    let fx = Fixture::new();
    let log = fx.open(FileLogWriterConfig::default());

    log.close().await.unwrap();
    log.close().await.unwrap();

    assert!(matches!(
        log.put_message(&fx.message("a")).await,
        Err(LogWriterError::Closed)
    ));
    assert!(matches!(log.entries().await, Err(LogWriterError::Closed)));
    assert!(matches!(
        log.confirm_message_sent("msg-1").await,
        Err(LogWriterError::Closed)
    ));
}
