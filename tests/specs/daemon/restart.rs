//! Daemon restart specs
//!
//! Destinations and unsent messages carry over between daemon runs that
//! share a state directory.

use herald_adapters::{destination_from_options, FILE_DESTINATION_TYPE};
use herald_core::DestinationOptions;
use herald_daemon::{lifecycle, Config, DaemonClient};

use crate::prelude::*;

fn file_destination(dir: &std::path::Path, id: &str) -> std::sync::Arc<dyn Destination> {
    let mut options = DestinationOptions::new()
        .with_id(id)
        .enabled(true)
        .with_option("path", dir.join(format!("{id}.jsonl")).to_string_lossy().to_string());
    options.type_tag = Some(FILE_DESTINATION_TYPE.to_string());
    destination_from_options(options).unwrap()
}

#[tokio::test]
async fn saved_destination_is_restored_on_next_start() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::for_state_dir(dir.path(), None).unwrap();

    let first = lifecycle::startup(&config).await.unwrap();
    first
        .bus
        .add_destination(file_destination(dir.path(), "audit"))
        .await
        .unwrap();
    first.bus.save_destination("audit").await.unwrap();
    first.shutdown().await.unwrap();
    drop(first);

    let second = lifecycle::startup(&config).await.unwrap();
    let records = second.bus.find_destination(Some("audit"));
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].type_tag, FILE_DESTINATION_TYPE);

    let m = message("herald.workflow.started");
    second.bus.send(m.clone()).await.unwrap();
    let written = std::fs::read_to_string(dir.path().join("audit.jsonl")).unwrap();
    assert!(written.contains(m.id()));
    second.shutdown().await.unwrap();
}

#[tokio::test]
async fn unsaved_destination_is_gone_after_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::for_state_dir(dir.path(), None).unwrap();

    let first = lifecycle::startup(&config).await.unwrap();
    first
        .bus
        .add_destination(file_destination(dir.path(), "scratch"))
        .await
        .unwrap();
    first.shutdown().await.unwrap();
    drop(first);

    let second = lifecycle::startup(&config).await.unwrap();
    assert_eq!(second.bus.destination_count(), 0);
    second.shutdown().await.unwrap();
}

#[tokio::test]
async fn client_cannot_connect_after_shutdown() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::for_state_dir(dir.path(), None).unwrap();

    let daemon = lifecycle::startup(&config).await.unwrap();
    assert!(DaemonClient::for_config(&config).is_ok());
    daemon.shutdown().await.unwrap();

    assert!(DaemonClient::for_config(&config).is_err());
}
