//! Shared helpers for engine unit tests

use std::time::Duration;

/// Poll `condition` until it holds, failing the test after two seconds
pub(crate) async fn wait_until<F: FnMut() -> bool>(mut condition: F) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not met within 2s"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
