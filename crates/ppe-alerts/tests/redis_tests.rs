//! Redis alert channel integration tests.

use std::time::Duration;

use futures_util::StreamExt;
use ppe_alerts::{AlertChannel, AlertChannelConfig};

fn test_channel() -> AlertChannel {
    dotenvy::dotenv().ok();

    let mut config = AlertChannelConfig::from_env();
    config.channel = format!("{}:integration", config.channel);
    AlertChannel::new(config).expect("Failed to create alert channel")
}

/// Test Redis connection.
#[tokio::test]
#[ignore = "requires Redis"]
async fn test_redis_connection() {
    let channel = test_channel();
    channel.ping().await.expect("Failed to ping Redis");
}

/// Test publish/subscribe cycle.
#[tokio::test]
#[ignore = "requires Redis"]
async fn test_publish_subscribe() {
    let channel = test_channel();
    let mut stream = channel.subscribe().await.expect("Failed to subscribe");

    let receivers = channel
        .publish("PPE ALERT", "integration test body")
        .await
        .expect("Failed to publish");
    assert!(receivers >= 1);

    let received = tokio::time::timeout(Duration::from_secs(5), stream.next())
        .await
        .expect("Timed out waiting for alert")
        .expect("Stream ended");

    assert_eq!(received.subject, "PPE ALERT");
    assert_eq!(received.body, "integration test body");
}

/// Test that published alerts are kept in the history list.
#[tokio::test]
#[ignore = "requires Redis"]
async fn test_recent_history() {
    let channel = test_channel();

    channel
        .publish("PPE ALERT", "history check")
        .await
        .expect("Failed to publish");

    let recent = channel.recent(1).await.expect("Failed to read history");
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].body, "history check");
}
