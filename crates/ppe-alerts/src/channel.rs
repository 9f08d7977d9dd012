//! Alert notifications via Redis Pub/Sub.

use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::AlertResult;

/// Default Pub/Sub channel for alerts.
pub const DEFAULT_ALERT_CHANNEL: &str = "ppe:alerts";

/// Alert message published to Redis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertMessage {
    pub subject: String,
    pub body: String,
    pub sent_at: DateTime<Utc>,
}

impl AlertMessage {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            sent_at: Utc::now(),
        }
    }
}

/// Configuration for the alert channel.
#[derive(Debug, Clone)]
pub struct AlertChannelConfig {
    /// Redis URL
    pub redis_url: String,
    /// Pub/Sub channel name
    pub channel: String,
    /// Number of recent alerts kept in a list for late subscribers (0 disables)
    pub history_len: usize,
}

impl Default for AlertChannelConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            channel: DEFAULT_ALERT_CHANNEL.to_string(),
            history_len: 50,
        }
    }
}

impl AlertChannelConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            channel: std::env::var("PPE_ALERT_CHANNEL")
                .unwrap_or_else(|_| DEFAULT_ALERT_CHANNEL.to_string()),
            history_len: std::env::var("PPE_ALERT_HISTORY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(50),
        }
    }
}

/// Channel for publishing and subscribing to alerts.
pub struct AlertChannel {
    client: redis::Client,
    config: AlertChannelConfig,
}

impl AlertChannel {
    /// Create a new alert channel.
    pub fn new(config: AlertChannelConfig) -> AlertResult<Self> {
        let client = redis::Client::open(config.redis_url.as_str())?;
        Ok(Self { client, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> AlertResult<Self> {
        Self::new(AlertChannelConfig::from_env())
    }

    /// Pub/Sub channel name.
    pub fn channel_name(&self) -> &str {
        &self.config.channel
    }

    /// Key of the recent-alert list.
    pub fn history_key(&self) -> String {
        format!("{}:history", self.config.channel)
    }

    /// Publish an alert with the given subject and body.
    ///
    /// Returns the number of subscribers that received it.
    pub async fn publish(&self, subject: &str, body: &str) -> AlertResult<usize> {
        self.publish_message(&AlertMessage::new(subject, body)).await
    }

    /// Publish a prepared alert message.
    pub async fn publish_message(&self, message: &AlertMessage) -> AlertResult<usize> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let payload = serde_json::to_string(message)?;

        debug!("Publishing alert '{}' to {}", message.subject, self.config.channel);

        if self.config.history_len > 0 {
            let key = self.history_key();
            redis::pipe()
                .lpush(&key, &payload)
                .ignore()
                .ltrim(&key, 0, self.config.history_len as isize - 1)
                .ignore()
                .query_async::<()>(&mut conn)
                .await?;
        }

        let receivers: usize = conn.publish(&self.config.channel, payload).await?;
        if receivers == 0 {
            warn!(
                "Alert '{}' published to {} with no active subscribers",
                message.subject, self.config.channel
            );
        }

        Ok(receivers)
    }

    /// Most recent alerts, newest first.
    pub async fn recent(&self, limit: usize) -> AlertResult<Vec<AlertMessage>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw: Vec<String> = conn
            .lrange(self.history_key(), 0, limit as isize - 1)
            .await?;

        Ok(raw
            .iter()
            .filter_map(|payload| serde_json::from_str(payload).ok())
            .collect())
    }

    /// Check that Redis answers.
    pub async fn ping(&self) -> AlertResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        redis::cmd("PING").query_async::<String>(&mut conn).await?;
        Ok(())
    }

    /// Subscribe to alerts.
    /// Returns a pinned stream that can be polled with `.next()`.
    pub async fn subscribe(
        &self,
    ) -> AlertResult<std::pin::Pin<Box<dyn futures_util::Stream<Item = AlertMessage> + Send>>> {
        use futures_util::StreamExt;

        let mut pubsub = self.client.get_async_pubsub().await?;
        pubsub.subscribe(&self.config.channel).await?;

        let stream = pubsub.into_on_message().filter_map(|msg| async move {
            let payload: String = msg.get_payload().ok()?;
            serde_json::from_str(&payload).ok()
        });

        Ok(Box::pin(stream))
    }
}
