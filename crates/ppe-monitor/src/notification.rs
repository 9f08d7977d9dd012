//! Alert composition and sending.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Utc};
use tracing::{debug, warn};

use ppe_models::timestamp::format_clock;
use ppe_models::{join_labels, EvidenceBatch};

use crate::collaborators::{FrameStorage, Notifier};
use crate::error::{MonitorError, MonitorResult};

/// First lines of every violation alert body.
pub const ALERT_HEADER: &str = "PPE ALERT!\n\nViolations:";

/// Subject used for no-person notices.
pub const NO_PERSON_SUBJECT: &str = "PPE NOTICE";

/// Builds alert bodies from an evidence batch and publishes them.
#[derive(Clone)]
pub struct AlertComposer {
    storage: Arc<dyn FrameStorage>,
    notifier: Arc<dyn Notifier>,
    subject: String,
    presign_ttl: Duration,
    offset: FixedOffset,
}

impl AlertComposer {
    pub fn new(
        storage: Arc<dyn FrameStorage>,
        notifier: Arc<dyn Notifier>,
        subject: impl Into<String>,
        presign_ttl: Duration,
        offset: FixedOffset,
    ) -> Self {
        Self {
            storage,
            notifier,
            subject: subject.into(),
            presign_ttl,
            offset,
        }
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Render the alert body, presigning one link per record.
    ///
    /// A record whose link cannot be produced is still listed.
    pub async fn render_body(&self, batch: &EvidenceBatch) -> String {
        let mut blocks = Vec::with_capacity(batch.len());

        for record in batch.records() {
            let url = match self
                .storage
                .presigned_url(record.evidence_id.as_str(), self.presign_ttl)
                .await
            {
                Ok(url) => url,
                Err(e) => {
                    warn!("Presigned URL for {} failed: {}", record.evidence_id, e);
                    "unavailable".to_string()
                }
            };

            blocks.push(format!(
                "{} | {} | Missing: {}\nImage: {}",
                record.evidence_id,
                format_clock(record.captured_at, self.offset),
                join_labels(&record.missing_items),
                url
            ));
        }

        format!("{}\n\n{}", ALERT_HEADER, blocks.join("\n\n"))
    }

    /// Send one alert covering the whole batch.
    ///
    /// The state snapshot write is detached and never fails the send.
    pub async fn send(&self, batch: &EvidenceBatch) -> MonitorResult<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let storage = Arc::clone(&self.storage);
        let snapshot = batch.clone();
        tokio::spawn(async move {
            if let Err(e) = storage.write_violation_snapshot(&snapshot).await {
                warn!("Failed to write violation snapshot: {}", e);
            }
        });

        self.publish_batch(batch).await
    }

    /// Like [`Self::send`], but waits for the snapshot write. Used when the
    /// process is about to exit.
    pub async fn send_final(&self, batch: &EvidenceBatch) -> MonitorResult<()> {
        if batch.is_empty() {
            return Ok(());
        }

        if let Err(e) = self.storage.write_violation_snapshot(batch).await {
            warn!("Failed to write violation snapshot: {}", e);
        }

        self.publish_batch(batch).await
    }

    async fn publish_batch(&self, batch: &EvidenceBatch) -> MonitorResult<()> {
        let body = self.render_body(batch).await;
        debug!("Publishing alert with {} record(s)", batch.len());

        self.notifier
            .publish(&self.subject, &body)
            .await
            .map_err(|e| MonitorError::dispatch_failed(e.to_string()))
    }

    /// Publish a notice that nobody has been seen since `since`.
    pub async fn send_no_person(&self, since: DateTime<Utc>) -> MonitorResult<()> {
        let body = format!(
            "No person detected since {}",
            format_clock(since, self.offset)
        );
        self.notifier.publish(NO_PERSON_SUBJECT, &body).await?;
        Ok(())
    }
}
