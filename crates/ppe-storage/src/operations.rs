//! High-level storage operations.

use std::time::Duration;

use ppe_models::{join_labels, EvidenceBatch};
use tracing::info;

use crate::client::S3Client;
use crate::error::StorageResult;
use crate::retention::select_expired;

/// Content type of uploaded frames.
pub const FRAME_CONTENT_TYPE: &str = "image/jpeg";

/// Key prefix shared by all frame objects.
pub const FRAME_PREFIX: &str = "frame_";

/// Key of the violation snapshot in the state bucket.
pub const VIOLATIONS_SNAPSHOT_KEY: &str = "violations.txt";

/// Render a batch as `<id>: <labels>` lines.
pub fn render_violation_snapshot(batch: &EvidenceBatch) -> String {
    batch
        .records()
        .iter()
        .map(|r| format!("{}: {}", r.evidence_id, join_labels(&r.missing_items)))
        .collect::<Vec<_>>()
        .join("\n")
}

impl S3Client {
    /// Upload a JPEG frame under `key`.
    pub async fn upload_frame(&self, key: &str, jpeg: Vec<u8>) -> StorageResult<()> {
        self.upload_bytes(jpeg, key, FRAME_CONTENT_TYPE).await
    }

    /// Presigned GET link for a stored frame.
    pub async fn frame_url(&self, key: &str, ttl: Duration) -> StorageResult<String> {
        self.presign_get(key, ttl).await
    }

    /// Overwrite the violation snapshot in the state bucket.
    pub async fn write_violation_snapshot(&self, batch: &EvidenceBatch) -> StorageResult<()> {
        let content = render_violation_snapshot(batch).into_bytes();
        self.upload_state(content, VIOLATIONS_SNAPSHOT_KEY, "text/plain")
            .await
    }

    /// Delete the oldest frames so that at most `keep` remain.
    ///
    /// Returns the number of deleted objects.
    pub async fn prune_frames(&self, keep: usize) -> StorageResult<u32> {
        let objects = self.list_objects(FRAME_PREFIX).await?;
        let expired = select_expired(&objects, keep);
        if expired.is_empty() {
            return Ok(0);
        }

        let deleted = self.delete_objects(&expired).await?;
        info!(
            "Pruned {} old frame(s), keeping the newest {}",
            deleted, keep
        );
        Ok(deleted)
    }
}
