//! Seams between the engine and its external collaborators.
//!
//! The session only talks to these traits. The concrete clients from the
//! sibling crates implement them here; tests use the in-memory versions in
//! [`crate::testing`].

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;

use ppe_alerts::{AlertChannel, AlertResult};
use ppe_models::{EquipmentCategory, EvidenceBatch, PerceptionResponse};
use ppe_perception::{PerceptionClient, PerceptionResult};
use ppe_storage::{S3Client, StorageResult};

/// Classifies PPE presence on one frame.
#[async_trait]
pub trait PerceptionService: Send + Sync {
    async fn detect(
        &self,
        jpeg: &[u8],
        min_confidence: f64,
        required: &BTreeSet<EquipmentCategory>,
    ) -> PerceptionResult<PerceptionResponse>;
}

/// Durable storage for frames and violation state.
#[async_trait]
pub trait FrameStorage: Send + Sync {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> StorageResult<()>;

    async fn presigned_url(&self, key: &str, ttl: Duration) -> StorageResult<String>;

    /// Overwrite the textual snapshot of the pending batch.
    async fn write_violation_snapshot(&self, batch: &EvidenceBatch) -> StorageResult<()>;

    /// Keep only the newest `keep` frames. Returns how many were deleted.
    async fn prune_frames(&self, keep: usize) -> StorageResult<u32>;
}

/// Outbound notification transport.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn publish(&self, subject: &str, body: &str) -> AlertResult<()>;
}

#[async_trait]
impl PerceptionService for PerceptionClient {
    async fn detect(
        &self,
        jpeg: &[u8],
        min_confidence: f64,
        required: &BTreeSet<EquipmentCategory>,
    ) -> PerceptionResult<PerceptionResponse> {
        PerceptionClient::detect(self, jpeg, min_confidence, required).await
    }
}

#[async_trait]
impl FrameStorage for S3Client {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> StorageResult<()> {
        self.upload_bytes(bytes, key, content_type).await
    }

    async fn presigned_url(&self, key: &str, ttl: Duration) -> StorageResult<String> {
        self.frame_url(key, ttl).await
    }

    async fn write_violation_snapshot(&self, batch: &EvidenceBatch) -> StorageResult<()> {
        S3Client::write_violation_snapshot(self, batch).await
    }

    async fn prune_frames(&self, keep: usize) -> StorageResult<u32> {
        S3Client::prune_frames(self, keep).await
    }
}

#[async_trait]
impl Notifier for AlertChannel {
    async fn publish(&self, subject: &str, body: &str) -> AlertResult<()> {
        AlertChannel::publish(self, subject, body).await.map(|_| ())
    }
}
