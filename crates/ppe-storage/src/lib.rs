//! S3-compatible storage for captured frames and violation state.
//!
//! This crate provides:
//! - Frame upload as JPEG objects
//! - Presigned URL generation for alert links
//! - Violation state snapshots in a separate state bucket
//! - Retention pruning of old frames

pub mod client;
pub mod error;
pub mod operations;
pub mod retention;

pub use client::{ObjectInfo, S3Client, StorageConfig};
pub use error::{StorageError, StorageResult};
pub use operations::{render_violation_snapshot, FRAME_CONTENT_TYPE, FRAME_PREFIX, VIOLATIONS_SNAPSHOT_KEY};
pub use retention::select_expired;
