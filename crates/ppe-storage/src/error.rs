//! Errors raised by frame and state storage.

use thiserror::Error;

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid storage configuration: {0}")]
    InvalidConfig(String),

    #[error("Frame upload failed: {0}")]
    UploadFailed(String),

    #[error("Could not presign frame link: {0}")]
    PresignFailed(String),

    #[error("Frame deletion failed: {0}")]
    DeleteFailed(String),

    #[error("Bucket listing failed: {0}")]
    ListFailed(String),

    /// The bucket or object could not be reached at all.
    #[error("Storage unreachable: {0}")]
    Unreachable(String),
}

impl StorageError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn upload_failed(msg: impl Into<String>) -> Self {
        Self::UploadFailed(msg.into())
    }

    pub fn delete_failed(msg: impl Into<String>) -> Self {
        Self::DeleteFailed(msg.into())
    }

    pub fn presign_failed(msg: impl Into<String>) -> Self {
        Self::PresignFailed(msg.into())
    }

    /// Configuration problems never clear up by retrying.
    pub fn is_config(&self) -> bool {
        matches!(self, StorageError::InvalidConfig(_))
    }
}
