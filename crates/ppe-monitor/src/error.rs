//! Monitor error types.

use thiserror::Error;

pub type MonitorResult<T> = Result<T, MonitorError>;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Frame source failed: {0}")]
    FrameSource(String),

    #[error("Frame source gave up after {0} consecutive failures")]
    FrameSourceExhausted(u32),

    #[error("Alert dispatch failed: {0}")]
    DispatchFailed(String),

    #[error("Shutdown flush failed: {0}")]
    ShutdownFlushFailed(String),

    #[error("Perception error: {0}")]
    Perception(#[from] ppe_perception::PerceptionError),

    #[error("Storage error: {0}")]
    Storage(#[from] ppe_storage::StorageError),

    #[error("Alert transport error: {0}")]
    Alert(#[from] ppe_alerts::AlertError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MonitorError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn frame_source(msg: impl Into<String>) -> Self {
        Self::FrameSource(msg.into())
    }

    pub fn dispatch_failed(msg: impl Into<String>) -> Self {
        Self::DispatchFailed(msg.into())
    }

    /// Failures that are skipped for this cycle and tried again on the
    /// next natural tick.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            MonitorError::FrameSource(_)
                | MonitorError::DispatchFailed(_)
                | MonitorError::Perception(_)
                | MonitorError::Storage(_)
                | MonitorError::Alert(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(MonitorError::dispatch_failed("redis down").is_transient());
        assert!(MonitorError::from(ppe_storage::StorageError::upload_failed("x")).is_transient());
        assert!(!MonitorError::config_error("bad").is_transient());
        assert!(!MonitorError::FrameSourceExhausted(3).is_transient());
        assert!(!MonitorError::ShutdownFlushFailed("x".into()).is_transient());
    }
}
