//! Background pruning of old frames.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::interval;
use tracing::{info, warn};

use crate::collaborators::FrameStorage;
use crate::error::MonitorResult;

/// Periodically deletes all but the newest frames from storage.
pub struct RetentionTask {
    storage: Arc<dyn FrameStorage>,
    keep: usize,
    every: Duration,
}

impl RetentionTask {
    pub fn new(storage: Arc<dyn FrameStorage>, keep: usize, every: Duration) -> Self {
        Self {
            storage,
            keep,
            every,
        }
    }

    /// Run until `shutdown` flips to true.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "Starting frame retention (keep {}, interval: {:?})",
            self.keep, self.every
        );

        let mut ticker = interval(self.every);
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.prune_once().await {
                        warn!("Frame retention pass failed: {}", e);
                    }
                }
            }
        }

        info!("Frame retention stopped");
    }

    /// Run a single pruning pass. Returns the number of deleted frames.
    pub async fn prune_once(&self) -> MonitorResult<u32> {
        let deleted = self.storage.prune_frames(self.keep).await?;
        if deleted > 0 {
            info!("Retention removed {} frame(s)", deleted);
        }
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStorage;

    #[tokio::test]
    async fn test_prune_once_keeps_newest() {
        let storage = Arc::new(MemoryStorage::new());
        for key in ["frame_1.jpg", "frame_2.jpg", "frame_3.jpg"] {
            storage.put(key, b"x".to_vec(), "image/jpeg").await.unwrap();
        }

        let task = RetentionTask::new(storage.clone(), 1, Duration::from_secs(60));
        assert_eq!(task.prune_once().await.unwrap(), 2);
        assert_eq!(storage.keys(), vec!["frame_3.jpg"]);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let storage = Arc::new(MemoryStorage::new());
        let task = RetentionTask::new(storage, 5, Duration::from_millis(10));
        let (tx, rx) = watch::channel(false);

        let handle = tokio::spawn(async move { task.run(rx).await });
        tokio::time::sleep(Duration::from_millis(30)).await;
        tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
