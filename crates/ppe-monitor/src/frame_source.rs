//! Frame acquisition.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info};
use url::Url;

use crate::error::{MonitorError, MonitorResult};

/// One captured JPEG frame.
#[derive(Debug, Clone)]
pub struct Frame {
    pub jpeg: Vec<u8>,
    pub captured_at: DateTime<Utc>,
}

impl Frame {
    pub fn new(jpeg: Vec<u8>, captured_at: DateTime<Utc>) -> Self {
        Self { jpeg, captured_at }
    }
}

/// Produces frames for the primary loop.
#[async_trait]
pub trait FrameSource: Send {
    /// Next frame, `Ok(None)` once the source is exhausted.
    async fn next_frame(&mut self) -> MonitorResult<Option<Frame>>;
}

/// Polls an HTTP endpoint that serves the current camera image as JPEG.
pub struct SnapshotFrameSource {
    http: reqwest::Client,
    url: Url,
}

impl SnapshotFrameSource {
    pub fn new(url: &str, timeout: Duration) -> MonitorResult<Self> {
        let url = Url::parse(url)
            .map_err(|e| MonitorError::config_error(format!("Invalid snapshot URL '{}': {}", url, e)))?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MonitorError::config_error(e.to_string()))?;
        Ok(Self { http, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl FrameSource for SnapshotFrameSource {
    async fn next_frame(&mut self) -> MonitorResult<Option<Frame>> {
        let response = self
            .http
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| MonitorError::frame_source(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MonitorError::frame_source(format!(
                "Snapshot endpoint returned {}",
                status
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| MonitorError::frame_source(e.to_string()))?;
        if bytes.is_empty() {
            return Err(MonitorError::frame_source("Snapshot endpoint returned no data"));
        }

        Ok(Some(Frame::new(bytes.to_vec(), Utc::now())))
    }
}

/// Replays `*.jpg` / `*.jpeg` files from a directory in name order.
pub struct DirectoryFrameSource {
    files: Vec<PathBuf>,
    position: usize,
    repeat: bool,
}

impl DirectoryFrameSource {
    pub fn open(dir: impl AsRef<Path>) -> MonitorResult<Self> {
        let dir = dir.as_ref();
        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && is_jpeg(path))
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(MonitorError::config_error(format!(
                "No JPEG frames found in {}",
                dir.display()
            )));
        }

        info!("Replaying {} frame(s) from {}", files.len(), dir.display());
        Ok(Self {
            files,
            position: 0,
            repeat: false,
        })
    }

    /// Start over from the first file instead of ending.
    pub fn repeat(mut self, repeat: bool) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn is_jpeg(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg"))
        .unwrap_or(false)
}

#[async_trait]
impl FrameSource for DirectoryFrameSource {
    async fn next_frame(&mut self) -> MonitorResult<Option<Frame>> {
        if self.position >= self.files.len() {
            if !self.repeat {
                return Ok(None);
            }
            self.position = 0;
        }

        let path = &self.files[self.position];
        self.position += 1;
        debug!("Reading frame {}", path.display());

        let jpeg = tokio::fs::read(path).await.map_err(|e| {
            MonitorError::frame_source(format!("{}: {}", path.display(), e))
        })?;
        Ok(Some(Frame::new(jpeg, Utc::now())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_directory_replays_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.jpg"), b"second").unwrap();
        std::fs::write(dir.path().join("a.JPEG"), b"first").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"skip").unwrap();

        let mut source = DirectoryFrameSource::open(dir.path()).unwrap();
        assert_eq!(source.len(), 2);

        assert_eq!(source.next_frame().await.unwrap().unwrap().jpeg, b"first");
        assert_eq!(source.next_frame().await.unwrap().unwrap().jpeg, b"second");
        assert!(source.next_frame().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_directory_repeat() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("only.jpg"), b"x").unwrap();

        let mut source = DirectoryFrameSource::open(dir.path()).unwrap().repeat(true);
        for _ in 0..3 {
            assert!(source.next_frame().await.unwrap().is_some());
        }
    }

    #[test]
    fn test_empty_directory_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(DirectoryFrameSource::open(dir.path()).is_err());
    }

    #[test]
    fn test_snapshot_url_validated() {
        assert!(SnapshotFrameSource::new("not a url", Duration::from_secs(1)).is_err());
        let source =
            SnapshotFrameSource::new("http://camera.local/snapshot.jpg", Duration::from_secs(1))
                .unwrap();
        assert_eq!(source.url().path(), "/snapshot.jpg");
    }
}
