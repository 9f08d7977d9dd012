//! Primary frame loop.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn, Instrument};

use crate::error::{MonitorError, MonitorResult};
use crate::failures::FailureTracker;
use crate::frame_source::FrameSource;
use crate::session::MonitorSession;

/// Cloneable handle used to stop a running monitor.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for ShutdownHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownHandle {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Shutdown,
    SourceExhausted,
    SourceFailed,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub frames: u64,
    pub frame_failures: u64,
    pub reason: StopReason,
    /// Records sent by the shutdown flush.
    pub flushed: usize,
    /// Set when the shutdown flush failed.
    pub flush_error: Option<String>,
}

/// Drives a session from a frame source at the configured frame rate.
pub struct MonitorRunner {
    session: MonitorSession,
    source: Box<dyn FrameSource>,
    shutdown: ShutdownHandle,
}

impl MonitorRunner {
    pub fn new(session: MonitorSession, source: Box<dyn FrameSource>) -> Self {
        Self {
            session,
            source,
            shutdown: ShutdownHandle::new(),
        }
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    pub fn session(&self) -> &MonitorSession {
        &self.session
    }

    /// Run until shutdown or until the frame source gives out, then flush.
    ///
    /// Frame source failures are skipped until too many happen in a row,
    /// which ends the run with [`MonitorError::FrameSourceExhausted`] after
    /// the flush.
    pub async fn run(self) -> MonitorResult<RunSummary> {
        let span = self.session.logger().create_span();
        self.run_loop().instrument(span).await
    }

    async fn run_loop(mut self) -> MonitorResult<RunSummary> {
        let config = self.session.config().clone();
        let logger = self.session.logger().clone();

        logger.log_start(&format!(
            "{} fps, required: {}",
            config.frame_rate,
            ppe_models::join_labels(&config.required_categories)
        ));

        let mut shutdown_rx = self.shutdown.subscribe();
        let mut ticker = tokio::time::interval(config.frame_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut source_failures = FailureTracker::new("frame source", 5);
        let mut frames = 0u64;
        let mut frame_failures = 0u64;
        let mut consecutive = 0u32;

        let reason = loop {
            if *shutdown_rx.borrow() {
                break StopReason::Shutdown;
            }

            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Shutdown signal received, stopping frame loop");
                        break StopReason::Shutdown;
                    }
                }
                _ = ticker.tick() => {
                    match self.source.next_frame().await {
                        Ok(Some(frame)) => {
                            consecutive = 0;
                            source_failures.record_success();
                            frames += 1;
                            self.session.tick(&frame);
                        }
                        Ok(None) => {
                            info!("Frame source exhausted after {} frame(s)", frames);
                            break StopReason::SourceExhausted;
                        }
                        Err(e) => {
                            consecutive += 1;
                            frame_failures += 1;
                            if source_failures.record_failure() {
                                warn!("Frame read failed: {}", e);
                            }
                            if consecutive >= config.max_frame_failures {
                                break StopReason::SourceFailed;
                            }
                        }
                    }
                }
            }
        };

        let (flushed, flush_error) = match self.session.finish(config.shutdown_timeout).await {
            Ok(sent) => {
                logger.log_completion(&format!(
                    "{} frame(s), {} record(s) flushed",
                    frames, sent
                ));
                (sent, None)
            }
            Err(e) => {
                logger.log_error(&format!("Shutdown flush failed: {}", e));
                (0, Some(e.to_string()))
            }
        };

        if reason == StopReason::SourceFailed {
            return Err(MonitorError::FrameSourceExhausted(consecutive));
        }

        Ok(RunSummary {
            frames,
            frame_failures,
            reason,
            flushed,
            flush_error,
        })
    }
}
