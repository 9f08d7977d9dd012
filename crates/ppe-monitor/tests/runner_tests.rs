//! Frame loop tests over queued frames.

mod common;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

use common::{missing_gloves, settle};
use ppe_monitor::testing::{MemoryStorage, QueuedFrames, RecordingNotifier, ScriptedPerception};
use ppe_monitor::{
    Frame, ManualClock, MonitorConfig, MonitorError, MonitorRunner, MonitorSession, SessionDeps,
    StopReason,
};

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 7, 15, 6, 0, 0).unwrap()
}

/// One frame per second of wall time, so every frame gets its own key.
fn frames(n: i64) -> Vec<Frame> {
    (0..n)
        .map(|i| Frame::new(b"jpeg".to_vec(), start() + chrono::Duration::seconds(i)))
        .collect()
}

/// Confirms on the second observed result and captures every frame.
fn fast_config() -> MonitorConfig {
    MonitorConfig {
        frame_rate: 100,
        violation_duration: Duration::ZERO,
        process_interval: Duration::ZERO,
        upload_interval: Duration::ZERO,
        alert_cooldown: Duration::from_secs(300),
        max_frame_failures: 3,
        shutdown_timeout: Duration::from_secs(1),
        ..Default::default()
    }
}

fn runner(config: MonitorConfig, source: QueuedFrames) -> (MonitorRunner, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::new());
    let deps = SessionDeps {
        perception: Arc::new(ScriptedPerception::always(missing_gloves())),
        storage: Arc::new(MemoryStorage::new()),
        notifier: notifier.clone(),
        clock: Arc::new(ManualClock::new(start())),
    };
    let session = MonitorSession::new(config, deps).unwrap();
    (MonitorRunner::new(session, Box::new(source)), notifier)
}

#[tokio::test]
async fn test_exhausted_source_flushes_remaining_evidence() {
    let (runner, notifier) = runner(fast_config(), QueuedFrames::new(frames(5)));

    let summary = runner.run().await.unwrap();

    assert_eq!(summary.reason, StopReason::SourceExhausted);
    assert_eq!(summary.frames, 5);
    assert_eq!(summary.frame_failures, 0);
    // Frame 3 goes out with the first alert, frames 4 and 5 wait out the
    // cooldown and leave with the shutdown flush.
    assert_eq!(summary.flushed, 2);
    assert!(summary.flush_error.is_none());

    let messages = notifier.messages();
    assert_eq!(messages.len(), 2);
    assert!(messages[0].body.contains("frame_20240715_090002.jpg"));
    assert!(messages[1].body.contains("frame_20240715_090003.jpg"));
    assert!(messages[1].body.contains("frame_20240715_090004.jpg"));
}

#[tokio::test]
async fn test_transient_source_errors_are_skipped() {
    let source = QueuedFrames::new(frames(2)).failing_first(2);
    let (runner, _notifier) = runner(fast_config(), source);

    let summary = runner.run().await.unwrap();

    assert_eq!(summary.reason, StopReason::SourceExhausted);
    assert_eq!(summary.frames, 2);
    assert_eq!(summary.frame_failures, 2);
}

#[tokio::test]
async fn test_persistent_source_errors_end_the_run() {
    let source = QueuedFrames::new(frames(2)).failing_first(10);
    let (runner, notifier) = runner(fast_config(), source);

    let err = runner.run().await.unwrap_err();

    assert!(matches!(err, MonitorError::FrameSourceExhausted(3)));
    assert!(notifier.messages().is_empty());
}

#[tokio::test]
async fn test_shutdown_stops_the_loop() {
    let (runner, _notifier) = runner(fast_config(), QueuedFrames::new(frames(10_000)));
    let shutdown = runner.shutdown_handle();

    let handle = tokio::spawn(runner.run());
    tokio::time::sleep(Duration::from_millis(50)).await;
    shutdown.trigger();

    let summary = tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .unwrap()
        .unwrap()
        .unwrap();

    assert_eq!(summary.reason, StopReason::Shutdown);
    assert!(summary.frames > 0);
    assert!(summary.frames < 10_000);
    assert!(shutdown.is_triggered());
}

#[tokio::test]
async fn test_shutdown_before_start_reads_no_frames() {
    let (runner, notifier) = runner(fast_config(), QueuedFrames::new(frames(3)));
    runner.shutdown_handle().trigger();

    let summary = runner.run().await.unwrap();
    settle().await;

    assert_eq!(summary.reason, StopReason::Shutdown);
    assert_eq!(summary.frames, 0);
    assert_eq!(summary.flushed, 0);
    assert_eq!(notifier.attempts(), 0);
}
