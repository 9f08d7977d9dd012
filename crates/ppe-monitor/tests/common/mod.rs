//! Shared fixtures for monitor integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};

use ppe_models::{BodyPart, DetectedPerson, EquipmentDetection, PerceptionResponse};
use ppe_monitor::testing::{MemoryStorage, RecordingNotifier, ScriptedPerception};
use ppe_monitor::{Clock, Frame, ManualClock, MonitorConfig, MonitorSession, SessionDeps, TickReport};

/// One person wearing exactly the given equipment types at 95% confidence.
pub fn person_wearing(kinds: &[&str]) -> PerceptionResponse {
    PerceptionResponse {
        persons: vec![DetectedPerson {
            bounding_box: None,
            confidence: Some(99.0),
            body_parts: vec![BodyPart {
                name: Some("UPPER_BODY".to_string()),
                equipment_detections: kinds
                    .iter()
                    .map(|k| EquipmentDetection::new(*k, 95.0))
                    .collect(),
            }],
        }],
    }
}

pub fn fully_equipped() -> PerceptionResponse {
    person_wearing(&["HEAD_COVER", "FACE_COVER", "HAND_COVER"])
}

pub fn missing_gloves() -> PerceptionResponse {
    person_wearing(&["HEAD_COVER", "FACE_COVER"])
}

/// Config for 1 Hz scenario runs.
pub fn scenario_config() -> MonitorConfig {
    MonitorConfig {
        min_confidence: 80.0,
        violation_duration: Duration::from_secs(3),
        no_person_duration: Duration::from_secs(3),
        alert_cooldown: Duration::from_secs(300),
        process_interval: Duration::from_millis(500),
        upload_interval: Duration::from_secs(1),
        ..Default::default()
    }
}

/// Let detached tasks (perception calls, uploads, sends) finish.
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

pub struct Harness {
    pub session: MonitorSession,
    pub clock: Arc<ManualClock>,
    pub perception: Arc<ScriptedPerception>,
    pub storage: Arc<MemoryStorage>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Harness {
    pub fn new(config: MonitorConfig, response: PerceptionResponse) -> Self {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 7, 15, 6, 0, 0).unwrap(),
        ));
        let perception = Arc::new(ScriptedPerception::always(response));
        let storage = Arc::new(MemoryStorage::new());
        let notifier = Arc::new(RecordingNotifier::new());

        let deps = SessionDeps {
            perception: perception.clone(),
            storage: storage.clone(),
            notifier: notifier.clone(),
            clock: clock.clone(),
        };

        Self {
            session: MonitorSession::new(config, deps).unwrap(),
            clock,
            perception,
            storage,
            notifier,
        }
    }

    pub async fn tick(&mut self) -> TickReport {
        let frame = Frame::new(b"jpeg".to_vec(), self.clock.wall());
        let report = self.session.tick(&frame);
        settle().await;
        report
    }

    /// Issue the first perception call and consume its result, so the
    /// next tick at t = 0 already sees a detection.
    pub async fn prime(&mut self) -> TickReport {
        self.tick().await;
        self.tick().await
    }

    pub async fn tick_after(&mut self, secs: u64) -> TickReport {
        self.clock.advance(Duration::from_secs(secs));
        self.tick().await
    }
}
