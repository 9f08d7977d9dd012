//! Monitoring session: owns all debounce, evidence and cooldown state and
//! advances it once per frame.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::{DateTime, FixedOffset, Utc};
use tokio::sync::watch;
use tracing::{debug, warn};

use ppe_models::{EvidenceId, FrameCompliance, MonitorStatus};
use ppe_storage::FRAME_CONTENT_TYPE;

use crate::clock::{Clock, IntervalGate};
use crate::collaborators::{FrameStorage, Notifier, PerceptionService};
use crate::config::MonitorConfig;
use crate::dispatcher::{AlertDispatcher, DispatchOutcome};
use crate::error::MonitorResult;
use crate::evidence::{CaptureOutcome, EvidenceBatchStore};
use crate::failures::FailureTracker;
use crate::frame_source::Frame;
use crate::logging::SessionLogger;
use crate::metrics;
use crate::normalizer::normalize;
use crate::notification::AlertComposer;
use crate::perception::PerceptionWorker;
use crate::violation::{ViolationDebouncer, ViolationEvent, ViolationState};
use crate::watchdog::{NoPersonWatchdog, WatchdogEvent};

/// External collaborators of a session.
#[derive(Clone)]
pub struct SessionDeps {
    pub perception: Arc<dyn PerceptionService>,
    pub storage: Arc<dyn FrameStorage>,
    pub notifier: Arc<dyn Notifier>,
    pub clock: Arc<dyn Clock>,
}

/// What one tick did.
#[derive(Debug, Clone)]
pub struct TickReport {
    pub perception_submitted: bool,
    /// A new perception result was picked up on this tick.
    pub fresh_result: bool,
    pub violation: ViolationEvent,
    pub watchdog: WatchdogEvent,
    /// Key under which the frame was handed to storage, if it was.
    pub uploaded: Option<EvidenceId>,
    pub capture: Option<CaptureOutcome>,
    /// Background dispatches that reported back before this tick.
    pub completed: Vec<DispatchOutcome>,
    pub dispatch: DispatchOutcome,
}

pub struct MonitorSession {
    config: MonitorConfig,
    offset: FixedOffset,
    clock: Arc<dyn Clock>,
    storage: Arc<dyn FrameStorage>,
    perception: PerceptionWorker,
    perception_gate: IntervalGate,
    upload_gate: IntervalGate,
    debouncer: ViolationDebouncer,
    watchdog: NoPersonWatchdog,
    evidence: EvidenceBatchStore,
    dispatcher: AlertDispatcher,
    current: FrameCompliance,
    /// Capture time of the first frame of the current empty streak.
    empty_since: Option<DateTime<Utc>>,
    last_sequence: u64,
    last_received_at: Option<Instant>,
    frames_processed: u64,
    upload_failures: Arc<Mutex<FailureTracker>>,
    logger: SessionLogger,
    status_tx: watch::Sender<MonitorStatus>,
}

impl MonitorSession {
    pub fn new(config: MonitorConfig, deps: SessionDeps) -> MonitorResult<Self> {
        config.validate()?;

        let offset = config.utc_offset();
        let composer = AlertComposer::new(
            Arc::clone(&deps.storage),
            deps.notifier,
            config.alert_subject.clone(),
            config.presign_ttl,
            offset,
        );
        let perception = PerceptionWorker::new(
            deps.perception,
            Arc::clone(&deps.clock),
            config.min_confidence,
            config.required_categories.clone(),
        );
        let logger = SessionLogger::new(&config.camera_name);
        let (status_tx, _) = watch::channel(MonitorStatus {
            camera: config.camera_name.clone(),
            categories: FrameCompliance::no_result().category_status(&config.required_categories),
            ..Default::default()
        });

        Ok(Self {
            offset,
            clock: deps.clock,
            storage: deps.storage,
            perception,
            perception_gate: IntervalGate::new(config.process_interval),
            upload_gate: IntervalGate::new(config.upload_interval),
            debouncer: ViolationDebouncer::new(config.violation_duration),
            watchdog: NoPersonWatchdog::new(config.no_person_duration),
            evidence: EvidenceBatchStore::new(),
            dispatcher: AlertDispatcher::new(composer, config.alert_cooldown),
            current: FrameCompliance::no_result(),
            empty_since: None,
            last_sequence: 0,
            last_received_at: None,
            frames_processed: 0,
            upload_failures: Arc::new(Mutex::new(FailureTracker::new("frame upload", 5))),
            logger,
            status_tx,
            config,
        })
    }

    pub fn logger(&self) -> &SessionLogger {
        &self.logger
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn violation_state(&self) -> &ViolationState {
        self.debouncer.state()
    }

    pub fn evidence(&self) -> &EvidenceBatchStore {
        &self.evidence
    }

    pub fn dispatcher(&self) -> &AlertDispatcher {
        &self.dispatcher
    }

    pub fn no_person(&self) -> bool {
        self.watchdog.has_fired()
    }

    /// Receiver of the status snapshot published after every tick.
    pub fn subscribe_status(&self) -> watch::Receiver<MonitorStatus> {
        self.status_tx.subscribe()
    }

    /// Advance the session by one frame.
    pub fn tick(&mut self, frame: &Frame) -> TickReport {
        let now = self.clock.now();
        self.frames_processed += 1;
        metrics::record_frame();

        let completed = self.dispatcher.poll_completed(&mut self.evidence);

        let perception_submitted = if self.perception_gate.ready(now) && !self.perception.is_busy() {
            let started = self.perception.try_submit(frame.jpeg.clone());
            if started {
                self.perception_gate.mark(now);
            }
            started
        } else {
            false
        };

        let fresh_result = self.refresh_compliance();

        let violation = self.debouncer.observe(&self.current, now);
        self.on_violation_event(violation);

        let watchdog = self.watchdog.observe(&self.current, now);
        self.on_watchdog_event(watchdog, frame);

        let (uploaded, capture) = if self.upload_gate.try_pass(now) {
            let key = EvidenceId::for_frame(frame.captured_at, self.offset);
            self.spawn_upload(key.clone(), frame.jpeg.clone());
            let capture = self.capture_evidence(key.clone(), frame);
            (Some(key), Some(capture))
        } else {
            (None, None)
        };

        let dispatch = self
            .dispatcher
            .maybe_spawn(&self.evidence, now, self.clock.wall());

        self.publish_status(now);

        TickReport {
            perception_submitted,
            fresh_result,
            violation,
            watchdog,
            uploaded,
            capture,
            completed,
            dispatch,
        }
    }

    /// Wait for a running dispatch, then flush what is left.
    ///
    /// Returns the number of records sent by the final flush.
    pub async fn finish(&mut self, timeout: Duration) -> MonitorResult<usize> {
        self.dispatcher
            .wait_in_flight(&mut self.evidence, timeout)
            .await;
        let now = self.clock.now();
        let wall = self.clock.wall();
        let sent = self
            .dispatcher
            .flush_on_shutdown(&mut self.evidence, now, wall)
            .await?;
        self.publish_status(now);
        Ok(sent)
    }

    fn refresh_compliance(&mut self) -> bool {
        let Some(latest) = self.perception.mailbox().latest() else {
            return false;
        };
        if latest.sequence == self.last_sequence {
            return false;
        }

        self.current = normalize(
            Some(&latest.response),
            self.config.min_confidence,
            &self.config.required_categories,
        );
        self.last_sequence = latest.sequence;
        self.last_received_at = Some(latest.received_at);
        debug!(
            "Frame compliance: {} person(s), missing {:?}",
            self.current.persons.len(),
            self.current.missing_items
        );
        true
    }

    fn on_violation_event(&mut self, event: ViolationEvent) {
        match event {
            ViolationEvent::Confirmed => {
                metrics::record_violation_confirmed();
                let missing = self
                    .debouncer
                    .missing_items()
                    .map(|m| ppe_models::join_labels(m))
                    .unwrap_or_default();
                self.logger
                    .log_transition(&format!("violation confirmed, missing {}", missing));
            }
            ViolationEvent::Resolved { was_confirmed: true } => {
                self.logger.log_transition("violation resolved");
            }
            ViolationEvent::Started => debug!("Non-compliance observed, debouncing"),
            _ => {}
        }

        if event.clears_evidence() {
            let dropped = self.evidence.clear();
            if dropped > 0 {
                debug!("Discarded {} evidence record(s) on resolution", dropped);
            }
        }
    }

    fn on_watchdog_event(&mut self, event: WatchdogEvent, frame: &Frame) {
        match event {
            WatchdogEvent::Started => self.empty_since = Some(frame.captured_at),
            WatchdogEvent::Present | WatchdogEvent::Recovered => self.empty_since = None,
            _ => {}
        }

        match event {
            WatchdogEvent::Fired => {
                metrics::record_no_person_event();
                self.logger.log_transition("no person detected");
                if self.config.notify_no_person {
                    let composer = self.dispatcher.composer().clone();
                    let since = self.empty_since.unwrap_or(frame.captured_at);
                    tokio::spawn(async move {
                        if let Err(e) = composer.send_no_person(since).await {
                            warn!("Failed to publish no-person notice: {}", e);
                        }
                    });
                }
            }
            WatchdogEvent::Recovered => self.logger.log_transition("person back in view"),
            _ => {}
        }
    }

    fn spawn_upload(&self, key: EvidenceId, jpeg: Vec<u8>) {
        let storage = Arc::clone(&self.storage);
        let failures = Arc::clone(&self.upload_failures);
        tokio::spawn(async move {
            let result = storage.put(key.as_str(), jpeg, FRAME_CONTENT_TYPE).await;
            let mut failures = failures.lock().unwrap_or_else(|e| e.into_inner());
            match result {
                Ok(()) => {
                    debug!("Uploaded frame {}", key);
                    failures.record_success();
                }
                Err(e) => {
                    if failures.record_failure() {
                        warn!("Frame upload {} failed: {}", key, e);
                    }
                }
            }
        });
    }

    fn capture_evidence(&mut self, key: EvidenceId, frame: &Frame) -> CaptureOutcome {
        let missing = self.debouncer.missing_items().cloned().unwrap_or_default();
        let outcome = self
            .evidence
            .capture(key, missing, frame.captured_at, self.debouncer.state());
        if outcome == CaptureOutcome::Inserted {
            metrics::record_evidence_captured();
            debug!("Captured evidence, {} record(s) pending", self.evidence.len());
        }
        outcome
    }

    fn publish_status(&self, now: Instant) {
        let last_result_age_secs = self
            .last_received_at
            .map(|at| now.saturating_duration_since(at).as_secs_f64());
        if let Some(age) = last_result_age_secs {
            metrics::set_result_age(age);
        }

        self.status_tx.send_replace(MonitorStatus {
            camera: self.config.camera_name.clone(),
            categories: self.current.category_status(&self.config.required_categories),
            active_violation: self.debouncer.is_confirmed(),
            missing_items: self.current.missing_items.clone(),
            no_person: self.watchdog.has_fired(),
            last_alert_at: self.dispatcher.last_dispatch_wall(),
            last_result_age_secs,
            pending_evidence: self.evidence.len(),
            frames_processed: self.frames_processed,
        });
    }
}
