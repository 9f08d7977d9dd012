//! Cooldown-gated alert dispatch.
//!
//! At most one dispatch runs at a time. The send happens on a detached task
//! holding an immutable batch snapshot; its outcome comes back over a channel
//! and is applied by the loop in [`AlertDispatcher::poll_completed`].

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use ppe_models::{EvidenceBatch, EvidenceId};

use crate::error::{MonitorError, MonitorResult};
use crate::evidence::EvidenceBatchStore;
use crate::metrics;
use crate::notification::AlertComposer;

/// Why a dispatch did not start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Empty,
    CoolingDown,
    InFlight,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Skipped(SkipReason),
    /// A background send was started with this many records.
    Started { records: usize },
    /// A send finished; the records it carried were removed.
    Sent { records: usize },
    /// A send failed; batch and cooldown are unchanged.
    Failed { error: String },
}

/// Outcome of a background send, reported back to the loop.
#[derive(Debug)]
pub struct DispatchReport {
    pub sent_ids: Vec<EvidenceId>,
    pub started_at: Instant,
    pub started_wall: DateTime<Utc>,
    pub result: Result<(), String>,
}

pub struct AlertDispatcher {
    composer: AlertComposer,
    cooldown: Duration,
    last_dispatch: Option<Instant>,
    last_dispatch_wall: Option<DateTime<Utc>>,
    in_flight: bool,
    /// Ids carried by the running background send.
    in_flight_ids: Vec<EvidenceId>,
    reports_tx: mpsc::UnboundedSender<DispatchReport>,
    reports_rx: mpsc::UnboundedReceiver<DispatchReport>,
}

impl AlertDispatcher {
    pub fn new(composer: AlertComposer, cooldown: Duration) -> Self {
        let (reports_tx, reports_rx) = mpsc::unbounded_channel();
        Self {
            composer,
            cooldown,
            last_dispatch: None,
            last_dispatch_wall: None,
            in_flight: false,
            in_flight_ids: Vec::new(),
            reports_tx,
            reports_rx,
        }
    }

    pub fn composer(&self) -> &AlertComposer {
        &self.composer
    }

    pub fn last_dispatch(&self) -> Option<Instant> {
        self.last_dispatch
    }

    /// Wall-clock time of the last successful dispatch.
    pub fn last_dispatch_wall(&self) -> Option<DateTime<Utc>> {
        self.last_dispatch_wall
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Whether a dispatch may start now.
    pub fn check(&self, store: &EvidenceBatchStore, now: Instant) -> Result<(), SkipReason> {
        if store.is_empty() {
            return Err(SkipReason::Empty);
        }
        if self.in_flight {
            return Err(SkipReason::InFlight);
        }
        if let Some(last) = self.last_dispatch {
            if now.saturating_duration_since(last) < self.cooldown {
                return Err(SkipReason::CoolingDown);
            }
        }
        Ok(())
    }

    /// Start a background dispatch if one is due.
    pub fn maybe_spawn(
        &mut self,
        store: &EvidenceBatchStore,
        now: Instant,
        wall: DateTime<Utc>,
    ) -> DispatchOutcome {
        if let Err(reason) = self.check(store, now) {
            return DispatchOutcome::Skipped(reason);
        }

        let batch = store.snapshot();
        let records = batch.len();
        let composer = self.composer.clone();
        let reports = self.reports_tx.clone();
        self.in_flight = true;
        self.in_flight_ids = batch.ids();

        tokio::spawn(async move {
            let result = composer.send(&batch).await.map_err(|e| e.to_string());
            let report = DispatchReport {
                sent_ids: batch.ids(),
                started_at: now,
                started_wall: wall,
                result,
            };
            if reports.send(report).is_err() {
                warn!("Dispatch finished after the session was dropped");
            }
        });

        DispatchOutcome::Started { records }
    }

    /// Apply every finished background dispatch.
    pub fn poll_completed(&mut self, store: &mut EvidenceBatchStore) -> Vec<DispatchOutcome> {
        let mut outcomes = Vec::new();
        while let Ok(report) = self.reports_rx.try_recv() {
            outcomes.push(self.apply(report, store));
        }
        outcomes
    }

    /// Wait up to `timeout` for the running dispatch to report back.
    pub async fn wait_in_flight(
        &mut self,
        store: &mut EvidenceBatchStore,
        timeout: Duration,
    ) -> Option<DispatchOutcome> {
        if !self.in_flight {
            return None;
        }
        match tokio::time::timeout(timeout, self.reports_rx.recv()).await {
            Ok(Some(report)) => Some(self.apply(report, store)),
            Ok(None) => None,
            Err(_) => {
                warn!("In-flight dispatch did not finish within {:?}", timeout);
                None
            }
        }
    }

    /// Dispatch if due, awaiting the send on the caller's task.
    pub async fn maybe_dispatch(
        &mut self,
        store: &mut EvidenceBatchStore,
        now: Instant,
        wall: DateTime<Utc>,
    ) -> DispatchOutcome {
        if let Err(reason) = self.check(store, now) {
            return DispatchOutcome::Skipped(reason);
        }

        let batch = store.snapshot();
        self.in_flight = true;
        self.in_flight_ids = batch.ids();
        let result = self.composer.send(&batch).await.map_err(|e| e.to_string());
        self.apply(
            DispatchReport {
                sent_ids: batch.ids(),
                started_at: now,
                started_wall: wall,
                result,
            },
            store,
        )
    }

    /// Send whatever is left, ignoring the cooldown.
    ///
    /// Records still carried by an unfinished background send are left out.
    /// The state snapshot is written before returning. Returns the number of
    /// records sent. Nothing is retried.
    pub async fn flush_on_shutdown(
        &mut self,
        store: &mut EvidenceBatchStore,
        now: Instant,
        wall: DateTime<Utc>,
    ) -> MonitorResult<usize> {
        let pending = store.snapshot();
        let batch = if self.in_flight {
            EvidenceBatch::new(
                pending
                    .records()
                    .iter()
                    .filter(|r| !self.in_flight_ids.contains(&r.evidence_id))
                    .cloned()
                    .collect(),
            )
        } else {
            pending
        };

        if batch.is_empty() {
            return Ok(0);
        }
        info!("Flushing {} pending evidence record(s) on shutdown", batch.len());

        match self.composer.send_final(&batch).await {
            Ok(()) => {
                let sent = store.remove(&batch.ids());
                self.last_dispatch = Some(now);
                self.last_dispatch_wall = Some(wall);
                metrics::record_alert_sent();
                Ok(sent)
            }
            Err(e) => {
                metrics::record_alert_failed();
                Err(MonitorError::ShutdownFlushFailed(e.to_string()))
            }
        }
    }

    fn apply(&mut self, report: DispatchReport, store: &mut EvidenceBatchStore) -> DispatchOutcome {
        self.in_flight = false;
        self.in_flight_ids.clear();
        match report.result {
            Ok(()) => {
                let removed = store.remove(&report.sent_ids);
                self.last_dispatch = Some(report.started_at);
                self.last_dispatch_wall = Some(report.started_wall);
                metrics::record_alert_sent();
                info!(
                    "Alert sent with {} violation frame(s), {} still pending",
                    report.sent_ids.len(),
                    store.len()
                );
                DispatchOutcome::Sent { records: removed }
            }
            Err(error) => {
                metrics::record_alert_failed();
                error!("Alert dispatch failed, keeping batch: {}", error);
                DispatchOutcome::Failed { error }
            }
        }
    }
}
