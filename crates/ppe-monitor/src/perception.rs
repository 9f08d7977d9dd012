//! Background perception calls feeding the latest-result mailbox.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use ppe_models::{EquipmentCategory, PerceptionResponse};

use crate::clock::Clock;
use crate::collaborators::PerceptionService;
use crate::failures::FailureTracker;
use crate::mailbox::{InFlightFlag, LatestResult};
use crate::metrics;

/// Issues perception calls, at most one at a time.
#[derive(Clone)]
pub struct PerceptionWorker {
    service: Arc<dyn PerceptionService>,
    clock: Arc<dyn Clock>,
    mailbox: LatestResult,
    in_flight: InFlightFlag,
    failures: Arc<Mutex<FailureTracker>>,
    min_confidence: f64,
    required: Arc<BTreeSet<EquipmentCategory>>,
}

impl PerceptionWorker {
    pub fn new(
        service: Arc<dyn PerceptionService>,
        clock: Arc<dyn Clock>,
        min_confidence: f64,
        required: BTreeSet<EquipmentCategory>,
    ) -> Self {
        Self {
            service,
            clock,
            mailbox: LatestResult::new(),
            in_flight: InFlightFlag::new(),
            failures: Arc::new(Mutex::new(FailureTracker::new("perception", 5))),
            min_confidence,
            required: Arc::new(required),
        }
    }

    pub fn mailbox(&self) -> &LatestResult {
        &self.mailbox
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_busy()
    }

    /// Start a perception call for `jpeg` unless one is already running.
    ///
    /// Returns whether a call was started. The result lands in the mailbox;
    /// a malformed response is stored as an empty one, any other failure
    /// leaves the mailbox untouched.
    pub fn try_submit(&self, jpeg: Vec<u8>) -> bool {
        let Some(guard) = self.in_flight.try_acquire() else {
            return false;
        };

        let worker = self.clone();
        metrics::record_perception_call();

        tokio::spawn(async move {
            let _guard = guard;
            let result = worker
                .service
                .detect(&jpeg, worker.min_confidence, &worker.required)
                .await;

            let mut failures = worker.failures.lock().unwrap_or_else(|e| e.into_inner());
            match result {
                Ok(response) => {
                    debug!(
                        "Perception result: {} person(s), {} detection(s)",
                        response.persons.len(),
                        response.detection_count()
                    );
                    worker.mailbox.store(response, worker.clock.now());
                    failures.record_success();
                }
                Err(e) if e.is_malformed() => {
                    metrics::record_perception_failure("malformed");
                    if failures.record_failure() {
                        warn!("Malformed perception response, treating as empty: {}", e);
                    }
                    worker
                        .mailbox
                        .store(PerceptionResponse::empty(), worker.clock.now());
                }
                Err(e) => {
                    metrics::record_perception_failure("call");
                    if failures.record_failure() {
                        warn!("Perception call failed: {}", e);
                    }
                }
            }
        });

        true
    }
}
