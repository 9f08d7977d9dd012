//! Prometheus metrics for the monitor.

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::{MonitorError, MonitorResult};

/// Metric names as constants for consistency.
pub mod names {
    pub const FRAMES_TOTAL: &str = "ppe_frames_total";
    pub const PERCEPTION_CALLS_TOTAL: &str = "ppe_perception_calls_total";
    pub const PERCEPTION_FAILURES_TOTAL: &str = "ppe_perception_failures_total";
    pub const VIOLATIONS_CONFIRMED_TOTAL: &str = "ppe_violations_confirmed_total";
    pub const EVIDENCE_CAPTURED_TOTAL: &str = "ppe_evidence_captured_total";
    pub const ALERTS_SENT_TOTAL: &str = "ppe_alerts_sent_total";
    pub const ALERTS_FAILED_TOTAL: &str = "ppe_alerts_failed_total";
    pub const NO_PERSON_EVENTS_TOTAL: &str = "ppe_no_person_events_total";
    pub const PERCEPTION_RESULT_AGE_SECONDS: &str = "ppe_perception_result_age_seconds";
}

/// Install the Prometheus recorder with an HTTP listener on `addr`.
pub fn init_metrics(addr: &str) -> MonitorResult<()> {
    let addr: SocketAddr = addr
        .parse()
        .map_err(|e| MonitorError::config_error(format!("Invalid METRICS_ADDR '{}': {}", addr, e)))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| MonitorError::config_error(format!("Failed to install Prometheus exporter: {}", e)))
}

pub fn record_frame() {
    counter!(names::FRAMES_TOTAL).increment(1);
}

pub fn record_perception_call() {
    counter!(names::PERCEPTION_CALLS_TOTAL).increment(1);
}

pub fn record_perception_failure(kind: &str) {
    let labels = [("kind", kind.to_string())];
    counter!(names::PERCEPTION_FAILURES_TOTAL, &labels).increment(1);
}

pub fn record_violation_confirmed() {
    counter!(names::VIOLATIONS_CONFIRMED_TOTAL).increment(1);
}

pub fn record_evidence_captured() {
    counter!(names::EVIDENCE_CAPTURED_TOTAL).increment(1);
}

pub fn record_alert_sent() {
    counter!(names::ALERTS_SENT_TOTAL).increment(1);
}

pub fn record_alert_failed() {
    counter!(names::ALERTS_FAILED_TOTAL).increment(1);
}

pub fn record_no_person_event() {
    counter!(names::NO_PERSON_EVENTS_TOTAL).increment(1);
}

pub fn set_result_age(age_secs: f64) {
    gauge!(names::PERCEPTION_RESULT_AGE_SECONDS).set(age_secs);
}
