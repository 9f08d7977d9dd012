//! Monitor configuration.

use std::collections::BTreeSet;
use std::str::FromStr;
use std::time::Duration;

use chrono::{FixedOffset, Offset, Utc};

use ppe_models::timestamp::utc_offset_hours;
use ppe_models::{parse_category_list, EquipmentCategory};

use crate::error::{MonitorError, MonitorResult};

/// Monitor configuration.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Camera / session label used in logs and status
    pub camera_name: String,
    /// Minimum confidence (0-100) for equipment to count as present
    pub min_confidence: f64,
    /// Equipment every person must wear
    pub required_categories: BTreeSet<EquipmentCategory>,
    /// Continuous non-compliance needed before a violation is confirmed
    pub violation_duration: Duration,
    /// Continuous empty scene needed before the no-person watchdog fires
    pub no_person_duration: Duration,
    /// Minimum gap between two alert dispatches
    pub alert_cooldown: Duration,
    /// Minimum gap between two perception calls
    pub process_interval: Duration,
    /// Gap between two frame uploads / evidence captures
    pub upload_interval: Duration,
    /// Frame cadence of the primary loop
    pub frame_rate: u32,
    /// Lifetime of presigned frame links in alerts
    pub presign_ttl: Duration,
    /// Offset used to render evidence ids and alert times
    pub utc_offset_hours: i32,
    /// Subject line of violation alerts
    pub alert_subject: String,
    /// Publish watchdog firings to the alert transport, not just the log
    pub notify_no_person: bool,
    /// Keep only the newest N frames in storage (disabled when unset)
    pub frame_retention: Option<usize>,
    /// How often retention pruning runs
    pub retention_interval: Duration,
    /// How long shutdown waits for an in-flight dispatch before flushing
    pub shutdown_timeout: Duration,
    /// Consecutive frame source failures tolerated before stopping
    pub max_frame_failures: u32,
    /// HTTP endpoint serving JPEG snapshots
    pub snapshot_url: Option<String>,
    /// Directory of JPEG frames to replay
    pub frame_dir: Option<String>,
    /// Prometheus listener address, e.g. `0.0.0.0:9100`
    pub metrics_addr: Option<String>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            camera_name: "camera-0".to_string(),
            min_confidence: 80.0,
            required_categories: EquipmentCategory::ALL.iter().copied().collect(),
            violation_duration: Duration::from_secs(3),
            no_person_duration: Duration::from_secs(3),
            alert_cooldown: Duration::from_secs(300),
            process_interval: Duration::from_millis(500),
            upload_interval: Duration::from_secs(3),
            frame_rate: 15,
            presign_ttl: Duration::from_secs(3600),
            utc_offset_hours: 3,
            alert_subject: "PPE ALERT".to_string(),
            notify_no_person: false,
            frame_retention: None,
            retention_interval: Duration::from_secs(600),
            shutdown_timeout: Duration::from_secs(30),
            max_frame_failures: 50,
            snapshot_url: None,
            frame_dir: None,
            metrics_addr: None,
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(default)
}

impl MonitorConfig {
    /// Create config from environment variables.
    ///
    /// Unparseable numbers fall back to their defaults; an invalid
    /// equipment list or offset is an error.
    pub fn from_env() -> MonitorResult<Self> {
        let defaults = Self::default();

        let required_categories = match std::env::var("PPE_REQUIRED_EQUIPMENT") {
            Ok(list) => parse_category_list(&list)
                .map_err(|e| MonitorError::config_error(e.to_string()))?,
            Err(_) => defaults.required_categories.clone(),
        };

        let config = Self {
            camera_name: std::env::var("PPE_CAMERA_NAME").unwrap_or(defaults.camera_name),
            min_confidence: env_or("PPE_MIN_CONFIDENCE", defaults.min_confidence),
            required_categories,
            violation_duration: Duration::from_secs(env_or("PPE_VIOLATION_DURATION_SECS", 3)),
            no_person_duration: Duration::from_secs(env_or("PPE_NO_PERSON_DURATION_SECS", 3)),
            alert_cooldown: Duration::from_secs(env_or("PPE_ALERT_COOLDOWN_SECS", 300)),
            process_interval: Duration::from_millis(env_or("PPE_PROCESS_INTERVAL_MS", 500)),
            upload_interval: Duration::from_secs(env_or("PPE_UPLOAD_INTERVAL_SECS", 3)),
            frame_rate: env_or("PPE_FRAME_RATE", defaults.frame_rate),
            presign_ttl: Duration::from_secs(env_or("PPE_PRESIGN_TTL_SECS", 3600)),
            utc_offset_hours: env_or("PPE_UTC_OFFSET_HOURS", defaults.utc_offset_hours),
            alert_subject: std::env::var("PPE_ALERT_SUBJECT").unwrap_or(defaults.alert_subject),
            notify_no_person: env_flag("PPE_NOTIFY_NO_PERSON", false),
            frame_retention: std::env::var("PPE_FRAME_RETENTION")
                .ok()
                .and_then(|s| s.trim().parse().ok()),
            retention_interval: Duration::from_secs(env_or("PPE_RETENTION_INTERVAL_SECS", 600)),
            shutdown_timeout: Duration::from_secs(env_or("PPE_SHUTDOWN_TIMEOUT_SECS", 30)),
            max_frame_failures: env_or("PPE_MAX_FRAME_FAILURES", defaults.max_frame_failures),
            snapshot_url: std::env::var("PPE_SNAPSHOT_URL").ok(),
            frame_dir: std::env::var("PPE_FRAME_DIR").ok(),
            metrics_addr: std::env::var("METRICS_ADDR").ok(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> MonitorResult<()> {
        if self.frame_rate == 0 {
            return Err(MonitorError::config_error("frame rate must be positive"));
        }
        if self.required_categories.is_empty() {
            return Err(MonitorError::config_error(
                "at least one required equipment category is needed",
            ));
        }
        if !(0.0..=100.0).contains(&self.min_confidence) {
            return Err(MonitorError::config_error(format!(
                "min confidence {} outside 0-100",
                self.min_confidence
            )));
        }
        utc_offset_hours(self.utc_offset_hours)
            .map_err(|e| MonitorError::config_error(e.to_string()))?;
        Ok(())
    }

    /// Target duration of one primary-loop tick.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.frame_rate.max(1)
    }

    /// Offset for evidence ids and alert times; UTC if out of range.
    pub fn utc_offset(&self) -> FixedOffset {
        utc_offset_hours(self.utc_offset_hours).unwrap_or_else(|_| Utc.fix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = MonitorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.required_categories.len(), 3);
        assert_eq!(config.alert_cooldown, Duration::from_secs(300));
        assert_eq!(config.utc_offset().local_minus_utc(), 3 * 3600);
    }

    #[test]
    fn test_frame_interval() {
        let config = MonitorConfig {
            frame_rate: 20,
            ..Default::default()
        };
        assert_eq!(config.frame_interval(), Duration::from_millis(50));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let zero_rate = MonitorConfig {
            frame_rate: 0,
            ..Default::default()
        };
        assert!(zero_rate.validate().is_err());

        let nothing_required = MonitorConfig {
            required_categories: BTreeSet::new(),
            ..Default::default()
        };
        assert!(nothing_required.validate().is_err());

        let bad_offset = MonitorConfig {
            utc_offset_hours: 30,
            ..Default::default()
        };
        assert!(bad_offset.validate().is_err());
        assert_eq!(bad_offset.utc_offset().local_minus_utc(), 0);
    }
}
