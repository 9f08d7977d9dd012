//! Status exposed to presentation layers.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::equipment::EquipmentCategory;

/// Display status of a single equipment category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CategoryStatus {
    /// No person has been seen yet.
    #[default]
    Unknown,
    Ok,
    Missing,
}

impl CategoryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryStatus::Unknown => "Unknown",
            CategoryStatus::Ok => "OK",
            CategoryStatus::Missing => "MISSING",
        }
    }
}

impl fmt::Display for CategoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Snapshot of the monitoring session, refreshed once per frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MonitorStatus {
    /// Camera / session label.
    pub camera: String,
    /// Per-category status in category order.
    pub categories: Vec<(EquipmentCategory, CategoryStatus)>,
    /// A confirmed violation is active.
    pub active_violation: bool,
    /// Missing items of the most recent frame.
    pub missing_items: BTreeSet<EquipmentCategory>,
    /// The no-person watchdog has fired and the scene is still empty.
    pub no_person: bool,
    /// Wall-clock time of the last successful alert dispatch.
    pub last_alert_at: Option<DateTime<Utc>>,
    /// Seconds since the last perception result was received.
    pub last_result_age_secs: Option<f64>,
    /// Evidence records waiting for dispatch.
    pub pending_evidence: usize,
    /// Frames processed since session start.
    pub frames_processed: u64,
}

impl MonitorStatus {
    /// Status lines in the `"Helmet: OK"` form.
    pub fn status_lines(&self) -> Vec<String> {
        self.categories
            .iter()
            .map(|(category, status)| format!("{}: {}", category.label(), status))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_lines() {
        let status = MonitorStatus {
            categories: vec![
                (EquipmentCategory::HeadCover, CategoryStatus::Ok),
                (EquipmentCategory::HandCover, CategoryStatus::Missing),
            ],
            ..Default::default()
        };
        assert_eq!(status.status_lines(), vec!["Helmet: OK", "Gloves: MISSING"]);
    }
}
