//! Evidence records captured while a violation is active.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, FixedOffset, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::equipment::EquipmentCategory;

/// Unique identifier for a captured frame. Doubles as the storage key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct EvidenceId(pub String);

impl EvidenceId {
    /// Derive the id for a frame captured at `at`, rendered in `offset`.
    ///
    /// Frames captured within the same second share an id.
    pub fn for_frame(at: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self(
            at.with_timezone(&offset)
                .format("frame_%Y%m%d_%H%M%S.jpg")
                .to_string(),
        )
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EvidenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EvidenceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EvidenceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// One frame retained as proof of a violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EvidenceRecord {
    pub evidence_id: EvidenceId,
    pub missing_items: BTreeSet<EquipmentCategory>,
    pub captured_at: DateTime<Utc>,
}

impl EvidenceRecord {
    pub fn new(
        evidence_id: EvidenceId,
        missing_items: BTreeSet<EquipmentCategory>,
        captured_at: DateTime<Utc>,
    ) -> Self {
        Self {
            evidence_id,
            missing_items,
            captured_at,
        }
    }
}

/// Immutable copy of the evidence batch handed to background tasks.
///
/// Records are ordered by capture time, then id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceBatch {
    records: Vec<EvidenceRecord>,
}

impl EvidenceBatch {
    pub fn new(mut records: Vec<EvidenceRecord>) -> Self {
        records.sort_by(|a, b| {
            a.captured_at
                .cmp(&b.captured_at)
                .then_with(|| a.evidence_id.cmp(&b.evidence_id))
        });
        Self { records }
    }

    pub fn records(&self) -> &[EvidenceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Ids of every record in the batch.
    pub fn ids(&self) -> Vec<EvidenceId> {
        self.records.iter().map(|r| r.evidence_id.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_evidence_id_uses_offset() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 22, 15, 7).unwrap();
        let offset = FixedOffset::east_opt(3 * 3600).unwrap();
        assert_eq!(
            EvidenceId::for_frame(at, offset).as_str(),
            "frame_20240310_011507.jpg"
        );
    }

    #[test]
    fn test_batch_orders_by_capture_time() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let later = t0 + chrono::Duration::seconds(5);
        let batch = EvidenceBatch::new(vec![
            EvidenceRecord::new("b".into(), BTreeSet::new(), later),
            EvidenceRecord::new("a".into(), BTreeSet::new(), t0),
        ]);
        assert_eq!(batch.ids(), vec![EvidenceId::from("a"), EvidenceId::from("b")]);
    }
}
