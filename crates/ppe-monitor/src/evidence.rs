//! Evidence batch store.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use ppe_models::{EquipmentCategory, EvidenceBatch, EvidenceId, EvidenceRecord};

use crate::violation::ViolationState;

/// Result of [`EvidenceBatchStore::capture`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    Inserted,
    /// The id was already captured; the existing record is kept.
    Duplicate,
    /// No confirmed violation; nothing stored.
    Inactive,
}

/// Evidence captured for the active violation, keyed by evidence id.
#[derive(Debug, Default)]
pub struct EvidenceBatchStore {
    records: HashMap<EvidenceId, EvidenceRecord>,
}

impl EvidenceBatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record if the violation is confirmed and the id is new.
    pub fn capture(
        &mut self,
        evidence_id: EvidenceId,
        missing_items: BTreeSet<EquipmentCategory>,
        captured_at: DateTime<Utc>,
        state: &ViolationState,
    ) -> CaptureOutcome {
        if !state.is_confirmed() {
            return CaptureOutcome::Inactive;
        }
        if self.records.contains_key(&evidence_id) {
            return CaptureOutcome::Duplicate;
        }

        let record = EvidenceRecord::new(evidence_id.clone(), missing_items, captured_at);
        self.records.insert(evidence_id, record);
        CaptureOutcome::Inserted
    }

    /// Immutable copy of the current batch.
    pub fn snapshot(&self) -> EvidenceBatch {
        EvidenceBatch::new(self.records.values().cloned().collect())
    }

    /// Drop everything. Returns the number of records removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.records.len();
        self.records.clear();
        removed
    }

    /// Drop exactly the given ids. Returns the number of records removed.
    pub fn remove(&mut self, ids: &[EvidenceId]) -> usize {
        ids.iter()
            .filter(|id| self.records.remove(*id).is_some())
            .count()
    }

    pub fn contains(&self, id: &EvidenceId) -> bool {
        self.records.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
