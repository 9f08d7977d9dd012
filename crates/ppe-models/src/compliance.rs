//! Per-frame compliance records.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::equipment::EquipmentCategory;
use crate::rect::BoundingBox;
use crate::status::CategoryStatus;

/// Compliance of one detected person against the required categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonCompliance {
    /// Present flag per required category.
    pub equipment: BTreeMap<EquipmentCategory, bool>,
    /// Person region, opaque to the engine.
    pub region: Option<BoundingBox>,
}

impl PersonCompliance {
    pub fn new(equipment: BTreeMap<EquipmentCategory, bool>, region: Option<BoundingBox>) -> Self {
        Self { equipment, region }
    }

    /// Whether the given category was detected on this person.
    pub fn has(&self, category: EquipmentCategory) -> bool {
        self.equipment.get(&category).copied().unwrap_or(false)
    }

    /// Required categories not present on this person.
    pub fn missing(&self) -> impl Iterator<Item = EquipmentCategory> + '_ {
        self.equipment
            .iter()
            .filter(|(_, present)| !**present)
            .map(|(category, _)| *category)
    }
}

/// Normalized result of one perception response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameCompliance {
    /// Persons in service order.
    pub persons: Vec<PersonCompliance>,
    /// Frame-wide union of categories missing on at least one person.
    pub missing_items: BTreeSet<EquipmentCategory>,
    /// False until a real perception response has been normalized.
    pub observed: bool,
}

impl FrameCompliance {
    /// Frame used before any perception result has arrived.
    pub fn no_result() -> Self {
        Self::default()
    }

    /// Build from normalized persons, deriving `missing_items`.
    pub fn from_persons(persons: Vec<PersonCompliance>) -> Self {
        let missing_items = persons.iter().flat_map(PersonCompliance::missing).collect();
        Self {
            persons,
            missing_items,
            observed: true,
        }
    }

    /// True when a real response reported nobody in the frame.
    pub fn is_empty_scene(&self) -> bool {
        self.observed && self.persons.is_empty()
    }

    pub fn is_compliant(&self) -> bool {
        self.missing_items.is_empty()
    }

    /// Per-category status for display. Categories read `Unknown` until a
    /// person has been seen in this frame.
    pub fn category_status(
        &self,
        required: &BTreeSet<EquipmentCategory>,
    ) -> Vec<(EquipmentCategory, CategoryStatus)> {
        required
            .iter()
            .map(|category| {
                let status = if self.persons.is_empty() {
                    CategoryStatus::Unknown
                } else if self.missing_items.contains(category) {
                    CategoryStatus::Missing
                } else {
                    CategoryStatus::Ok
                };
                (*category, status)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use EquipmentCategory::*;

    fn person(present: &[(EquipmentCategory, bool)]) -> PersonCompliance {
        PersonCompliance::new(present.iter().copied().collect(), None)
    }

    #[test]
    fn test_missing_items_union_across_persons() {
        let frame = FrameCompliance::from_persons(vec![
            person(&[(HeadCover, true), (HandCover, false)]),
            person(&[(HeadCover, false), (HandCover, true)]),
        ]);
        assert_eq!(frame.missing_items, [HeadCover, HandCover].into_iter().collect());
        assert!(!frame.is_compliant());
    }

    #[test]
    fn test_no_result_is_not_an_empty_scene() {
        assert!(!FrameCompliance::no_result().is_empty_scene());
        assert!(FrameCompliance::from_persons(vec![]).is_empty_scene());
    }

    #[test]
    fn test_category_status() {
        let required: BTreeSet<_> = [HeadCover, FaceCover].into_iter().collect();
        let frame = FrameCompliance::from_persons(vec![person(&[(HeadCover, true), (FaceCover, false)])]);
        assert_eq!(
            frame.category_status(&required),
            vec![(HeadCover, CategoryStatus::Ok), (FaceCover, CategoryStatus::Missing)]
        );

        let empty = FrameCompliance::from_persons(vec![]);
        assert!(empty
            .category_status(&required)
            .iter()
            .all(|(_, s)| *s == CategoryStatus::Unknown));
    }
}
