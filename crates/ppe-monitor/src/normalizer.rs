//! Maps raw perception responses onto per-person compliance.

use std::collections::{BTreeMap, BTreeSet};

use ppe_models::{EquipmentCategory, FrameCompliance, PerceptionResponse, PersonCompliance};

/// Normalize one perception response.
///
/// A required category counts as present on a person when any detection of
/// that type reaches `min_confidence`. Unknown equipment types are ignored.
/// `None` means no result has arrived yet and yields an unobserved frame.
pub fn normalize(
    response: Option<&PerceptionResponse>,
    min_confidence: f64,
    required: &BTreeSet<EquipmentCategory>,
) -> FrameCompliance {
    let Some(response) = response else {
        return FrameCompliance::no_result();
    };

    let persons = response
        .persons
        .iter()
        .map(|person| {
            let mut equipment: BTreeMap<EquipmentCategory, bool> =
                required.iter().map(|category| (*category, false)).collect();

            let detections = person
                .body_parts
                .iter()
                .flat_map(|part| part.equipment_detections.iter());

            for detection in detections {
                let Ok(category) = detection.kind.parse::<EquipmentCategory>() else {
                    continue;
                };
                if detection.confidence >= min_confidence {
                    if let Some(present) = equipment.get_mut(&category) {
                        *present = true;
                    }
                }
            }

            PersonCompliance::new(equipment, person.bounding_box)
        })
        .collect();

    FrameCompliance::from_persons(persons)
}
