//! Wire types returned by the perception service.
//!
//! The shape mirrors a PPE-detection response: persons in service order,
//! each with body parts carrying equipment detections. Every collection and
//! score defaults when absent so that a partially filled response degrades
//! toward "nothing detected" instead of failing to decode.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::rect::BoundingBox;

/// One perception result for a single analysed frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct PerceptionResponse {
    /// Detected persons, in the order reported by the service.
    #[serde(default)]
    pub persons: Vec<DetectedPerson>,
}

impl PerceptionResponse {
    /// A response that reports nobody in the frame.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Total number of equipment detections across all persons.
    pub fn detection_count(&self) -> usize {
        self.persons
            .iter()
            .flat_map(|p| p.body_parts.iter())
            .map(|b| b.equipment_detections.len())
            .sum()
    }
}

/// A person found in the frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct DetectedPerson {
    /// Person region; passed through for rendering only.
    #[serde(default)]
    pub bounding_box: Option<BoundingBox>,
    /// Person confidence (0-100), when reported.
    #[serde(default)]
    pub confidence: Option<f64>,
    /// Body parts inspected for equipment.
    #[serde(default)]
    pub body_parts: Vec<BodyPart>,
}

/// A body part with the equipment detected on it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct BodyPart {
    /// Body part name (e.g. `FACE`, `HEAD`, `LEFT_HAND`).
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub equipment_detections: Vec<EquipmentDetection>,
}

/// A single equipment detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct EquipmentDetection {
    /// Raw equipment type reported by the service (e.g. `HAND_COVER`).
    /// Unknown types are kept verbatim and ignored during normalization.
    #[serde(rename = "Type", default)]
    pub kind: String,
    /// Confidence score, 0-100.
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub bounding_box: Option<BoundingBox>,
}

impl EquipmentDetection {
    pub fn new(kind: impl Into<String>, confidence: f64) -> Self {
        Self {
            kind: kind.into(),
            confidence,
            bounding_box: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_full_response() {
        let json = r#"{
            "Persons": [{
                "BoundingBox": {"Left": 0.1, "Top": 0.1, "Width": 0.5, "Height": 0.8},
                "Confidence": 99.1,
                "BodyParts": [
                    {"Name": "HEAD", "EquipmentDetections": [
                        {"Type": "HEAD_COVER", "Confidence": 97.5,
                         "BoundingBox": {"Left": 0.2, "Top": 0.1, "Width": 0.1, "Height": 0.1}}
                    ]},
                    {"Name": "LEFT_HAND", "EquipmentDetections": []}
                ]
            }]
        }"#;

        let response: PerceptionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.persons.len(), 1);
        assert_eq!(response.detection_count(), 1);
        let detection = &response.persons[0].body_parts[0].equipment_detections[0];
        assert_eq!(detection.kind, "HEAD_COVER");
        assert!(detection.bounding_box.is_some());
    }

    #[test]
    fn test_missing_fields_default_to_nothing() {
        let response: PerceptionResponse = serde_json::from_str("{}").unwrap();
        assert!(response.persons.is_empty());

        let response: PerceptionResponse =
            serde_json::from_str(r#"{"Persons":[{"BodyParts":[{"EquipmentDetections":[{"Type":"FACE_COVER"}]}]}]}"#)
                .unwrap();
        let detection = &response.persons[0].body_parts[0].equipment_detections[0];
        assert_eq!(detection.confidence, 0.0);
        assert!(response.persons[0].bounding_box.is_none());
    }
}
