//! Perception service request types.

use std::collections::BTreeSet;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use ppe_models::EquipmentCategory;

/// Request body for `POST /detect-ppe`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectRequest {
    /// Base64-encoded JPEG frame
    pub image: String,
    /// Minimum confidence (0-100) for an equipment detection to count
    pub min_confidence: f64,
    /// Equipment types the service should summarize
    pub required_equipment_types: Vec<EquipmentCategory>,
}

impl DetectRequest {
    pub fn new(jpeg: &[u8], min_confidence: f64, required: &BTreeSet<EquipmentCategory>) -> Self {
        Self {
            image: STANDARD.encode(jpeg),
            min_confidence,
            required_equipment_types: required.iter().copied().collect(),
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_format() {
        let required: BTreeSet<_> = [EquipmentCategory::HandCover, EquipmentCategory::HeadCover]
            .into_iter()
            .collect();
        let request = DetectRequest::new(b"jpeg", 80.0, &required);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["image"], "anBlZw==");
        assert_eq!(json["min_confidence"], 80.0);
        assert_eq!(
            json["required_equipment_types"],
            serde_json::json!(["HEAD_COVER", "HAND_COVER"])
        );
    }
}
