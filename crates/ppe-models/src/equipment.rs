//! Equipment categories tracked by the compliance engine.
//!
//! The perception service reports equipment by body part using the
//! wire names `HEAD_COVER`, `FACE_COVER` and `HAND_COVER`. Operators see
//! the human labels (Helmet, Mask, Gloves) in status lines and alerts.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Protective equipment category.
///
/// Ordering follows declaration order, which is also the order used when
/// rendering missing-item lists.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EquipmentCategory {
    /// Helmet or hard hat.
    HeadCover,
    /// Face mask.
    FaceCover,
    /// Gloves.
    HandCover,
}

impl EquipmentCategory {
    /// All known categories.
    pub const ALL: &'static [EquipmentCategory] = &[
        EquipmentCategory::HeadCover,
        EquipmentCategory::FaceCover,
        EquipmentCategory::HandCover,
    ];

    /// Wire name used by the perception service.
    pub fn as_str(&self) -> &'static str {
        match self {
            EquipmentCategory::HeadCover => "HEAD_COVER",
            EquipmentCategory::FaceCover => "FACE_COVER",
            EquipmentCategory::HandCover => "HAND_COVER",
        }
    }

    /// Human-readable label used in status lines and alert bodies.
    pub fn label(&self) -> &'static str {
        match self {
            EquipmentCategory::HeadCover => "Helmet",
            EquipmentCategory::FaceCover => "Mask",
            EquipmentCategory::HandCover => "Gloves",
        }
    }
}

impl fmt::Display for EquipmentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EquipmentCategory {
    type Err = EquipmentParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "HEAD_COVER" | "HELMET" => Ok(EquipmentCategory::HeadCover),
            "FACE_COVER" | "MASK" => Ok(EquipmentCategory::FaceCover),
            "HAND_COVER" | "GLOVES" => Ok(EquipmentCategory::HandCover),
            _ => Err(EquipmentParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown equipment category: {0}")]
pub struct EquipmentParseError(String);

/// Parse a comma-separated category list, e.g. `HEAD_COVER,HAND_COVER`.
///
/// Empty segments are skipped; duplicates collapse.
pub fn parse_category_list(s: &str) -> Result<BTreeSet<EquipmentCategory>, EquipmentParseError> {
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(EquipmentCategory::from_str)
        .collect()
}

/// Join category labels with `", "` in category order.
pub fn join_labels<'a>(categories: impl IntoIterator<Item = &'a EquipmentCategory>) -> String {
    categories
        .into_iter()
        .map(EquipmentCategory::label)
        .collect::<Vec<_>>()
        .join(", ")
}
