//! Shared data models for the PPE compliance monitor.
//!
//! This crate provides Serde-serializable types for:
//! - Equipment categories and their display labels
//! - Perception service responses
//! - Per-frame compliance records
//! - Evidence records and batches
//! - Status snapshots for presentation layers

pub mod compliance;
pub mod equipment;
pub mod evidence;
pub mod perception;
pub mod rect;
pub mod status;
pub mod timestamp;

// Re-export common types
pub use compliance::{FrameCompliance, PersonCompliance};
pub use equipment::{join_labels, parse_category_list, EquipmentCategory, EquipmentParseError};
pub use evidence::{EvidenceBatch, EvidenceId, EvidenceRecord};
pub use perception::{BodyPart, DetectedPerson, EquipmentDetection, PerceptionResponse};
pub use rect::BoundingBox;
pub use status::{CategoryStatus, MonitorStatus};
