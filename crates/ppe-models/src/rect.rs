use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A normalized bounding box (0.0 to 1.0) relative to the analysed frame.
///
/// Field names follow the perception service's wire format.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub struct BoundingBox {
    /// X coordinate of the top-left corner (0.0 = left, 1.0 = right)
    pub left: f64,
    /// Y coordinate of the top-left corner (0.0 = top, 1.0 = bottom)
    pub top: f64,
    /// Width of the box (0.0 to 1.0)
    pub width: f64,
    /// Height of the box (0.0 to 1.0)
    pub height: f64,
}

impl BoundingBox {
    /// Create a new bounding box.
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }

    /// Check if the box is valid (within 0.0-1.0 range).
    pub fn is_valid(&self) -> bool {
        self.left >= 0.0
            && self.top >= 0.0
            && self.width > 0.0
            && self.height > 0.0
            && self.left + self.width <= 1.001 // Allow small epsilon for float precision
            && self.top + self.height <= 1.001
    }

    /// Convert to pixel coordinates `(x, y, w, h)` for a frame of the given size.
    pub fn to_pixels(&self, frame_width: u32, frame_height: u32) -> (i32, i32, i32, i32) {
        let fw = frame_width as f64;
        let fh = frame_height as f64;
        (
            (self.left * fw) as i32,
            (self.top * fh) as i32,
            (self.width * fw) as i32,
            (self.height * fh) as i32,
        )
    }
}
