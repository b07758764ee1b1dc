use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// An axis-aligned box in pixel units, stored as center plus size.
///
/// This is the layout YOLO heads emit (`xywh`), so detections keep it as-is and
/// derive corners only when a crop is needed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BoundingBox {
    /// Center X in pixels
    pub center_x: f64,
    /// Center Y in pixels
    pub center_y: f64,
    /// Width in pixels
    pub width: f64,
    /// Height in pixels
    pub height: f64,
}

impl BoundingBox {
    /// Create a box from center and size.
    pub fn new(center_x: f64, center_y: f64, width: f64, height: f64) -> Self {
        Self {
            center_x,
            center_y,
            width,
            height,
        }
    }

    /// Create a box from top-left and bottom-right corners.
    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            center_x: (x1 + x2) / 2.0,
            center_y: (y1 + y2) / 2.0,
            width: x2 - x1,
            height: y2 - y1,
        }
    }

    /// Box area in square pixels.
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// The shorter side, used as a diameter when no circle can be fitted.
    pub fn min_side(&self) -> f64 {
        self.width.min(self.height)
    }

    /// Integer corners `(x1, y1, x2, y2)`, truncated toward zero.
    pub fn corners(&self) -> (i64, i64, i64, i64) {
        let half_w = self.width / 2.0;
        let half_h = self.height / 2.0;
        (
            (self.center_x - half_w) as i64,
            (self.center_y - half_h) as i64,
            (self.center_x + half_w) as i64,
            (self.center_y + half_h) as i64,
        )
    }

    /// Check that the box has a finite, positive size.
    pub fn is_valid(&self) -> bool {
        self.center_x.is_finite()
            && self.center_y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
    }

    /// Clip the box to an image of the given size, returning the covered pixel region.
    ///
    /// Returns `None` when nothing of the box lies inside the image.
    pub fn clip_to(&self, image_width: u32, image_height: u32) -> Option<PixelRect> {
        let (x1, y1, x2, y2) = self.corners();
        let x1 = x1.clamp(0, image_width as i64);
        let y1 = y1.clamp(0, image_height as i64);
        let x2 = x2.clamp(0, image_width as i64);
        let y2 = y2.clamp(0, image_height as i64);

        if x2 <= x1 || y2 <= y1 {
            return None;
        }

        Some(PixelRect {
            x: x1 as u32,
            y: y1 as u32,
            width: (x2 - x1) as u32,
            height: (y2 - y1) as u32,
        })
    }
}

/// An integer pixel region inside an image (top-left origin).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// A circle found by the Hough transform, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Circle {
    pub center_x: f64,
    pub center_y: f64,
    pub radius: f64,
}

impl Circle {
    pub fn new(center_x: f64, center_y: f64, radius: f64) -> Self {
        Self {
            center_x,
            center_y,
            radius,
        }
    }

    pub fn diameter(&self) -> f64 {
        self.radius * 2.0
    }

    /// Shift the circle by an origin, e.g. from crop space into image space.
    pub fn offset(&self, dx: f64, dy: f64) -> Self {
        Self {
            center_x: self.center_x + dx,
            center_y: self.center_y + dy,
            radius: self.radius,
        }
    }
}
