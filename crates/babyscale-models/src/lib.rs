//! Shared data models for the babyscale measurement service.
//!
//! This crate provides Serde-serializable types for:
//! - Pixel-space geometry (bounding boxes, circles)
//! - Object detections and detection sets
//! - Pose keypoints in the COCO 17-point layout
//! - HTTP response bodies

pub mod api;
pub mod detection;
pub mod geometry;
pub mod keypoint;

// Re-export common types
pub use api::{ErrorResponse, MessageResponse, PredictionResponse};
pub use detection::{Detection, DetectionSet};
pub use geometry::{BoundingBox, Circle, PixelRect};
pub use keypoint::{CocoKeypoint, Keypoint, Pose, COCO_KEYPOINT_COUNT};
