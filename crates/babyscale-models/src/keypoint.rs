use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::geometry::BoundingBox;

/// Number of keypoints in the COCO body layout used by YOLO pose models.
pub const COCO_KEYPOINT_COUNT: usize = 17;

/// Named COCO keypoints. The discriminant is the index in the model output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CocoKeypoint {
    Nose = 0,
    LeftEye = 1,
    RightEye = 2,
    LeftEar = 3,
    RightEar = 4,
    LeftShoulder = 5,
    RightShoulder = 6,
    LeftElbow = 7,
    RightElbow = 8,
    LeftWrist = 9,
    RightWrist = 10,
    LeftHip = 11,
    RightHip = 12,
    LeftKnee = 13,
    RightKnee = 14,
    LeftAnkle = 15,
    RightAnkle = 16,
}

impl CocoKeypoint {
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Nose => "nose",
            Self::LeftEye => "left_eye",
            Self::RightEye => "right_eye",
            Self::LeftEar => "left_ear",
            Self::RightEar => "right_ear",
            Self::LeftShoulder => "left_shoulder",
            Self::RightShoulder => "right_shoulder",
            Self::LeftElbow => "left_elbow",
            Self::RightElbow => "right_elbow",
            Self::LeftWrist => "left_wrist",
            Self::RightWrist => "right_wrist",
            Self::LeftHip => "left_hip",
            Self::RightHip => "right_hip",
            Self::LeftKnee => "left_knee",
            Self::RightKnee => "right_knee",
            Self::LeftAnkle => "left_ankle",
            Self::RightAnkle => "right_ankle",
        }
    }
}

impl std::fmt::Display for CocoKeypoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A landmark location in image pixels.
///
/// Coordinates are NaN when the pose model could not localize the landmark.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Keypoint {
    pub x: f64,
    pub y: f64,
    pub confidence: f32,
}

impl Keypoint {
    pub fn new(x: f64, y: f64, confidence: f32) -> Self {
        Self { x, y, confidence }
    }

    /// A keypoint the model did not localize.
    pub fn undefined() -> Self {
        Self {
            x: f64::NAN,
            y: f64::NAN,
            confidence: 0.0,
        }
    }

    pub fn is_defined(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Euclidean distance in pixels.
    pub fn distance_to(&self, other: &Keypoint) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

impl Default for Keypoint {
    fn default() -> Self {
        Self::undefined()
    }
}

/// Keypoints of one detected person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Pose {
    pub keypoints: [Keypoint; COCO_KEYPOINT_COUNT],
    /// Person box in image pixels
    pub bbox: BoundingBox,
    /// Person confidence [0, 1]
    pub confidence: f32,
}

impl Pose {
    pub fn new(keypoints: [Keypoint; COCO_KEYPOINT_COUNT], bbox: BoundingBox, confidence: f32) -> Self {
        Self {
            keypoints,
            bbox,
            confidence,
        }
    }

    pub fn get(&self, keypoint: CocoKeypoint) -> &Keypoint {
        &self.keypoints[keypoint.index()]
    }
}
