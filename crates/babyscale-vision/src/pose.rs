//! Body keypoint estimation using a YOLO pose ONNX model.
//!
//! The pose head emits `[1, 5 + 17 * 3, anchors]`: box center/size, person
//! score, then `(x, y, confidence)` for each COCO keypoint. Only the most
//! confident person is returned.

use std::path::PathBuf;
use std::sync::Mutex;

use babyscale_models::{BoundingBox, Keypoint, Pose, COCO_KEYPOINT_COUNT};
use image::RgbImage;
use ndarray::Array;
use ort::session::Session;
use tracing::{debug, info};

use crate::error::{VisionError, VisionResult};
use crate::nms::{non_maximum_suppression, Candidate};
use crate::onnx::{create_session, input_tensor, run_single, RawOutput};
use crate::preprocess::{letterbox, to_nchw, LetterboxMeta};

const POSE_FEATURES: usize = 5 + COCO_KEYPOINT_COUNT * 3;

/// Locates body keypoints in a frame.
pub trait PoseEstimator: Send + Sync {
    /// Keypoints of the most confident person, or `None` if nobody was found.
    fn estimate(&self, image: &RgbImage) -> VisionResult<Option<Pose>>;
}

/// Configuration for the YOLO pose estimator.
#[derive(Debug, Clone)]
pub struct PoseEstimatorConfig {
    /// Path to ONNX model file
    pub model_path: PathBuf,
    /// Person confidence threshold
    pub confidence_threshold: f32,
    /// Keypoints below this confidence are reported as undefined
    pub keypoint_threshold: f32,
    /// IoU threshold for NMS
    pub nms_threshold: f64,
    /// Input image size (model expects square input)
    pub input_size: u32,
}

impl Default for PoseEstimatorConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/keypoints/yolo11s-pose.onnx"),
            confidence_threshold: 0.25,
            keypoint_threshold: 0.5,
            nms_threshold: 0.45,
            input_size: 640,
        }
    }
}

/// Pose estimator backed by an ONNX Runtime session.
pub struct YoloPoseEstimator {
    session: Mutex<Session>,
    config: PoseEstimatorConfig,
}

impl YoloPoseEstimator {
    pub fn new(config: PoseEstimatorConfig) -> VisionResult<Self> {
        let session = Mutex::new(create_session(&config.model_path, "pose")?);
        info!(
            model_path = %config.model_path.display(),
            input_size = config.input_size,
            "Pose estimator initialized"
        );

        Ok(Self { session, config })
    }

    pub fn config(&self) -> &PoseEstimatorConfig {
        &self.config
    }
}

impl PoseEstimator for YoloPoseEstimator {
    fn estimate(&self, image: &RgbImage) -> VisionResult<Option<Pose>> {
        let (canvas, meta) = letterbox(image, self.config.input_size);
        let (shape, data) = to_nchw(&canvas);
        let output = run_single(&self.session, input_tensor(shape, data)?)?;

        let pose = decode_pose(&output, &meta, &self.config)?;
        debug!(found = pose.is_some(), "Pose estimation completed");

        Ok(pose)
    }
}

/// Decode a YOLO pose head into the most confident person.
pub fn decode_pose(
    output: &RawOutput,
    meta: &LetterboxMeta,
    config: &PoseEstimatorConfig,
) -> VisionResult<Option<Pose>> {
    let (num_features, num_boxes) = output.yolo_dims()?;
    if num_features != POSE_FEATURES {
        return Err(VisionError::invalid_output(format!(
            "Pose head has {} features, expected {}",
            num_features, POSE_FEATURES
        )));
    }

    let output_array = Array::from_shape_vec((num_features, num_boxes), output.data.clone())
        .map_err(|e| VisionError::invalid_output(format!("Failed to reshape output: {}", e)))?;
    let rows = output_array.t();

    let mut candidates = Vec::new();
    let mut anchors = Vec::new();
    for i in 0..num_boxes {
        let score = rows[[i, 4]];
        if score < config.confidence_threshold {
            continue;
        }

        let (cx, cy) = meta.to_source(rows[[i, 0]] as f64, rows[[i, 1]] as f64);
        let bbox = BoundingBox::new(
            cx,
            cy,
            meta.length_to_source(rows[[i, 2]] as f64),
            meta.length_to_source(rows[[i, 3]] as f64),
        );
        if !bbox.is_valid() {
            continue;
        }

        candidates.push(Candidate {
            bbox,
            class_id: 0,
            score,
        });
        anchors.push(i);
    }

    let kept = non_maximum_suppression(&candidates, config.nms_threshold);
    let Some(&best) = kept.first() else {
        return Ok(None);
    };

    let anchor = anchors[best];
    let mut keypoints = [Keypoint::undefined(); COCO_KEYPOINT_COUNT];
    for (k, slot) in keypoints.iter_mut().enumerate() {
        let base = 5 + k * 3;
        let confidence = rows[[anchor, base + 2]];
        if confidence < config.keypoint_threshold {
            continue;
        }
        let (x, y) = meta.to_source(rows[[anchor, base]] as f64, rows[[anchor, base + 1]] as f64);
        *slot = Keypoint::new(x, y, confidence);
    }

    Ok(Some(Pose::new(
        keypoints,
        candidates[best].bbox,
        candidates[best].score,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use babyscale_models::CocoKeypoint;

    fn pose_row(score: f32, kp_conf: f32) -> Vec<f32> {
        let mut row = vec![200.0, 200.0, 100.0, 300.0, score];
        for k in 0..COCO_KEYPOINT_COUNT {
            row.extend([10.0 * k as f32, 20.0 * k as f32, kp_conf]);
        }
        row
    }

    fn head(rows: &[Vec<f32>]) -> RawOutput {
        let features = rows[0].len();
        let anchors = rows.len();
        let mut data = vec![0.0f32; features * anchors];
        for (a, row) in rows.iter().enumerate() {
            for (f, v) in row.iter().enumerate() {
                data[f * anchors + a] = *v;
            }
        }
        RawOutput {
            shape: vec![1, features, anchors],
            data,
        }
    }

    fn identity_meta() -> LetterboxMeta {
        LetterboxMeta {
            scale: 1.0,
            pad_x: 0.0,
            pad_y: 0.0,
        }
    }

    #[test]
    fn test_decode_picks_most_confident_person() {
        let mut weaker = pose_row(0.5, 0.9);
        weaker[0] = 500.0; // separate box so NMS keeps both
        let output = head(&[weaker, pose_row(0.8, 0.9)]);

        let pose = decode_pose(&output, &identity_meta(), &PoseEstimatorConfig::default())
            .unwrap()
            .unwrap();

        assert!((pose.confidence - 0.8).abs() < 1e-6);
        assert_eq!(pose.bbox.center_x, 200.0);
        let ankle = pose.get(CocoKeypoint::LeftAnkle);
        assert_eq!((ankle.x, ankle.y), (150.0, 300.0));
    }

    #[test]
    fn test_low_confidence_keypoints_are_undefined() {
        let output = head(&[pose_row(0.9, 0.2)]);
        let pose = decode_pose(&output, &identity_meta(), &PoseEstimatorConfig::default())
            .unwrap()
            .unwrap();
        assert!(pose.keypoints.iter().all(|kp| !kp.is_defined()));
    }

    #[test]
    fn test_no_person() {
        let output = head(&[pose_row(0.1, 0.9)]);
        let pose = decode_pose(&output, &identity_meta(), &PoseEstimatorConfig::default()).unwrap();
        assert!(pose.is_none());
    }

    #[test]
    fn test_rejects_wrong_head() {
        let output = RawOutput {
            shape: vec![1, 84, 1],
            data: vec![0.0; 84],
        };
        assert!(decode_pose(&output, &identity_meta(), &PoseEstimatorConfig::default()).is_err());
    }
}
