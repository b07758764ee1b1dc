//! Reference-object detection using a YOLO ONNX model.
//!
//! The coin model is a YOLO detector exported to ONNX. Its head emits
//! `[1, 4 + classes, anchors]`: box center/size followed by per-class scores.
//! The class count is taken from the output shape so single-class coin
//! models and 80-class COCO models both work.

use std::path::PathBuf;
use std::sync::Mutex;

use babyscale_models::{BoundingBox, Detection, DetectionSet};
use image::RgbImage;
use ndarray::Array;
use ort::session::Session;
use tracing::{debug, info};

use crate::error::{VisionError, VisionResult};
use crate::nms::{non_maximum_suppression, Candidate};
use crate::onnx::{create_session, input_tensor, run_single, RawOutput};
use crate::preprocess::{letterbox, to_nchw, LetterboxMeta};

/// Locates reference objects in a frame.
pub trait ObjectDetector: Send + Sync {
    /// Detect objects, returning boxes in source image pixels.
    fn detect(&self, image: &RgbImage) -> VisionResult<DetectionSet>;
}

/// Configuration for the YOLO object detector.
#[derive(Debug, Clone)]
pub struct ObjectDetectorConfig {
    /// Path to ONNX model file
    pub model_path: PathBuf,
    /// Confidence threshold for detections
    pub confidence_threshold: f32,
    /// IoU threshold for NMS
    pub nms_threshold: f64,
    /// Input image size (model expects square input)
    pub input_size: u32,
}

impl Default for ObjectDetectorConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/coin/yolo11s.onnx"),
            confidence_threshold: 0.25,
            nms_threshold: 0.45,
            input_size: 640,
        }
    }
}

/// Object detector backed by an ONNX Runtime session.
pub struct YoloDetector {
    session: Mutex<Session>,
    config: ObjectDetectorConfig,
}

impl YoloDetector {
    /// Create a new detector from config.
    ///
    /// Returns error if model file doesn't exist or cannot be loaded.
    pub fn new(config: ObjectDetectorConfig) -> VisionResult<Self> {
        let session = Mutex::new(create_session(&config.model_path, "coin")?);
        info!(
            model_path = %config.model_path.display(),
            input_size = config.input_size,
            "Object detector initialized"
        );

        Ok(Self { session, config })
    }

    pub fn config(&self) -> &ObjectDetectorConfig {
        &self.config
    }
}

impl ObjectDetector for YoloDetector {
    fn detect(&self, image: &RgbImage) -> VisionResult<DetectionSet> {
        let (canvas, meta) = letterbox(image, self.config.input_size);
        let (shape, data) = to_nchw(&canvas);
        let output = run_single(&self.session, input_tensor(shape, data)?)?;

        let detections = decode_detections(&output, &meta, &self.config)?;
        debug!(count = detections.len(), "Object detection completed");

        Ok(detections)
    }
}

/// Decode a YOLO detection head and apply NMS.
pub fn decode_detections(
    output: &RawOutput,
    meta: &LetterboxMeta,
    config: &ObjectDetectorConfig,
) -> VisionResult<DetectionSet> {
    let (num_features, num_boxes) = output.yolo_dims()?;
    if num_features <= 4 {
        return Err(VisionError::invalid_output(format!(
            "Detection head has {} features, expected more than 4",
            num_features
        )));
    }
    let num_classes = num_features - 4;

    // [features, anchors] -> [anchors, features]
    let output_array = Array::from_shape_vec((num_features, num_boxes), output.data.clone())
        .map_err(|e| VisionError::invalid_output(format!("Failed to reshape output: {}", e)))?;
    let transposed = output_array.t();

    let mut candidates = Vec::new();
    for i in 0..num_boxes {
        let mut best_class = 0;
        let mut best_score = 0.0f32;
        for c in 0..num_classes {
            let score = transposed[[i, 4 + c]];
            if score > best_score {
                best_score = score;
                best_class = c;
            }
        }

        if best_score < config.confidence_threshold {
            continue;
        }

        let (cx, cy) = meta.to_source(transposed[[i, 0]] as f64, transposed[[i, 1]] as f64);
        let bbox = BoundingBox::new(
            cx,
            cy,
            meta.length_to_source(transposed[[i, 2]] as f64),
            meta.length_to_source(transposed[[i, 3]] as f64),
        );
        if !bbox.is_valid() {
            continue;
        }

        candidates.push(Candidate {
            bbox,
            class_id: best_class,
            score: best_score,
        });
    }

    let kept = non_maximum_suppression(&candidates, config.nms_threshold);
    Ok(kept
        .into_iter()
        .map(|i| {
            let c = candidates[i];
            Detection::new(c.bbox, c.class_id, c.score)
        })
        .collect::<Vec<_>>()
        .into())
}
