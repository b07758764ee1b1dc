//! Coin-calibrated infant length measurement.
//!
//! This crate provides:
//! - YOLO coin detection and pose estimation through ONNX Runtime
//! - Hough circle refinement of the coin's pixel diameter
//! - Scale and body length calculation
//! - The measurement pipeline and result image annotation
//! - A lazily loaded, shared model registry

pub mod annotate;
pub mod config;
pub mod detector;
pub mod error;
pub mod hough;
pub mod length;
pub mod nms;
pub mod onnx;
pub mod pipeline;
pub mod pose;
pub mod preprocess;
pub mod refiner;
pub mod registry;
pub mod scale;

pub use config::VisionConfig;
pub use detector::{ObjectDetector, ObjectDetectorConfig, YoloDetector};
pub use error::{VisionError, VisionResult};
pub use hough::{hough_circles, HoughParams};
pub use length::{body_length_cm, length_px, LengthKeypoints};
pub use pipeline::{Measurement, MeasurementConfig, MeasurementOutcome, MeasurementPipeline, NoResultReason};
pub use pose::{PoseEstimator, PoseEstimatorConfig, YoloPoseEstimator};
pub use refiner::{locate_coin, CircleRefiner, DiameterEstimate, COIN_DIAMETER_CM};
pub use registry::ModelRegistry;
pub use scale::{scale_factor, ScaleFactor};
