//! Pipeline configuration.

use std::path::PathBuf;

use crate::detector::ObjectDetectorConfig;
use crate::pipeline::MeasurementConfig;
use crate::pose::PoseEstimatorConfig;

/// Everything needed to build a [`crate::MeasurementPipeline`] from ONNX models.
#[derive(Debug, Clone, Default)]
pub struct VisionConfig {
    pub coin: ObjectDetectorConfig,
    pub pose: PoseEstimatorConfig,
    pub measurement: MeasurementConfig,
}

impl VisionConfig {
    /// Default thresholds with the given model files.
    pub fn with_models(coin_model: impl Into<PathBuf>, pose_model: impl Into<PathBuf>) -> Self {
        let mut config = Self::default();
        config.coin.model_path = coin_model.into();
        config.pose.model_path = pose_model.into();
        config
    }

    /// Override the reference coin diameter.
    pub fn with_coin_diameter_cm(mut self, diameter_cm: f64) -> Self {
        self.measurement.coin_diameter_cm = diameter_cm;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths() {
        let config = VisionConfig::default();
        assert_eq!(config.coin.model_path, PathBuf::from("models/coin/yolo11s.onnx"));
        assert_eq!(config.pose.model_path, PathBuf::from("models/keypoints/yolo11s-pose.onnx"));
        assert_eq!(config.measurement.coin_diameter_cm, 2.7);
        assert_eq!(config.pose.keypoint_threshold, 0.5);
    }

    #[test]
    fn test_with_models() {
        let config = VisionConfig::with_models("/m/coin.onnx", "/m/pose.onnx").with_coin_diameter_cm(2.5);
        assert_eq!(config.coin.model_path, PathBuf::from("/m/coin.onnx"));
        assert_eq!(config.pose.model_path, PathBuf::from("/m/pose.onnx"));
        assert_eq!(config.measurement.coin_diameter_cm, 2.5);
        assert_eq!(config.coin.confidence_threshold, 0.25);
    }
}
