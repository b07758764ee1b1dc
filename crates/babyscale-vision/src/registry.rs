//! Shared, lazily loaded models.
//!
//! ONNX sessions are expensive to build, so the first request that needs the
//! pipeline loads both models and every later request reuses them. The load
//! outcome is cached, including failure: a missing model file stays missing
//! until the process restarts.

use std::sync::{Arc, OnceLock};

use tracing::{error, info};

use crate::config::VisionConfig;
use crate::detector::YoloDetector;
use crate::error::{VisionError, VisionResult};
use crate::pipeline::MeasurementPipeline;
use crate::pose::YoloPoseEstimator;

/// Process-wide holder of the measurement pipeline.
pub struct ModelRegistry {
    config: VisionConfig,
    pipeline: OnceLock<Result<Arc<MeasurementPipeline>, String>>,
}

impl ModelRegistry {
    /// Registry that loads ONNX models on first use.
    pub fn new(config: VisionConfig) -> Self {
        Self {
            config,
            pipeline: OnceLock::new(),
        }
    }

    /// Registry around an already built pipeline.
    pub fn preloaded(pipeline: MeasurementPipeline) -> Self {
        let config = VisionConfig {
            measurement: *pipeline.config(),
            ..VisionConfig::default()
        };
        let cell = OnceLock::new();
        let _ = cell.set(Ok(Arc::new(pipeline)));
        Self { config, pipeline: cell }
    }

    pub fn config(&self) -> &VisionConfig {
        &self.config
    }

    /// Get the pipeline, loading models if this is the first call.
    pub fn pipeline(&self) -> VisionResult<Arc<MeasurementPipeline>> {
        self.pipeline
            .get_or_init(|| match load(&self.config) {
                Ok(pipeline) => {
                    info!("Measurement models loaded");
                    Ok(Arc::new(pipeline))
                }
                Err(e) => {
                    error!(error = %e, "Measurement models failed to load");
                    Err(e.to_string())
                }
            })
            .clone()
            .map_err(VisionError::model_load)
    }

    /// Whether both models are loaded (or loadable).
    pub fn is_ready(&self) -> bool {
        self.pipeline().is_ok()
    }
}

fn load(config: &VisionConfig) -> VisionResult<MeasurementPipeline> {
    let coin = YoloDetector::new(config.coin.clone())?;
    let pose = YoloPoseEstimator::new(config.pose.clone())?;
    Ok(MeasurementPipeline::new(Arc::new(coin), Arc::new(pose), config.measurement))
}
