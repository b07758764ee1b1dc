//! ONNX Runtime session helpers shared by the YOLO models.

use std::path::Path;
use std::sync::Mutex;

use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::{Tensor, Value};
use tracing::{debug, info};

use crate::error::{VisionError, VisionResult};

/// Raw output tensor copied out of the session.
#[derive(Debug, Clone)]
pub struct RawOutput {
    pub shape: Vec<usize>,
    pub data: Vec<f32>,
}

/// Create an ONNX Runtime session with automatic execution provider selection.
///
/// `label` only names the model in logs.
pub fn create_session(model_path: &Path, label: &str) -> VisionResult<Session> {
    if !model_path.exists() {
        return Err(VisionError::model_not_found(model_path));
    }

    let model_bytes = std::fs::read(model_path)?;

    let builder = Session::builder()
        .map_err(|e| VisionError::model_load(format!("Failed to create session builder: {}", e)))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| VisionError::model_load(format!("Failed to set optimization level: {}", e)))?;

    #[cfg(all(target_os = "linux", feature = "cuda"))]
    {
        use ort::execution_providers::CUDAExecutionProvider;
        if let Ok(cuda_builder) = builder
            .clone()
            .with_execution_providers([CUDAExecutionProvider::default().build()])
        {
            if let Ok(session) = cuda_builder.commit_from_memory(&model_bytes) {
                info!(model = label, "Using CUDA execution provider");
                return Ok(session);
            }
        }
        debug!(model = label, "CUDA execution provider not available, trying alternatives");
    }

    #[cfg(target_os = "macos")]
    {
        use ort::execution_providers::CoreMLExecutionProvider;
        if let Ok(coreml_builder) = builder
            .clone()
            .with_execution_providers([CoreMLExecutionProvider::default().build()])
        {
            if let Ok(session) = coreml_builder.commit_from_memory(&model_bytes) {
                info!(model = label, "Using CoreML execution provider");
                return Ok(session);
            }
        }
        debug!(model = label, "CoreML execution provider not available, using CPU");
    }

    info!(model = label, path = %model_path.display(), "Using CPU execution provider");
    builder
        .commit_from_memory(&model_bytes)
        .map_err(|e| VisionError::model_load(format!("Failed to load ONNX model: {}", e)))
}

/// Build an NCHW input tensor.
pub fn input_tensor(shape: Vec<usize>, data: Vec<f32>) -> VisionResult<Value> {
    Tensor::from_array((shape, data.into_boxed_slice()))
        .map(Value::from)
        .map_err(|e| VisionError::inference(format!("Failed to create tensor: {}", e)))
}

/// Run a single-input model and copy out `output0`.
pub fn run_single(session: &Mutex<Session>, input: Value) -> VisionResult<RawOutput> {
    let mut session = session
        .lock()
        .map_err(|_| VisionError::internal("Session lock poisoned"))?;

    let outputs = session
        .run(ort::inputs![input])
        .map_err(|e| VisionError::inference(format!("ONNX inference failed: {}", e)))?;

    let output = outputs
        .get("output0")
        .ok_or_else(|| VisionError::invalid_output("Missing output0 tensor"))?;

    let (shape, data) = output
        .try_extract_tensor::<f32>()
        .map_err(|e| VisionError::invalid_output(format!("Failed to extract tensor: {}", e)))?;

    let shape: Vec<usize> = shape.iter().map(|&d| d.max(0) as usize).collect();
    debug!(shape = ?shape, "Model output extracted");

    Ok(RawOutput {
        shape,
        data: data.to_vec(),
    })
}

impl RawOutput {
    /// Interpret a YOLO head output `[1, features, anchors]`.
    ///
    /// Returns `(features, anchors)` after checking the data length.
    pub fn yolo_dims(&self) -> VisionResult<(usize, usize)> {
        let (features, anchors) = match self.shape.as_slice() {
            [1, features, anchors] => (*features, *anchors),
            other => {
                return Err(VisionError::invalid_output(format!(
                    "Expected [1, features, anchors], got {:?}",
                    other
                )))
            }
        };

        if features * anchors != self.data.len() {
            return Err(VisionError::invalid_output(format!(
                "Unexpected output size: expected {}, got {}",
                features * anchors,
                self.data.len()
            )));
        }

        Ok((features, anchors))
    }
}
