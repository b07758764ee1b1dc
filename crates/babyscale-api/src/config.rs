//! API configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use babyscale_vision::{VisionConfig, COIN_DIAMETER_CM};

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Rate limit requests per second (per client IP, prediction route)
    pub rate_limit_rps: u32,
    /// Max request body size
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    /// Where uploads and annotated results are written
    pub upload_dir: PathBuf,
    /// Coin detector ONNX model
    pub coin_model_path: PathBuf,
    /// Pose estimator ONNX model
    pub pose_model_path: PathBuf,
    /// Physical diameter of the reference coin
    pub coin_diameter_cm: f64,
    /// Result images older than this are deleted; `None` keeps them forever
    pub result_ttl: Option<Duration>,
    /// How often expired results are swept
    pub result_sweep_interval: Duration,
    /// Expose Prometheus metrics at /metrics
    pub metrics_enabled: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            rate_limit_rps: 10,
            max_body_size: 10 * 1024 * 1024, // 10MB
            environment: "development".to_string(),
            upload_dir: PathBuf::from("/tmp/uploads"),
            coin_model_path: PathBuf::from("models/coin/yolo11s.onnx"),
            pose_model_path: PathBuf::from("models/keypoints/yolo11s-pose.onnx"),
            coin_diameter_cm: COIN_DIAMETER_CM,
            result_ttl: None,
            result_sweep_interval: Duration::from_secs(600),
            metrics_enabled: true,
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: parse_env("API_PORT").unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            rate_limit_rps: parse_env("RATE_LIMIT_RPS").unwrap_or(defaults.rate_limit_rps),
            max_body_size: parse_env("MAX_BODY_SIZE").unwrap_or(defaults.max_body_size),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            upload_dir: std::env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            coin_model_path: std::env::var("COIN_MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.coin_model_path),
            pose_model_path: std::env::var("POSE_MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.pose_model_path),
            coin_diameter_cm: parse_env::<f64>("COIN_DIAMETER_CM")
                .filter(|d| d.is_finite() && *d > 0.0)
                .unwrap_or(defaults.coin_diameter_cm),
            result_ttl: parse_env::<u64>("RESULT_TTL_SECS").map(Duration::from_secs),
            result_sweep_interval: parse_env::<u64>("RESULT_SWEEP_INTERVAL_SECS")
                .filter(|s| *s > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.result_sweep_interval),
            metrics_enabled: std::env::var("METRICS_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.metrics_enabled),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }

    /// Model and measurement settings for the vision pipeline.
    pub fn vision_config(&self) -> VisionConfig {
        VisionConfig::with_models(&self.coin_model_path, &self.pose_model_path)
            .with_coin_diameter_cm(self.coin_diameter_cm)
    }
}

fn parse_env<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}
