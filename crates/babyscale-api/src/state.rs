//! Application state.

use std::sync::Arc;

use anyhow::Context;
use babyscale_vision::ModelRegistry;
use tracing::info;

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub models: Arc<ModelRegistry>,
}

impl AppState {
    /// Create new application state.
    ///
    /// Models are not loaded here; the first prediction (or readiness probe)
    /// loads them.
    pub async fn new(config: ApiConfig) -> anyhow::Result<Self> {
        let models = ModelRegistry::new(config.vision_config());
        Self::with_registry(config, models).await
    }

    /// Create state around an existing model registry.
    pub async fn with_registry(config: ApiConfig, models: ModelRegistry) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(&config.upload_dir)
            .await
            .with_context(|| format!("Failed to create upload directory {}", config.upload_dir.display()))?;
        info!(upload_dir = %config.upload_dir.display(), "Upload directory ready");

        Ok(Self {
            config,
            models: Arc::new(models),
        })
    }
}
