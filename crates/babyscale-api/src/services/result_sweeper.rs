//! Background removal of expired result images.
//!
//! Annotated results are kept in the upload directory so clients can fetch
//! them after the prediction response. When a retention period is configured
//! this service periodically deletes results older than it.

use std::path::PathBuf;
use std::time::Duration;

use tokio::time::interval;
use tracing::{debug, error, info, warn};

use crate::config::ApiConfig;
use crate::metrics;

/// Suffix of annotated result files.
pub const RESULT_SUFFIX: &str = "_out.jpg";

/// Result retention sweeper.
pub struct ResultSweeper {
    dir: PathBuf,
    ttl: Duration,
    interval: Duration,
}

impl ResultSweeper {
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration, interval: Duration) -> Self {
        Self {
            dir: dir.into(),
            ttl,
            interval,
        }
    }

    /// Sweeper for the configured retention, or `None` when results never expire.
    pub fn from_config(config: &ApiConfig) -> Option<Self> {
        config
            .result_ttl
            .map(|ttl| Self::new(&config.upload_dir, ttl, config.result_sweep_interval))
    }

    /// Start the background sweep loop.
    ///
    /// This function runs indefinitely and should be spawned as a background task.
    pub async fn run(&self) {
        info!(
            dir = %self.dir.display(),
            ttl_secs = self.ttl.as_secs(),
            interval_secs = self.interval.as_secs(),
            "Starting result sweeper"
        );

        let mut ticker = interval(self.interval);

        loop {
            ticker.tick().await;

            match self.sweep_once().await {
                Ok(0) => {}
                Ok(removed) => info!(removed, "Expired result images removed"),
                Err(e) => error!(error = %e, "Result sweep failed"),
            }
        }
    }

    /// Run a single sweep, returning how many files were removed.
    pub async fn sweep_once(&self) -> std::io::Result<u64> {
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        let mut removed = 0u64;

        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !name.ends_with(RESULT_SUFFIX) {
                continue;
            }

            let meta = entry.metadata().await?;
            if !meta.is_file() {
                continue;
            }
            let expired = meta
                .modified()
                .ok()
                .and_then(|t| t.elapsed().ok())
                .is_some_and(|age| age >= self.ttl);
            if !expired {
                continue;
            }

            match tokio::fs::remove_file(entry.path()).await {
                Ok(()) => {
                    debug!(file = name, "Removed expired result");
                    removed += 1;
                }
                Err(e) => warn!(file = name, error = %e, "Failed to remove expired result"),
            }
        }

        metrics::record_results_swept(removed);
        Ok(removed)
    }
}
