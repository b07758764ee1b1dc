//! Axum HTTP API for infant length measurement.
//!
//! This crate provides:
//! - Photo upload and measurement (`POST /predict-babyheight`)
//! - Annotated result retrieval (`GET /result-image/{filename}`)
//! - Liveness/readiness probes and Prometheus metrics
//! - Per-client rate limiting and security headers

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::ResultSweeper;
pub use state::AppState;
