//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use babyscale_models::ErrorResponse;
use babyscale_vision::VisionError;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

/// Returned when the pipeline produced no measurement.
pub const UNMEASURABLE_MESSAGE: &str = "Could not measure the baby's length from this image.";

/// Replaces internal error details in production.
pub const REDACTED_MESSAGE: &str = "An internal error occurred";

/// Response extension marking a body rendered from an internal error.
///
/// [`crate::middleware::redact_internal_errors`] swaps such bodies for
/// [`REDACTED_MESSAGE`] when the server runs in production.
#[derive(Debug, Clone, Copy)]
pub struct InternalErrorMarker;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unprocessable(String),

    #[error("{0}")]
    Internal(String),

    #[error(transparent)]
    Vision(#[from] VisionError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn unprocessable(msg: impl Into<String>) -> Self {
        Self::Unprocessable(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// The generic "no result" error.
    pub fn unmeasurable() -> Self {
        Self::unprocessable(UNMEASURABLE_MESSAGE)
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) | ApiError::Vision(_) | ApiError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn is_internal(&self) -> bool {
        self.status_code() == StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let internal = self.is_internal();
        if internal {
            tracing::error!(error = %self, "Request failed");
        }

        let mut response = (status, Json(ErrorResponse { error: self.to_string() })).into_response();
        if internal {
            response.extensions_mut().insert(InternalErrorMarker);
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::bad_request("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::unmeasurable().status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            ApiError::from(VisionError::inference("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_errors_are_marked() {
        let response = ApiError::from(VisionError::inference("boom")).into_response();
        assert!(response.extensions().get::<InternalErrorMarker>().is_some());

        let response = ApiError::unmeasurable().into_response();
        assert!(response.extensions().get::<InternalErrorMarker>().is_none());
    }

    #[test]
    fn test_message_is_bare() {
        assert_eq!(ApiError::not_found("Image not found.").to_string(), "Image not found.");
        assert_eq!(
            ApiError::from(VisionError::inference("boom")).to_string(),
            "Inference failed: boom"
        );
    }
}
