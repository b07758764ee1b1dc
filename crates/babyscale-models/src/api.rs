//! HTTP response bodies.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Successful height prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PredictionResponse {
    /// Always "success"
    pub status: String,
    /// Estimated body length, rounded to two decimals
    pub predicted_height_cm: f64,
    /// Relative URL of the annotated JPEG
    pub annotated_image_url: String,
}

impl PredictionResponse {
    pub fn success(height_cm: f64, annotated_image_url: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            predicted_height_cm: round_to_cents(height_cm),
            annotated_image_url: annotated_image_url.into(),
        }
    }
}

/// Plain message body, used by the root endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Error body returned for every non-2xx response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Two-decimal rounding with halves going to the even digit.
fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_rounds_to_two_decimals() {
        let resp = PredictionResponse::success(52.34567, "/result-image/a_out.jpg");
        assert_eq!(resp.status, "success");
        assert!((resp.predicted_height_cm - 52.35).abs() < 1e-9);
    }

    #[test]
    fn test_prediction_rounds_halves_to_even() {
        assert_eq!(PredictionResponse::success(0.125, "").predicted_height_cm, 0.12);
        assert_eq!(PredictionResponse::success(0.375, "").predicted_height_cm, 0.38);
        assert_eq!(PredictionResponse::success(40.5, "").predicted_height_cm, 40.5);
        assert_eq!(PredictionResponse::success(-0.125, "").predicted_height_cm, -0.12);
    }

    #[test]
    fn test_prediction_json_shape() {
        let resp = PredictionResponse::success(10.0, "/result-image/x_out.jpg");
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["predicted_height_cm"], 10.0);
        assert_eq!(json["annotated_image_url"], "/result-image/x_out.jpg");
    }
}
