//! Height prediction from an uploaded photo.

use std::path::{Path, PathBuf};

use axum::extract::multipart::{Field, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::Json;
use babyscale_models::PredictionResponse;
use babyscale_vision::MeasurementOutcome;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// Multipart field carrying the photo.
pub const IMAGE_FIELD: &str = "image";

const NOT_AN_IMAGE: &str = "File must be an image.";

/// Route prefix for annotated results.
pub const RESULT_IMAGE_ROUTE: &str = "/result-image";

/// `POST /predict-babyheight`
///
/// Stores the upload under a fresh id, runs the measurement pipeline on the
/// blocking pool, and always removes the upload afterwards. The annotated
/// result stays in the upload directory for `GET /result-image/{filename}`.
pub async fn predict_babyheight(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<PredictionResponse>> {
    let result = predict(&state, multipart).await;

    metrics::record_prediction(match &result {
        Ok(_) => "success",
        Err(ApiError::BadRequest(_)) => "rejected",
        Err(ApiError::Unprocessable(_)) => "unmeasurable",
        Err(_) => "error",
    });

    result.map(Json)
}

async fn predict(
    state: &AppState,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<PredictionResponse> {
    let mut multipart = multipart.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let bytes = read_image_field(&mut multipart).await?;
    metrics::record_upload_bytes(bytes.len());

    let file_id = Uuid::new_v4();
    let input_path = state.config.upload_dir.join(format!("{}.jpg", file_id));
    let output_path = state.config.upload_dir.join(format!("{}_out.jpg", file_id));

    tokio::fs::write(&input_path, &bytes).await?;
    debug!(file_id = %file_id, bytes = bytes.len(), "Upload stored");

    let outcome = measure(state, input_path.clone(), output_path).await;
    remove_upload(&input_path).await;

    match outcome? {
        MeasurementOutcome::Measured(m) => {
            let filename = m
                .output_path
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| ApiError::internal("Result path has no file name"))?;
            let url = format!("{}/{}", RESULT_IMAGE_ROUTE, filename);

            info!(file_id = %file_id, length_cm = m.length_cm, "Prediction completed");
            Ok(PredictionResponse::success(m.length_cm, url))
        }
        MeasurementOutcome::NoResult(reason) => {
            info!(file_id = %file_id, reason = %reason, "Prediction produced no result");
            Err(ApiError::unmeasurable())
        }
    }
}

/// Find the image field and read it, rejecting anything that is not `image/*`.
async fn read_image_field(multipart: &mut Multipart) -> ApiResult<Vec<u8>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.body_text()))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        if !is_image(&field) {
            return Err(ApiError::bad_request(NOT_AN_IMAGE));
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;
        return Ok(bytes.to_vec());
    }

    Err(ApiError::bad_request(NOT_AN_IMAGE))
}

fn is_image(field: &Field<'_>) -> bool {
    field
        .content_type()
        .map(|ct| ct.to_ascii_lowercase().starts_with("image/"))
        .unwrap_or(false)
}

async fn measure(state: &AppState, input: PathBuf, output: PathBuf) -> ApiResult<MeasurementOutcome> {
    let models = state.models.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        let pipeline = models.pipeline()?;
        pipeline.measure_all(&input, &output)
    })
    .await
    .map_err(|e| ApiError::internal(format!("Measurement task failed: {}", e)))??;

    Ok(outcome)
}

async fn remove_upload(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        warn!(path = %path.display(), error = %e, "Failed to remove upload");
    }
}
