//! Root greeting.

use axum::Json;
use babyscale_models::MessageResponse;

/// `GET /`
pub async fn root() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Hello from the baby length measurement API!".to_string(),
    })
}
