//! API integration tests.

use std::io::Cursor;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use babyscale_api::{create_router, ApiConfig, AppState};
use babyscale_models::{BoundingBox, Detection, DetectionSet, Keypoint, Pose, COCO_KEYPOINT_COUNT};
use babyscale_vision::{
    MeasurementConfig, MeasurementPipeline, ModelRegistry, ObjectDetector, PoseEstimator, VisionConfig, VisionError,
    VisionResult,
};
use image::{DynamicImage, GrayImage, ImageOutputFormat, Luma, Rgb, RgbImage};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "babyscale-test-boundary";

struct FixedDetector(DetectionSet);

impl ObjectDetector for FixedDetector {
    fn detect(&self, _image: &RgbImage) -> VisionResult<DetectionSet> {
        Ok(self.0.clone())
    }
}

struct BrokenDetector;

impl ObjectDetector for BrokenDetector {
    fn detect(&self, _image: &RgbImage) -> VisionResult<DetectionSet> {
        Err(VisionError::inference("output tensor missing"))
    }
}

struct FixedPose(Option<Pose>);

impl PoseEstimator for FixedPose {
    fn estimate(&self, _image: &RgbImage) -> VisionResult<Option<Pose>> {
        Ok(self.0.clone())
    }
}

fn coin() -> DetectionSet {
    DetectionSet::new(vec![Detection::new(BoundingBox::new(60.0, 60.0, 60.0, 60.0), 0, 0.8)])
}

fn infant() -> Pose {
    let mut keypoints = [Keypoint::undefined(); COCO_KEYPOINT_COUNT];
    keypoints[0] = Keypoint::new(200.0, 20.0, 0.9);
    keypoints[5] = Keypoint::new(210.0, 60.0, 0.9);
    keypoints[15] = Keypoint::new(200.0, 220.0, 0.9);
    Pose::new(keypoints, BoundingBox::new(205.0, 120.0, 60.0, 210.0), 0.9)
}

/// PNG of a dark scene with a bright coin of radius 20 at (60, 60).
fn scene_png() -> Vec<u8> {
    let scene = RgbImage::from_fn(320, 240, |x, y| {
        if (x as f64 - 60.0).hypot(y as f64 - 60.0) <= 20.0 {
            Rgb([210, 200, 160])
        } else {
            Rgb([30, 30, 40])
        }
    });
    encode_png(DynamicImage::ImageRgb8(scene))
}

fn encode_png(image: DynamicImage) -> Vec<u8> {
    let mut buf = Vec::new();
    image.write_to(&mut Cursor::new(&mut buf), ImageOutputFormat::Png).unwrap();
    buf
}

struct TestApp {
    router: Router,
    upload_dir: TempDir,
}

async fn app_with(detector: impl ObjectDetector + 'static, pose: Option<Pose>) -> TestApp {
    let pipeline = MeasurementPipeline::new(
        Arc::new(detector),
        Arc::new(FixedPose(pose)),
        MeasurementConfig::default(),
    );
    app_with_registry(ModelRegistry::preloaded(pipeline)).await
}

async fn app_with_registry(registry: ModelRegistry) -> TestApp {
    app_with_environment(registry, "development").await
}

async fn app_with_environment(registry: ModelRegistry, environment: &str) -> TestApp {
    let upload_dir = TempDir::new().unwrap();
    let config = ApiConfig {
        upload_dir: upload_dir.path().to_path_buf(),
        environment: environment.to_string(),
        ..ApiConfig::default()
    };
    let state = AppState::with_registry(config, registry).await.unwrap();

    TestApp {
        router: create_router(state, None),
        upload_dir,
    }
}

fn multipart_request(field: &str, content_type: &str, bytes: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"baby.jpg\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/predict-babyheight")
        .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
        .body(Body::from(body))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn upload_dir_files(dir: &TempDir) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_root_greeting() {
    let app = app_with(FixedDetector(coin()), Some(infant())).await;

    let response = app.router.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert!(body["message"].as_str().unwrap().contains("Hello"));
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = app_with(FixedDetector(coin()), Some(infant())).await;

    let response = app.router.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
}

#[tokio::test]
async fn test_predict_success_and_fetch_result() {
    let app = app_with(FixedDetector(coin()), Some(infant())).await;

    let response = app
        .router
        .clone()
        .oneshot(multipart_request("image", "image/jpeg", &scene_png()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "success");

    // 200 px nose-to-ankle with a coin diameter of 40 +/- 2 px
    let height = body["predicted_height_cm"].as_f64().unwrap();
    assert!(height > 200.0 * 2.7 / 42.0 - 0.01 && height < 200.0 * 2.7 / 38.0 + 0.01);
    assert_eq!((height * 100.0).round() / 100.0, height);

    let url = body["annotated_image_url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/result-image/") && url.ends_with("_out.jpg"));

    // the upload is gone, only the result remains
    let files = upload_dir_files(&app.upload_dir);
    assert_eq!(files.len(), 1);
    assert!(files[0].ends_with("_out.jpg"));

    let response = app.router.oneshot(get(&url)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
}

#[tokio::test]
async fn test_predict_rejects_non_image() {
    let app = app_with(FixedDetector(coin()), Some(infant())).await;

    let response = app
        .router
        .oneshot(multipart_request("image", "text/plain", b"hello"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert_eq!(body["error"], "File must be an image.");
    assert!(upload_dir_files(&app.upload_dir).is_empty());
}

#[tokio::test]
async fn test_predict_requires_image_field() {
    let app = app_with(FixedDetector(coin()), Some(infant())).await;

    let response = app
        .router
        .oneshot(multipart_request("photo", "image/jpeg", &scene_png()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_predict_rejects_non_multipart() {
    let app = app_with(FixedDetector(coin()), Some(infant())).await;

    let request = Request::builder()
        .method("POST")
        .uri("/predict-babyheight")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();
    let response = app.router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(json_body(response).await["error"].is_string());
}

#[tokio::test]
async fn test_predict_grayscale_is_unprocessable() {
    let app = app_with(FixedDetector(coin()), Some(infant())).await;
    let gray = encode_png(DynamicImage::ImageLuma8(GrayImage::from_pixel(64, 64, Luma([120]))));

    let response = app
        .router
        .oneshot(multipart_request("image", "image/png", &gray))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(json_body(response).await["error"].is_string());
    assert!(upload_dir_files(&app.upload_dir).is_empty());
}

#[tokio::test]
async fn test_predict_undecodable_is_unprocessable() {
    let app = app_with(FixedDetector(coin()), Some(infant())).await;

    let response = app
        .router
        .oneshot(multipart_request("image", "image/jpeg", b"not really a jpeg"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_predict_without_person_is_unprocessable() {
    let app = app_with(FixedDetector(coin()), None).await;

    let response = app
        .router
        .oneshot(multipart_request("image", "image/jpeg", &scene_png()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(upload_dir_files(&app.upload_dir).is_empty());
}

#[tokio::test]
async fn test_predict_without_coin_is_unprocessable() {
    let app = app_with(FixedDetector(DetectionSet::default()), Some(infant())).await;

    let response = app
        .router
        .oneshot(multipart_request("image", "image/jpeg", &scene_png()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_predict_inference_failure_is_server_error() {
    let app = app_with(BrokenDetector, Some(infant())).await;

    let response = app
        .router
        .oneshot(multipart_request("image", "image/jpeg", &scene_png()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json_body(response).await["error"].is_string());
    assert!(upload_dir_files(&app.upload_dir).is_empty());
}

fn broken_registry() -> ModelRegistry {
    ModelRegistry::preloaded(MeasurementPipeline::new(
        Arc::new(BrokenDetector),
        Arc::new(FixedPose(Some(infant()))),
        MeasurementConfig::default(),
    ))
}

#[tokio::test]
async fn test_server_error_detail_shown_outside_production() {
    let app = app_with_environment(broken_registry(), "development").await;

    let response = app
        .router
        .oneshot(multipart_request("image", "image/jpeg", &scene_png()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(response).await["error"],
        "Inference failed: output tensor missing"
    );
}

#[tokio::test]
async fn test_server_error_redacted_in_production() {
    let app = app_with_environment(broken_registry(), "production").await;

    let response = app
        .router
        .oneshot(multipart_request("image", "image/jpeg", &scene_png()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    assert_eq!(json_body(response).await["error"], "An internal error occurred");
    assert!(upload_dir_files(&app.upload_dir).is_empty());
}

#[tokio::test]
async fn test_client_errors_not_redacted_in_production() {
    let app = app_with_environment(broken_registry(), "production").await;

    let response = app
        .router
        .oneshot(multipart_request("image", "text/plain", b"hello"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "File must be an image.");
}

#[tokio::test]
async fn test_predict_with_missing_models_is_server_error() {
    let models = TempDir::new().unwrap();
    let registry = ModelRegistry::new(VisionConfig::with_models(
        models.path().join("coin.onnx"),
        models.path().join("pose.onnx"),
    ));
    let app = app_with_registry(registry).await;

    let response = app
        .router
        .oneshot(multipart_request("image", "image/jpeg", &scene_png()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(upload_dir_files(&app.upload_dir).is_empty());
}

#[tokio::test]
async fn test_result_image_not_found() {
    let app = app_with(FixedDetector(coin()), Some(infant())).await;

    let response = app.router.oneshot(get("/result-image/missing_out.jpg")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["error"], "Image not found.");
}

#[tokio::test]
async fn test_result_image_rejects_traversal() {
    let app = app_with(FixedDetector(coin()), Some(infant())).await;

    let response = app.router.oneshot(get("/result-image/..%2Fsecret.jpg")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_ready_with_loaded_models() {
    let app = app_with(FixedDetector(coin()), Some(infant())).await;

    let response = app.router.oneshot(get("/ready")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["checks"]["models"]["status"], "ok");
}

#[tokio::test]
async fn test_ready_with_missing_models() {
    let models = TempDir::new().unwrap();
    let registry = ModelRegistry::new(VisionConfig::with_models(
        models.path().join("coin.onnx"),
        models.path().join("pose.onnx"),
    ));
    let app = app_with_registry(registry).await;

    let response = app.router.oneshot(get("/ready")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = json_body(response).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["checks"]["models"]["status"], "error");
}

#[tokio::test]
async fn test_metrics_route_absent_when_disabled() {
    let app = app_with(FixedDetector(coin()), Some(infant())).await;

    let response = app.router.oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
