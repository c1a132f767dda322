use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use super::health;
use super::middleware::{logging_middleware, metrics_middleware};
use super::predict;
use super::state::AppState;

/// Create the full router with application state.
///
/// Cross-origin requests are unrestricted: any origin, method, and header.
pub fn create_router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/", get(health::root))
        .route("/predict", post(predict::predict))
        // Health endpoints
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        .route_layer(middleware::from_fn(metrics_middleware))
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(middleware::from_fn(logging_middleware))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::very_permissive())
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::api::upload::INVALID_FILE_TYPE;
    use crate::domain::classifier::mock::StaticClassifier;
    use crate::domain::classifier::MockModelLoader;
    use crate::domain::image::fixtures::png_bytes;
    use crate::domain::{CropDiseaseRegistry, CropModel, LabelSet, RemedyCatalog};
    use crate::infrastructure::model_cache::DiseaseModelCache;
    use crate::infrastructure::services::{fixtures, DiagnosisService};

    const BOUNDARY: &str = "leaf-upload-boundary";
    const LIMIT: usize = 1024 * 1024;

    fn app(service: DiagnosisService) -> Router {
        create_router(AppState::new(Arc::new(service)), LIMIT)
    }

    fn multipart(field: &str, file_name: &str, content_type: &str, data: &[u8]) -> Vec<u8> {
        multipart_parts(&[(field, file_name, content_type, data)])
    }

    fn multipart_parts(parts: &[(&str, &str, &str, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (field, file_name, content_type, data) in parts {
            body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
            body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                    field, file_name
                )
                .as_bytes(),
            );
            body.extend_from_slice(
                format!("Content-Type: {}\r\n\r\n", content_type).as_bytes(),
            );
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    fn predict_request(body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/predict")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    fn leaf_png() -> Vec<u8> {
        png_bytes(48, 48, [60, 140, 50])
    }

    #[tokio::test]
    async fn test_root_returns_service_info() {
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();

        let (status, json) = send(app(fixtures::service("Corn", 0, 0.5)), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Crop Disease Classifier API");
    }

    #[tokio::test]
    async fn test_root_does_not_touch_models() {
        let mut loader = MockModelLoader::new();
        loader.expect_load().never();
        let crop = Arc::new(StaticClassifier::new("allcrop", vec![1.0]));
        let service = DiagnosisService::new(
            crop.clone(),
            LabelSet::new(["Corn"]).unwrap(),
            Arc::new(CropDiseaseRegistry::default()),
            Arc::new(DiseaseModelCache::new(Arc::new(loader), 1)),
            Arc::new(RemedyCatalog::new()),
        );
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();

        let (status, _) = send(app(service), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(crop.calls(), 0);
    }

    #[tokio::test]
    async fn test_text_upload_rejected() {
        let body = multipart("file", "notes.txt", "text/plain", b"just some notes");

        let (status, json) =
            send(app(fixtures::service("Corn", 1, 0.8)), predict_request(body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["detail"], INVALID_FILE_TYPE);
        assert_eq!(json["type"], "invalid_request_error");
    }

    #[tokio::test]
    async fn test_corn_common_rust_end_to_end() {
        let body = multipart("file", "corn.png", "image/png", &leaf_png());

        let (status, json) =
            send(app(fixtures::service("Corn", 1, 0.87)), predict_request(body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["crop"], "Corn");
        assert_eq!(json["disease"], "Common Rust");
        assert_eq!(json["confidence"].as_f64().unwrap() as f32, 0.87);
        assert!(!json["remedy"].as_str().unwrap().is_empty());
        assert!(!json["preventiveMeasures"].as_array().unwrap().is_empty());
        assert_eq!(json["Ref_images"]["early"], "/src/images/rust_early.jpg");
        assert!(!json["timestamp"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_field_wins_over_earlier_attachment() {
        let image = leaf_png();
        let body = multipart_parts(&[
            ("notes", "notes.txt", "text/plain", &b"field observations"[..]),
            ("file", "corn.png", "image/png", &image[..]),
        ]);

        let (status, json) =
            send(app(fixtures::service("Corn", 1, 0.87)), predict_request(body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["crop"], "Corn");
        assert_eq!(json["disease"], "Common Rust");
    }

    #[tokio::test]
    async fn test_first_attachment_used_without_file_field() {
        let image = leaf_png();
        let body = multipart_parts(&[
            ("photo", "leaf.png", "image/png", &image[..]),
            ("notes", "notes.txt", "text/plain", &b"field observations"[..]),
        ]);

        let (status, json) =
            send(app(fixtures::service("Wheat", 2, 0.7)), predict_request(body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["disease"], "wheat_stripe_rust");
    }

    #[tokio::test]
    async fn test_tomato_healthy_end_to_end() {
        let body = multipart("file", "tomato.png", "image/png", &leaf_png());

        let (status, json) =
            send(app(fixtures::service("Tomato", 8, 0.93)), predict_request(body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["crop"], "Tomato");
        assert_eq!(json["disease"], "tomato_healthy");
        assert_eq!(json["remedy"], "");
        assert_eq!(json["identification"], "");
        assert_eq!(json["preventiveMeasures"], serde_json::json!([]));
        assert_eq!(json["Ref_images"], serde_json::json!({}));
        let confidence = json["confidence"].as_f64().unwrap();
        assert!((0.0..=1.0).contains(&confidence));
    }

    #[tokio::test]
    async fn test_raw_image_body_accepted() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/predict")
            .header(header::CONTENT_TYPE, "image/png")
            .body(Body::from(leaf_png()))
            .unwrap();

        let (status, json) = send(app(fixtures::service("Wheat", 2, 0.7)), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["crop"], "Wheat");
        assert_eq!(json["disease"], "wheat_stripe_rust");
    }

    #[tokio::test]
    async fn test_raw_body_without_image_type_rejected() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/predict")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();

        let (status, json) = send(app(fixtures::service("Corn", 0, 0.5)), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["detail"], INVALID_FILE_TYPE);
    }

    #[tokio::test]
    async fn test_missing_file_field() {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{b}\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhello\r\n--{b}--\r\n",
                b = BOUNDARY
            )
            .as_bytes(),
        );

        let (status, json) =
            send(app(fixtures::service("Corn", 0, 0.5)), predict_request(body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["detail"], "No file uploaded");
    }

    #[tokio::test]
    async fn test_corrupt_image_is_bad_request() {
        let body = multipart("file", "leaf.jpg", "image/jpeg", b"\xff\xd8\xff\xe0 truncated");

        let (status, json) =
            send(app(fixtures::service("Corn", 0, 0.5)), predict_request(body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["detail"].as_str().unwrap().contains("not a valid image"));
    }

    #[tokio::test]
    async fn test_unregistered_crop_is_not_found() {
        let registry = CropDiseaseRegistry::new(vec![CropModel::new(
            "Corn",
            Path::new("/models/corn.onnx"),
            LabelSet::new(["Healthy"]).unwrap(),
        )])
        .unwrap();
        let mut loader = MockModelLoader::new();
        loader.expect_load().never();
        let service = DiagnosisService::new(
            Arc::new(StaticClassifier::new("allcrop", vec![0.1, 0.9])),
            LabelSet::new(["Corn", "Soybean"]).unwrap(),
            Arc::new(registry),
            Arc::new(DiseaseModelCache::new(Arc::new(loader), 1)),
            Arc::new(RemedyCatalog::builtin()),
        );
        let body = multipart("file", "leaf.png", "image/png", &leaf_png());

        let (status, json) = send(app(service), predict_request(body)).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["detail"], "No disease model found for crop 'Soybean'.");
    }

    #[tokio::test]
    async fn test_body_over_limit_rejected() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/predict")
            .header(header::CONTENT_TYPE, "image/png")
            .body(Body::from(vec![0u8; LIMIT + 1]))
            .unwrap();

        let (status, _) = send(app(fixtures::service("Corn", 0, 0.5)), request).await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_ready_reports_models() {
        let request = Request::builder().uri("/ready").body(Body::empty()).unwrap();

        let (status, json) = send(app(fixtures::service("Corn", 0, 0.5)), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["checks"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_cors_allows_any_origin() {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/predict")
            .header(header::ORIGIN, "http://localhost:5173")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .unwrap();

        let response = app(fixtures::service("Corn", 0, 0.5))
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:5173"
        );
    }

    #[tokio::test]
    async fn test_request_id_propagated() {
        let request = Request::builder()
            .uri("/live")
            .header("x-request-id", "trace-me")
            .body(Body::empty())
            .unwrap();

        let response = app(fixtures::service("Corn", 0, 0.5))
            .oneshot(request)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("x-request-id").unwrap(), "trace-me");
    }
}
