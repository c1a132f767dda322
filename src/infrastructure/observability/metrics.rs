//! Prometheus metrics infrastructure

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, response::IntoResponse, routing::get, Router};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::config::MetricsConfig;

/// Prometheus metrics handle for serving metrics endpoint
#[derive(Clone)]
pub struct PrometheusMetrics {
    handle: Arc<PrometheusHandle>,
}

impl PrometheusMetrics {
    fn from_handle(handle: PrometheusHandle) -> Self {
        Self {
            handle: Arc::new(handle),
        }
    }

    /// Get the metrics as a string for the /metrics endpoint
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Initialize Prometheus metrics
pub fn init_metrics(config: &MetricsConfig) -> Option<PrometheusMetrics> {
    if !config.enabled {
        tracing::info!("Prometheus metrics disabled");
        return None;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            gauge!("crop_disease_gateway_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);

            tracing::info!("Prometheus metrics initialized at {}", config.path);

            Some(PrometheusMetrics::from_handle(handle))
        }
        Err(e) => {
            tracing::error!("Failed to initialize Prometheus metrics: {}", e);
            None
        }
    }
}

/// Create the metrics router
pub fn create_metrics_router(metrics: PrometheusMetrics, path: &str) -> Router {
    Router::new()
        .route(path, get(metrics_handler))
        .with_state(metrics)
}

async fn metrics_handler(State(metrics): State<PrometheusMetrics>) -> impl IntoResponse {
    metrics.render()
}

/// Record an HTTP request metric. `path` should be the matched route.
pub fn record_http_request(method: &str, path: Option<&str>, status: u16, duration: Duration) {
    let labels = [
        ("method", method.to_string()),
        ("path", path_label(path)),
        ("status", status.to_string()),
    ];

    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(duration.as_secs_f64());

    if status >= 500 {
        counter!("http_server_errors_total", &labels).increment(1);
    }
}

/// Record one model forward pass (`stage` is `crop` or `disease`)
pub fn record_inference(stage: &'static str, duration: Duration) {
    histogram!("model_inference_duration_seconds", "stage" => stage)
        .record(duration.as_secs_f64());
}

/// Record a disease model load attempt
pub fn record_model_load(crop: &str, success: bool) {
    let outcome = if success { "success" } else { "error" };
    counter!("model_loads_total", "crop" => crop.to_string(), "outcome" => outcome).increment(1);
}

/// Record a completed diagnosis
pub fn record_diagnosis(crop: &str, disease: &str) {
    counter!(
        "diagnoses_total",
        "crop" => crop.to_string(),
        "disease" => disease.to_string()
    )
    .increment(1);
}

/// Unmatched paths collapse into one label to bound cardinality
fn path_label(path: Option<&str>) -> String {
    path.unwrap_or("unmatched").to_string()
}
