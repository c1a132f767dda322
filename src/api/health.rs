//! Info and health check endpoints

use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use super::state::AppState;
use super::types::ServiceInfo;

/// Detailed health response with component status
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checks: Option<Vec<HealthCheck>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

/// Health check status
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Individual component health check
#[derive(Serialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// GET / - fixed service banner, independent of model state
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::default())
}

/// Simple health check - returns 200 if the service is running
pub async fn health_check() -> impl IntoResponse {
    let response = HealthResponse {
        status: HealthStatus::Healthy,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: None,
        latency_ms: None,
    };

    (StatusCode::OK, Json(response))
}

/// Liveness check
pub async fn live_check() -> impl IntoResponse {
    StatusCode::OK
}

/// Readiness check reporting model and registry state
pub async fn ready_check(State(state): State<AppState>) -> impl IntoResponse {
    let start = Instant::now();
    let status = state.diagnosis_service.model_status();

    let registry = if status.registered_crops > 0 {
        HealthCheck {
            name: "disease_registry".to_string(),
            status: HealthStatus::Healthy,
            message: Some(format!("{} crops registered", status.registered_crops)),
        }
    } else {
        HealthCheck {
            name: "disease_registry".to_string(),
            status: HealthStatus::Unhealthy,
            message: Some("no disease models registered".to_string()),
        }
    };

    let checks = vec![
        HealthCheck {
            name: "crop_model".to_string(),
            status: HealthStatus::Healthy,
            message: Some(status.crop_model),
        },
        registry,
        HealthCheck {
            name: "disease_model_cache".to_string(),
            status: HealthStatus::Healthy,
            message: Some(if status.cache_enabled {
                format!("{} models cached", status.cached_disease_models)
            } else {
                "disabled".to_string()
            }),
        },
    ];

    let overall_status = if checks.iter().any(|c| c.status == HealthStatus::Unhealthy) {
        HealthStatus::Unhealthy
    } else {
        HealthStatus::Healthy
    };

    let response = HealthResponse {
        status: overall_status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: Some(checks),
        latency_ms: Some(start.elapsed().as_millis() as u64),
    };

    let status_code = match overall_status {
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::OK,
    };

    (status_code, Json(response))
}
