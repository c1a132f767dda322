//! Observability infrastructure - Prometheus metrics

mod metrics;

pub use metrics::{
    create_metrics_router, init_metrics, record_diagnosis, record_http_request, record_inference,
    record_model_load, PrometheusMetrics,
};
