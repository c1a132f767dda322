//! Infrastructure layer - Model runtime, caching, logging, and metrics

pub mod logging;
pub mod model_cache;
pub mod observability;
pub mod onnx;
pub mod services;
