//! Application state for shared services

use std::sync::Arc;

use bytes::Bytes;

use crate::domain::{DiagnosisResult, DomainError};

/// Application state containing shared services using dynamic dispatch
#[derive(Clone)]
pub struct AppState {
    pub diagnosis_service: Arc<dyn DiagnosisServiceTrait>,
}

impl AppState {
    pub fn new(diagnosis_service: Arc<dyn DiagnosisServiceTrait>) -> Self {
        Self { diagnosis_service }
    }
}

/// Snapshot of loaded models for readiness reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelStatus {
    pub crop_model: String,
    pub registered_crops: usize,
    pub cache_enabled: bool,
    pub cached_disease_models: u64,
}

/// Trait for the two-stage diagnosis pipeline
#[async_trait::async_trait]
pub trait DiagnosisServiceTrait: Send + Sync {
    async fn diagnose(&self, image: Bytes) -> Result<DiagnosisResult, DomainError>;
    fn model_status(&self) -> ModelStatus;
}
