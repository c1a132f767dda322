//! Two-stage crop and disease diagnosis pipeline

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use tracing::{debug, instrument};

use crate::api::state::{DiagnosisServiceTrait, ModelStatus};
use crate::domain::{
    classify, preprocess, CropDiseaseRegistry, DiagnosisResult, DomainError, ImageClassifier,
    ImageTensor, LabelSet, Prediction, PreprocessConfig, RemedyCatalog,
};
use crate::infrastructure::model_cache::DiseaseModelCache;
use crate::infrastructure::observability::{record_diagnosis, record_inference};

/// Immutable models and lookup tables shared by every request
#[derive(Debug)]
pub struct DiagnosisService {
    crop_classifier: Arc<dyn ImageClassifier>,
    crop_labels: LabelSet,
    registry: Arc<CropDiseaseRegistry>,
    disease_models: Arc<DiseaseModelCache>,
    remedies: Arc<RemedyCatalog>,
    preprocess: PreprocessConfig,
    apply_softmax: bool,
}

impl DiagnosisService {
    pub fn new(
        crop_classifier: Arc<dyn ImageClassifier>,
        crop_labels: LabelSet,
        registry: Arc<CropDiseaseRegistry>,
        disease_models: Arc<DiseaseModelCache>,
        remedies: Arc<RemedyCatalog>,
    ) -> Self {
        Self {
            crop_classifier,
            crop_labels,
            registry,
            disease_models,
            remedies,
            preprocess: PreprocessConfig::default(),
            apply_softmax: false,
        }
    }

    pub fn with_preprocess(mut self, preprocess: PreprocessConfig) -> Self {
        self.preprocess = preprocess;
        self
    }

    pub fn with_softmax(mut self, apply_softmax: bool) -> Self {
        self.apply_softmax = apply_softmax;
        self
    }

    pub fn registry(&self) -> &CropDiseaseRegistry {
        &self.registry
    }

    pub fn disease_models(&self) -> &DiseaseModelCache {
        &self.disease_models
    }

    pub fn crop_classifier(&self) -> &dyn ImageClassifier {
        self.crop_classifier.as_ref()
    }

    /// Decode -> preprocess -> crop -> resolve -> disease -> enrich.
    /// Any stage failure aborts the whole request.
    pub async fn diagnose(&self, image: Bytes) -> Result<DiagnosisResult, DomainError> {
        let config = self.preprocess;
        let tensor = run_blocking(move || preprocess(&image, &config)).await?;
        let tensor = Arc::new(tensor);

        let crop = self
            .run_stage(
                "crop",
                self.crop_classifier.clone(),
                self.crop_labels.clone(),
                tensor.clone(),
            )
            .await?;
        debug!(crop = %crop.label, confidence = crop.confidence, "Crop classified");

        let crop_model = self.registry.resolve(&crop.label)?;
        let disease_classifier = self.disease_models.get(crop_model).await?;

        let disease = self
            .run_stage(
                "disease",
                disease_classifier,
                crop_model.labels().clone(),
                tensor,
            )
            .await?;
        debug!(
            crop = %crop.label,
            disease = %disease.label,
            confidence = disease.confidence,
            "Disease classified"
        );

        let remedy = self.remedies.lookup(&crop.label, &disease.label);
        record_diagnosis(&crop.label, &disease.label);

        Ok(DiagnosisResult {
            crop: crop.label,
            crop_confidence: crop.confidence,
            disease: disease.label,
            confidence: disease.confidence,
            remedy,
            timestamp: Utc::now(),
        })
    }

    async fn run_stage(
        &self,
        stage: &'static str,
        model: Arc<dyn ImageClassifier>,
        labels: LabelSet,
        tensor: Arc<ImageTensor>,
    ) -> Result<Prediction, DomainError> {
        let apply_softmax = self.apply_softmax;
        let start = Instant::now();

        let prediction =
            run_blocking(move || classify(model.as_ref(), &labels, &tensor, apply_softmax)).await;

        record_inference(stage, start.elapsed());
        prediction
    }
}

#[async_trait]
impl DiagnosisServiceTrait for DiagnosisService {
    #[instrument(skip(self, image), fields(bytes = image.len()))]
    async fn diagnose(&self, image: Bytes) -> Result<DiagnosisResult, DomainError> {
        DiagnosisService::diagnose(self, image).await
    }

    fn model_status(&self) -> ModelStatus {
        ModelStatus {
            crop_model: self.crop_classifier.name().to_string(),
            registered_crops: self.registry.len(),
            cache_enabled: self.disease_models.is_enabled(),
            cached_disease_models: self.disease_models.cached_count(),
        }
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T, DomainError>
where
    F: FnOnce() -> Result<T, DomainError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| DomainError::internal(format!("blocking task failed: {}", e)))?
}
