//! Crop Disease Gateway
//!
//! HTTP service that diagnoses plant diseases from leaf photos:
//! - A crop classifier picks the crop shown in the image
//! - A per-crop disease classifier picks the disease
//! - A remedy catalog enriches the result with treatment guidance

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use crate::config::AppConfig;

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use crate::api::state::AppState;
use crate::config::ModelsConfig;
use crate::domain::{
    builtin_crop_labels, CropDiseaseRegistry, CropModel, LabelSet, ModelLoader, PreprocessConfig,
    RemedyCatalog,
};
use crate::infrastructure::model_cache::DiseaseModelCache;
use crate::infrastructure::onnx::OnnxModelLoader;
use crate::infrastructure::services::DiagnosisService;

/// Create the application state with ONNX models from the configured directory
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let service = build_diagnosis_service(config, Arc::new(OnnxModelLoader)).await?;
    Ok(AppState::new(Arc::new(service)))
}

/// Wire the diagnosis pipeline: crop model, disease registry, model cache, remedies
pub async fn build_diagnosis_service(
    config: &AppConfig,
    loader: Arc<dyn ModelLoader>,
) -> anyhow::Result<DiagnosisService> {
    let models = &config.models;

    if models.preload_disease_models && !models.cache_disease_models {
        anyhow::bail!(
            "models.preload_disease_models requires models.cache_disease_models; \
             preloaded models would be discarded"
        );
    }

    let crop_path = models.crop_model_path();
    let crop_loader = loader.clone();
    let crop_classifier = tokio::task::spawn_blocking(move || crop_loader.load(&crop_path))
        .await?
        .context("Failed to load crop classifier")?;
    info!(model = %crop_classifier.name(), "Crop classifier ready");

    let crop_labels = match &models.crop_labels {
        Some(labels) => LabelSet::new(labels.iter().cloned()).context("Invalid crop labels")?,
        None => builtin_crop_labels(),
    };

    let registry = Arc::new(build_registry(models)?);
    let missing = registry.missing_crops(&crop_labels);
    if !missing.is_empty() {
        warn!(
            crops = ?missing,
            "Crop labels without a disease model; requests for them will be rejected"
        );
    }
    info!(crops = registry.len(), "Disease registry ready");

    let remedies = match &config.remedies.path {
        Some(path) => RemedyCatalog::from_file(path)
            .with_context(|| format!("Failed to load remedies from {}", path.display()))?,
        None => RemedyCatalog::builtin(),
    };
    info!(entries = remedies.len(), "Remedy catalog ready");

    let disease_models = if models.cache_disease_models {
        DiseaseModelCache::new(loader, registry.len() as u64)
    } else {
        DiseaseModelCache::uncached(loader)
    };

    if models.preload_disease_models {
        disease_models
            .preload(registry.models())
            .await
            .context("Failed to preload disease models")?;
    }

    let service = DiagnosisService::new(
        crop_classifier,
        crop_labels,
        registry,
        Arc::new(disease_models),
        Arc::new(remedies),
    )
    .with_preprocess(PreprocessConfig {
        size: models.input_size,
        layout: models.layout,
    })
    .with_softmax(models.apply_softmax);

    Ok(service)
}

fn build_registry(models: &ModelsConfig) -> anyhow::Result<CropDiseaseRegistry> {
    let Some(crops) = &models.crops else {
        return Ok(CropDiseaseRegistry::builtin(&models.dir));
    };

    let entries = crops
        .iter()
        .map(|crop| {
            let labels = LabelSet::new(crop.labels.iter().cloned())
                .with_context(|| format!("Invalid disease labels for crop '{}'", crop.name))?;
            Ok(CropModel::new(&crop.name, models.dir.join(&crop.model), labels))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(CropDiseaseRegistry::new(entries)?)
}
