//! Prediction endpoint handler

use axum::{extract::State, Json};
use tracing::{debug, info};

use crate::api::state::AppState;
use crate::api::types::{ApiError, DiagnosisResponse};
use crate::api::upload::ImageUpload;

/// POST /predict
pub async fn predict(
    State(state): State<AppState>,
    upload: ImageUpload,
) -> Result<Json<DiagnosisResponse>, ApiError> {
    debug!(
        file_name = ?upload.file_name,
        content_type = ?upload.content_type,
        bytes = upload.bytes.len(),
        "Received image upload"
    );

    upload.ensure_image()?;

    let result = state.diagnosis_service.diagnose(upload.bytes).await?;

    info!(
        crop = %result.crop,
        crop_confidence = result.crop_confidence,
        disease = %result.disease,
        confidence = result.confidence,
        "Diagnosis complete"
    );

    Ok(Json(DiagnosisResponse::from_domain(result)))
}
