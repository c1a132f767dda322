//! Prediction response types

use serde::{Serialize, Serializer};

use crate::domain::remedy::stage_map;
use crate::domain::{DiagnosisResult, ReferenceImage};

/// Timestamp layout of the response, e.g. `2025-01-31 08:15:02.123456`
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// `POST /predict` response body
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosisResponse {
    pub crop: String,
    pub disease: String,
    pub remedy: String,
    pub identification: String,
    #[serde(rename = "preventiveMeasures")]
    pub preventive_measures: Vec<String>,
    #[serde(rename = "Ref_images")]
    pub reference_images: ReferenceImages,
    pub timestamp: String,
    pub confidence: f32,
}

impl DiagnosisResponse {
    pub fn from_domain(result: DiagnosisResult) -> Self {
        Self {
            crop: result.crop,
            disease: result.disease,
            remedy: result.remedy.remedy,
            identification: result.remedy.identification,
            preventive_measures: result.remedy.preventive_measures,
            reference_images: ReferenceImages(result.remedy.reference_images),
            timestamp: result.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            confidence: result.confidence,
        }
    }
}

/// Stage -> image path object that keeps the catalog's stage order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceImages(pub Vec<ReferenceImage>);

impl Serialize for ReferenceImages {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        stage_map::serialize(&self.0, serializer)
    }
}

/// `GET /` response body
#[derive(Debug, Clone, Serialize)]
pub struct ServiceInfo {
    pub message: &'static str,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            message: "Crop Disease Classifier API",
        }
    }
}
