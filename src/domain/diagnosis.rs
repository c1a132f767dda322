use chrono::{DateTime, Utc};

use super::remedy::RemedyInfo;

/// Outcome of one two-stage classification request
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosisResult {
    pub crop: String,
    /// Crop-stage probability; logged but not part of the API response
    pub crop_confidence: f32,
    pub disease: String,
    /// Disease-stage probability
    pub confidence: f32,
    pub remedy: RemedyInfo,
    pub timestamp: DateTime<Utc>,
}
