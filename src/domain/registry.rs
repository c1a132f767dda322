//! Static crop -> disease model registry

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use super::classifier::LabelSet;
use super::DomainError;

/// Crop labels in the order the crop classifier was trained with
pub const BUILTIN_CROP_LABELS: &[&str] = &[
    "Corn",
    "Cotton",
    "Potato",
    "Rice",
    "Sugarcane",
    "Tomato",
    "Wheat",
];

/// Model file of the crop classifier inside the model directory
pub const BUILTIN_CROP_MODEL: &str = "allcrop.onnx";

const BUILTIN_DISEASE_MODELS: &[(&str, &str, &[&str])] = &[
    (
        "Corn",
        "corn.onnx",
        &["Blight", "Common Rust", "Gray Leaf Spot", "Healthy"],
    ),
    (
        "Cotton",
        "cotton.onnx",
        &[
            "cotton_diseased_leaf",
            "cotton_diseased_plant",
            "cotton_fresh_leaf",
            "cotton_fresh_plant",
        ],
    ),
    (
        "Potato",
        "potato.onnx",
        &["Potato_Early_blight", "Potato_Late_blight", "Potato_healthy"],
    ),
    (
        "Rice",
        "rice.onnx",
        &[
            "Rice_Bacterial_Leaf_Blight",
            "Rice_Brown_Spot",
            "Rice_Healthy_Rice_Leaf",
            "Rice_Leaf_Blast",
            "Rice_Leaf_scald",
            "Rice_Sheath_Blight",
        ],
    ),
    (
        "Sugarcane",
        "sugarcane.onnx",
        &[
            "sugarcane_Healthy",
            "sugarcane_Mosaic",
            "sugarcane_RedRot",
            "sugarcane_Rust",
            "sugarcane_Yellow",
        ],
    ),
    (
        "Tomato",
        "tomato.onnx",
        &[
            "tomato_Bacterial_spot",
            "tomato_Early_blight",
            "tomato_Late_blight",
            "tomato_Leaf_Mold",
            "tomato_Septoria_leaf_spot",
            "tomato_Spider_mites Two-spotted_spider_mite",
            "tomato_Target_Spot",
            "tomato_Yellow_Leaf_Curl_Virus",
            "tomato_healthy",
            "tomato_mosaic_virus",
            "tomato_powdery_mildew",
        ],
    ),
    (
        "Wheat",
        "wheat.onnx",
        &["wheat_Healthy", "wheat_septoria", "wheat_stripe_rust"],
    ),
];

/// Disease model registered for one crop
#[derive(Debug, Clone, PartialEq)]
pub struct CropModel {
    crop: String,
    model_path: PathBuf,
    labels: LabelSet,
}

impl CropModel {
    pub fn new(crop: impl Into<String>, model_path: impl Into<PathBuf>, labels: LabelSet) -> Self {
        Self {
            crop: crop.into(),
            model_path: model_path.into(),
            labels,
        }
    }

    pub fn crop(&self) -> &str {
        &self.crop
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }
}

/// Immutable mapping from crop name to its disease model
#[derive(Debug, Clone, Default)]
pub struct CropDiseaseRegistry {
    entries: HashMap<String, CropModel>,
}

impl CropDiseaseRegistry {
    /// Build a registry; duplicate crop names are a configuration error
    pub fn new(models: impl IntoIterator<Item = CropModel>) -> Result<Self, DomainError> {
        let mut entries = HashMap::new();

        for model in models {
            let crop = model.crop.clone();
            if entries.insert(crop.clone(), model).is_some() {
                return Err(DomainError::configuration(format!(
                    "crop '{}' registered more than once",
                    crop
                )));
            }
        }

        Ok(Self { entries })
    }

    /// The builtin seven-crop table with model files under `model_dir`
    pub fn builtin(model_dir: &Path) -> Self {
        let entries = BUILTIN_DISEASE_MODELS
            .iter()
            .map(|(crop, file, labels)| {
                let labels = LabelSet::new(labels.iter().copied())
                    .unwrap_or_else(|_| unreachable!("builtin label sets are non-empty"));
                (
                    crop.to_string(),
                    CropModel::new(*crop, model_dir.join(file), labels),
                )
            })
            .collect();

        Self { entries }
    }

    /// Exact, case-sensitive lookup with no fallback
    pub fn resolve(&self, crop: &str) -> Result<&CropModel, DomainError> {
        self.entries
            .get(crop)
            .ok_or_else(|| DomainError::unsupported_crop(crop))
    }

    /// Crop labels that have no disease model registered
    pub fn missing_crops<'a>(&self, crop_labels: &'a LabelSet) -> Vec<&'a str> {
        crop_labels
            .iter()
            .filter(|crop| !self.entries.contains_key(*crop))
            .collect()
    }

    pub fn models(&self) -> impl Iterator<Item = &CropModel> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The builtin crop classifier label set
pub fn builtin_crop_labels() -> LabelSet {
    LabelSet::new(BUILTIN_CROP_LABELS.iter().copied())
        .unwrap_or_else(|_| unreachable!("builtin crop labels are non-empty"))
}
