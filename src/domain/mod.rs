//! Domain layer - Core types and classification logic

pub mod classifier;
pub mod diagnosis;
pub mod error;
pub mod image;
pub mod registry;
pub mod remedy;

pub use classifier::{
    argmax, classify, select_label, softmax, ImageClassifier, LabelSet, ModelLoader, Prediction,
};
pub use diagnosis::DiagnosisResult;
pub use error::DomainError;
pub use image::{preprocess, ImageTensor, PreprocessConfig, TensorLayout};
pub use registry::{builtin_crop_labels, CropDiseaseRegistry, CropModel};
pub use remedy::{ReferenceImage, RemedyCatalog, RemedyInfo};
