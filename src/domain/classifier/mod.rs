//! Classifier abstractions and argmax label selection

mod label;

pub use label::LabelSet;

use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;

#[cfg(test)]
use mockall::automock;

use super::image::ImageTensor;
use super::DomainError;

/// A pre-trained model mapping an image tensor to one score per class
pub trait ImageClassifier: Send + Sync + Debug {
    /// Run a single forward pass
    fn predict(&self, input: &ImageTensor) -> Result<Vec<f32>, DomainError>;

    /// Human readable identifier (usually the model path)
    fn name(&self) -> &str;
}

/// Loads a classifier from a model file on disk
#[cfg_attr(test, automock)]
pub trait ModelLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<Arc<dyn ImageClassifier>, DomainError>;
}

/// Winning class of a single model invocation
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub index: usize,
    pub label: String,
    pub confidence: f32,
}

/// Index of the highest score; ties go to the lowest index.
pub fn argmax(scores: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;

    for (i, &score) in scores.iter().enumerate() {
        if score.is_nan() {
            continue;
        }
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((i, score)),
        }
    }

    best.map(|(i, _)| i)
}

/// Convert raw logits into a probability distribution
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&v| (v - max).exp()).collect();
    let sum: f32 = exps.iter().sum();

    exps.into_iter().map(|v| v / sum).collect()
}

/// Select the winning label from a model's probability vector.
///
/// The vector length must match the label set and every value must be a
/// probability; the model output is otherwise rejected rather than clamped.
pub fn select_label(probabilities: &[f32], labels: &LabelSet) -> Result<Prediction, DomainError> {
    if probabilities.len() != labels.len() {
        return Err(DomainError::inference(format!(
            "model produced {} scores for {} labels",
            probabilities.len(),
            labels.len()
        )));
    }

    if let Some(bad) = probabilities
        .iter()
        .find(|p| !p.is_finite() || **p < 0.0 || **p > 1.0)
    {
        return Err(DomainError::inference(format!(
            "model output {} is not a probability; enable apply_softmax for logit outputs",
            bad
        )));
    }

    let index = argmax(probabilities)
        .ok_or_else(|| DomainError::inference("model produced no scores"))?;
    let label = labels
        .get(index)
        .ok_or_else(|| DomainError::internal(format!("label index {} out of range", index)))?;

    Ok(Prediction {
        index,
        label: label.to_string(),
        confidence: probabilities[index],
    })
}

/// Run one forward pass and pick the best label
pub fn classify(
    model: &dyn ImageClassifier,
    labels: &LabelSet,
    input: &ImageTensor,
    apply_softmax: bool,
) -> Result<Prediction, DomainError> {
    let scores = model.predict(input)?;

    if apply_softmax {
        select_label(&softmax(&scores), labels)
    } else {
        select_label(&scores, labels)
    }
}
