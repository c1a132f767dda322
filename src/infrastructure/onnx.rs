//! ONNX Runtime backed image classifiers

use std::path::Path;
use std::sync::{Arc, Mutex};

use ort::session::Session;
use ort::value::Tensor;
use tracing::info;

use crate::domain::{DomainError, ImageClassifier, ImageTensor, ModelLoader};

/// Image classifier running an exported ONNX graph.
///
/// `Session::run` needs exclusive access, so concurrent requests sharing one
/// classifier are serialized on the inner mutex.
pub struct OnnxClassifier {
    name: String,
    session: Mutex<Session>,
}

impl std::fmt::Debug for OnnxClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxClassifier")
            .field("name", &self.name)
            .finish()
    }
}

impl OnnxClassifier {
    pub fn load(path: &Path) -> Result<Self, DomainError> {
        let display = path.display().to_string();

        if !path.exists() {
            return Err(DomainError::model_load(display, "file not found"));
        }

        let session = Session::builder()
            .map_err(|e| DomainError::model_load(&display, e.to_string()))?
            .commit_from_file(path)
            .map_err(|e| DomainError::model_load(&display, e.to_string()))?;

        info!(model = %path.display(), "Loaded ONNX model");

        Ok(Self {
            name: display,
            session: Mutex::new(session),
        })
    }
}

impl ImageClassifier for OnnxClassifier {
    fn predict(&self, input: &ImageTensor) -> Result<Vec<f32>, DomainError> {
        let [n, a, b, c] = input.shape();
        let shape = [n as i64, a as i64, b as i64, c as i64];

        let tensor = Tensor::from_array((shape, input.data().to_vec().into_boxed_slice()))
            .map_err(|e| DomainError::inference(format!("{}: {}", self.name, e)))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| DomainError::internal(format!("{}: session lock poisoned", self.name)))?;

        let outputs = session
            .run(ort::inputs![tensor])
            .map_err(|e| DomainError::inference(format!("{}: {}", self.name, e)))?;

        let (_, scores) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| DomainError::inference(format!("{}: {}", self.name, e)))?;

        Ok(scores.to_vec())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Loads `.onnx` model files into [`OnnxClassifier`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct OnnxModelLoader;

impl ModelLoader for OnnxModelLoader {
    fn load(&self, path: &Path) -> Result<Arc<dyn ImageClassifier>, DomainError> {
        Ok(Arc::new(OnnxClassifier::load(path)?))
    }
}
