use std::path::PathBuf;

use serde::Deserialize;

use crate::domain::image::{TensorLayout, DEFAULT_INPUT_SIZE};
use crate::domain::registry::BUILTIN_CROP_MODEL;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub models: ModelsConfig,
    pub remedies: RemediesConfig,
    pub upload: UploadConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Model files, preprocessing, and disease model caching
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Directory holding the crop classifier and per-crop disease models
    pub dir: PathBuf,
    /// Crop classifier file name, relative to `dir`
    pub crop_model: String,
    pub input_size: u32,
    pub layout: TensorLayout,
    /// Treat model outputs as logits and normalize them
    pub apply_softmax: bool,
    pub cache_disease_models: bool,
    pub preload_disease_models: bool,
    /// Overrides the builtin crop label order
    pub crop_labels: Option<Vec<String>>,
    /// Overrides the builtin crop -> disease model table
    pub crops: Option<Vec<CropModelConfig>>,
}

/// One disease model entry
#[derive(Debug, Clone, Deserialize)]
pub struct CropModelConfig {
    pub name: String,
    /// Model file name, relative to the model directory
    pub model: String,
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RemediesConfig {
    /// JSON catalog replacing the builtin remedies
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub max_body_bytes: usize,
}

/// Prometheus metrics configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./models"),
            crop_model: BUILTIN_CROP_MODEL.to_string(),
            input_size: DEFAULT_INPUT_SIZE,
            layout: TensorLayout::default(),
            apply_softmax: false,
            cache_disease_models: true,
            preload_disease_models: false,
            crop_labels: None,
            crops: None,
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/metrics".to_string(),
        }
    }
}

impl ModelsConfig {
    pub fn crop_model_path(&self) -> PathBuf {
        self.dir.join(&self.crop_model)
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.server.port, 8000);
        assert_eq!(config.models.input_size, 224);
        assert!(config.models.cache_disease_models);
        assert!(!config.models.preload_disease_models);
        assert_eq!(config.upload.max_body_bytes, 10 * 1024 * 1024);
        assert_eq!(
            config.models.crop_model_path(),
            PathBuf::from("./models/allcrop.onnx")
        );
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let source = r#"
            [server]
            port = 9100

            [models]
            dir = "/srv/models"
            layout = "nchw"

            [[models.crops]]
            name = "Corn"
            model = "corn_v2.onnx"
            labels = ["Blight", "Healthy"]
        "#;

        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.models.layout, TensorLayout::Nchw);
        assert_eq!(config.models.crop_model, "allcrop.onnx");
        let crops = config.models.crops.unwrap();
        assert_eq!(crops[0].model, "corn_v2.onnx");
        assert_eq!(crops[0].labels.len(), 2);
    }
}
