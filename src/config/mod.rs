mod app_config;

pub use app_config::{
    AppConfig, CropModelConfig, LogFormat, LoggingConfig, MetricsConfig, ModelsConfig,
    RemediesConfig, ServerConfig, UploadConfig,
};
