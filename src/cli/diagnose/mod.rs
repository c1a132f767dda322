//! Diagnose command - runs the pipeline once on a local image

use std::path::PathBuf;

use anyhow::Context;
use bytes::Bytes;
use clap::Args;
use tracing::info;

use crate::api::types::DiagnosisResponse;
use crate::config::AppConfig;
use crate::infrastructure::logging::init_logging;
use crate::infrastructure::onnx::OnnxModelLoader;

#[derive(Args, Debug)]
pub struct DiagnoseArgs {
    /// Leaf image to classify
    #[arg(long, short)]
    pub image: PathBuf,
}

/// Classify one image and print the response JSON to stdout
pub async fn run(args: DiagnoseArgs) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    init_logging(&config.logging);

    let image = tokio::fs::read(&args.image)
        .await
        .with_context(|| format!("Failed to read {}", args.image.display()))?;

    let service =
        crate::build_diagnosis_service(&config, std::sync::Arc::new(OnnxModelLoader)).await?;

    info!(image = %args.image.display(), bytes = image.len(), "Diagnosing image");
    let result = service.diagnose(Bytes::from(image)).await?;

    println!(
        "{}",
        serde_json::to_string_pretty(&DiagnosisResponse::from_domain(result))?
    );

    Ok(())
}
