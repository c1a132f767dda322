//! CLI module for the crop disease gateway
//!
//! Provides subcommands:
//! - `serve`: HTTP gateway (default)
//! - `diagnose`: run the pipeline once on a local image

pub mod diagnose;
pub mod serve;

use clap::{Parser, Subcommand};

/// Crop Disease Gateway - plant disease diagnosis from leaf photos
#[derive(Parser)]
#[command(name = "crop-disease-gateway")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP gateway (default mode)
    Serve,

    /// Diagnose a single image file and print the JSON result
    Diagnose(diagnose::DiagnoseArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_is_default() {
        let cli = Cli::try_parse_from(["crop-disease-gateway"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_diagnose_requires_image() {
        assert!(Cli::try_parse_from(["crop-disease-gateway", "diagnose"]).is_err());

        let cli =
            Cli::try_parse_from(["crop-disease-gateway", "diagnose", "--image", "leaf.jpg"])
                .unwrap();
        match cli.command {
            Some(Command::Diagnose(args)) => {
                assert_eq!(args.image, std::path::PathBuf::from("leaf.jpg"))
            }
            _ => panic!("expected diagnose command"),
        }
    }
}
