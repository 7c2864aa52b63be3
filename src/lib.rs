//! Tianyu Insight - consumption analytics backend
//!
//! This library turns an in-game currency consumption export into a report.
//! It handles:
//! - CSV parsing with batched progress reporting
//! - Daily trend statistics overall and per payment tier
//! - Channel, item and category aggregation
//! - Rule-based recommendations
//! - Report assembly, narrative generation and export

pub mod commands;
pub mod config;
pub mod export;
pub mod metrics;
pub mod models;
pub mod narrative;
pub mod parser;
pub mod recommendations;
pub mod report;
pub mod session;
pub mod trends;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use config::{AppConfig, ConfigError};
use export::ExportFormat;
use narrative::NarrativeError;
use parser::ParseError;
use session::AnalysisSession;

/// Error type for commands
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Input error: {0}")]
    Parse(#[from] ParseError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Narrative error: {0}")]
    Narrative(#[from] NarrativeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Export error: {0}")]
    Export(String),
}

// Presentation layers receive the display string
impl serde::Serialize for CommandError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Command line arguments
#[derive(Debug, Parser)]
#[command(name = "tianyu-insight", version, about = "Analyze Tianyu consumption exports")]
pub struct Cli {
    /// CSV export to analyze
    pub input: PathBuf,

    /// Directory for exported files (default: Downloads folder)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Export format: json or csv
    #[arg(short, long, default_value = "json")]
    pub format: ExportFormat,

    /// Generate the summary through the configured chat-completion service
    #[arg(long)]
    pub narrative: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

// ============================================================================
// Application Setup
// ============================================================================

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    tracing::info!("Starting Tianyu Insight");

    match execute(cli) {
        Ok(files) => {
            for file in files {
                println!("{}", file.display());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn execute(cli: Cli) -> Result<Vec<PathBuf>, CommandError> {
    let mut config = AppConfig::from_env()?;
    if cli.narrative {
        config.narrative.enabled = true;
        config.validate()?;
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let session = Arc::new(AnalysisSession::new());
    let outcome = runtime.block_on(commands::generate_report(
        &cli.input,
        &config,
        session,
        |percent| tracing::info!("Progress: {}%", percent),
    ))?;

    if outcome.is_degenerate() {
        tracing::warn!("Analysis failed; exporting the placeholder report");
    }

    let directory = cli.output.unwrap_or_else(export::get_export_directory);
    tracing::info!("Export directory: {:?}", directory);
    commands::export_report(&outcome, cli.format, &directory)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_error_serializes_to_message() {
        let err = CommandError::Parse(ParseError::EmptyHeader);
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, "\"Input error: CSV header row is empty or missing\"");
    }

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from([
            "tianyu-insight",
            "data.csv",
            "--format",
            "csv",
            "--output",
            "out",
            "--narrative",
        ])
        .unwrap();

        assert_eq!(cli.input, PathBuf::from("data.csv"));
        assert_eq!(cli.format, ExportFormat::Csv);
        assert_eq!(cli.output, Some(PathBuf::from("out")));
        assert!(cli.narrative);
        assert!(!cli.verbose);
    }

    #[test]
    fn test_cli_defaults_and_bad_format() {
        let cli = Cli::try_parse_from(["tianyu-insight", "data.csv"]).unwrap();
        assert_eq!(cli.format, ExportFormat::Json);
        assert!(cli.output.is_none());

        assert!(Cli::try_parse_from(["tianyu-insight", "data.csv", "--format", "xml"]).is_err());
    }
}
