//! rackscan-ra - Ableton rack analyzer CLI
//!
//! **Usage:**
//! ```bash
//! rackscan-ra [OPTIONS] <PATHS>...
//! ```
//!
//! Every path may be a rack file or a directory (scanned recursively).
//! One JSON report is written per rack next to the source file, or into
//! `--output` / the configured `output_folder`.

use anyhow::{Context, Result};
use clap::Parser;
use rackscan_common::config::{write_toml_config, ConfigResolver};
use rackscan_common::logging::init_logging;
use rackscan_common::TomlConfig;
use rackscan_ra::services::{analyze_batch, RackFileScanner};
use rackscan_ra::{export, RackAnalyzer};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Ableton rack analyzer
#[derive(Parser, Debug)]
#[command(name = "rackscan-ra")]
#[command(about = "Analyze Ableton .adg/.adv rack presets and export JSON reports")]
#[command(version)]
struct Cli {
    /// Rack files or directories to analyze
    #[arg(required_unless_present = "write_default_config")]
    paths: Vec<PathBuf>,

    /// Output directory for JSON reports (overrides output_folder)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Config file (falls back to RACKSCAN_CONFIG, then the user config dir)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Number of files analyzed in parallel
    #[arg(short, long)]
    workers: Option<usize>,

    /// Print JSON to stdout instead of writing files
    #[arg(long)]
    stdout: bool,

    /// Only log the summary, write nothing
    #[arg(long, conflicts_with = "stdout")]
    no_export: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Write the default configuration to FILE and exit
    #[arg(long, value_name = "FILE")]
    write_default_config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.write_default_config {
        write_toml_config(&TomlConfig::default(), path)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    let loaded = ConfigResolver::new(cli.config.clone()).load_detailed();
    init_logging(&loaded.config.logging, cli.verbose).context("Failed to initialize logging")?;
    loaded.log_source();
    let config = loaded.config;

    info!("Starting rackscan-ra");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let (files, scan_errors) = RackFileScanner::new().scan_all(&cli.paths);
    if files.is_empty() {
        anyhow::bail!("No rack files found in the given paths");
    }

    let workers = cli.workers.unwrap_or(config.analysis.workers);
    let analyzer = Arc::new(RackAnalyzer::from_config(&config));
    let outcomes = analyze_batch(analyzer, files, workers).await;

    let output_dir = cli.output.clone().or_else(|| config.output_folder.clone());
    let mut failed = 0usize;

    for outcome in &outcomes {
        let report = match &outcome.result {
            Ok(report) => report,
            Err(e) => {
                failed += 1;
                error!(path = %outcome.path.display(), error = %e, "Analysis failed");
                continue;
            }
        };

        if cli.no_export {
            continue;
        }

        if cli.stdout {
            let json = export::to_json(report).context("Failed to serialize report")?;
            println!("{}", json);
            continue;
        }

        let dir = output_dir
            .clone()
            .unwrap_or_else(|| parent_dir(&outcome.path));
        if let Err(e) = export::export_to_json(report, &outcome.path, &dir) {
            failed += 1;
            error!(path = %outcome.path.display(), error = %e, "Export failed");
        }
    }

    for e in &scan_errors {
        warn!(error = %e, "Input path skipped");
    }

    let with_errors = outcomes
        .iter()
        .filter_map(|o| o.result.as_ref().ok())
        .filter(|r| !r.analysis.is_clean())
        .count();

    info!(
        analyzed = outcomes.len(),
        failed,
        with_parsing_issues = with_errors,
        skipped_paths = scan_errors.len(),
        "Done"
    );

    if failed > 0 {
        anyhow::bail!("{} of {} rack files failed", failed, outcomes.len());
    }
    Ok(())
}

fn parent_dir(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}
