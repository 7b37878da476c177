//! JSON export of analysis reports

use crate::error::AnalyzerResult;
use crate::types::{AnalysisReport, RackType};
use std::path::{Path, PathBuf};
use tracing::info;

/// `<stem>_analysis.json`, or `<stem>_drum_analysis.json` for drum racks
pub fn output_file_name(source: &Path, rack_type: RackType) -> String {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "rack".to_string());

    match rack_type {
        RackType::Drum => format!("{}_drum_analysis.json", stem),
        _ => format!("{}_analysis.json", stem),
    }
}

/// Pretty-printed JSON; identical reports always serialize to identical bytes
pub fn to_json(report: &AnalysisReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

/// Write the report into `output_dir`, creating it if needed
pub fn export_to_json(
    report: &AnalysisReport,
    source: &Path,
    output_dir: &Path,
) -> AnalyzerResult<PathBuf> {
    std::fs::create_dir_all(output_dir)?;

    let path = output_dir.join(output_file_name(source, report.analysis.rack_type));
    let mut json = to_json(report)?;
    json.push('\n');
    std::fs::write(&path, json)?;

    info!(path = %path.display(), "Exported analysis");
    Ok(path)
}
