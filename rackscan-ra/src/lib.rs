//! rackscan-ra - Ableton rack analyzer
//!
//! Decodes `.adg`/`.adv` rack presets (gzip-compressed XML) into a typed
//! chain/device tree with macro controls, drum pad metadata, complexity
//! scoring and edition requirements.
//!
//! Pipeline: decode → build → annotate (drum racks) → score → export.
//! Decode failures are fatal for a file; everything after decoding degrades
//! into `parsing_errors` / `parsing_warnings` on the result instead.

pub mod builder;
pub mod decoder;
pub mod drum;
pub mod error;
pub mod export;
pub mod metadata;
pub mod registry;
pub mod services;
pub mod types;
pub mod validators;

pub use error::{AnalyzerError, DecodeError, StructuralError};
pub use types::{AnalysisReport, AnalysisResult, RackType};

use builder::TreeBuilder;
use decoder::{DecodeLimits, ParsedDocument};
use rackscan_common::{AnalysisSettings, PerformanceSettings, TomlConfig};
use sha2::{Digest, Sha256};
use std::path::Path;
use validators::{EditionDetector, PerformanceScorer};

/// SHA-256 of the raw file bytes, lowercase hex
pub fn file_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// Full analysis pipeline for one file at a time
///
/// Holds only read-only configuration, so one instance can be shared
/// across batch workers.
pub struct RackAnalyzer {
    limits: DecodeLimits,
    builder: TreeBuilder,
    scorer: PerformanceScorer,
    editions: EditionDetector,
}

impl Default for RackAnalyzer {
    fn default() -> Self {
        Self::new(&AnalysisSettings::default(), &PerformanceSettings::default())
    }
}

impl RackAnalyzer {
    pub fn new(analysis: &AnalysisSettings, performance: &PerformanceSettings) -> Self {
        Self {
            limits: DecodeLimits::from(analysis),
            builder: TreeBuilder::from_settings(analysis),
            scorer: PerformanceScorer::with_settings(performance.clone()),
            editions: EditionDetector::new(),
        }
    }

    pub fn from_config(config: &TomlConfig) -> Self {
        Self::new(&config.analysis, &config.performance)
    }

    pub fn limits(&self) -> &DecodeLimits {
        &self.limits
    }

    /// Build and (for drum racks) annotate the tree of a decoded document
    pub fn analyze_document(&self, doc: &ParsedDocument, source_name: Option<&str>) -> AnalysisResult {
        let result = self.builder.build(doc, source_name);
        drum::annotate_drum(result)
    }

    /// Analyze raw container bytes
    pub fn analyze_bytes(
        &self,
        bytes: &[u8],
        source_name: Option<&str>,
    ) -> Result<AnalysisReport, DecodeError> {
        let doc = decoder::decode(bytes, &self.limits)?;
        let analysis = self.analyze_document(&doc, source_name);

        let performance = self.scorer.score(&analysis);
        let edition = self.editions.detect(&analysis);

        tracing::info!(
            rack = %analysis.rack_name,
            rack_type = ?analysis.rack_type,
            chains = analysis.chains.len(),
            errors = analysis.parsing_errors.len(),
            warnings = analysis.parsing_warnings.len(),
            "Analyzed rack"
        );

        Ok(AnalysisReport {
            analysis,
            performance: Some(performance),
            edition: Some(edition),
            file_hash: Some(file_hash(bytes)),
            source_file: source_name.map(str::to_string),
        })
    }

    /// Read and analyze a rack file
    pub fn analyze_file(&self, path: &Path) -> Result<AnalysisReport, DecodeError> {
        let bytes = decoder::read_rack_file(path, &self.limits)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());
        let span = tracing::info_span!("analyze_file", path = %path.display());
        let _guard = span.enter();
        self.analyze_bytes(&bytes, file_name.as_deref())
    }
}
