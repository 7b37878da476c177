//! Configuration loading and resolution
//!
//! Configuration file resolution follows this priority order:
//! 1. Command-line argument (`--config`)
//! 2. Environment variable (`RACKSCAN_CONFIG`)
//! 3. User config file (`<config dir>/rackscan/config.toml`)
//! 4. Compiled defaults (fallback)
//!
//! A missing or unreadable config file never terminates the program:
//! a warning is logged and compiled defaults are used instead.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "RACKSCAN_CONFIG";

/// Application directory name under the platform config dir
const APP_DIR: &str = "rackscan";

/// Top-level TOML configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Directory for exported JSON reports (optional)
    ///
    /// If not specified, reports are written next to each analyzed file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_folder: Option<PathBuf>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Decoder limits and tree-walk settings
    #[serde(default)]
    pub analysis: AnalysisSettings,

    /// Complexity scoring settings
    #[serde(default)]
    pub performance: PerformanceSettings,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Decoder limits and tree-walk settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSettings {
    /// Maximum nested-rack depth before descent is truncated
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Smallest accepted input file, in bytes
    #[serde(default = "default_min_file_size")]
    pub min_file_size: u64,

    /// Largest accepted input file, in bytes
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Largest accepted decompressed XML, in bytes
    #[serde(default = "default_max_decompressed_size")]
    pub max_decompressed_size: u64,

    /// Maximum XML element nesting accepted by the parser
    #[serde(default = "default_max_xml_depth")]
    pub max_xml_depth: usize,

    /// Parallel workers for batch analysis
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Raw device tag → display name overrides
    #[serde(default)]
    pub custom_device_mappings: BTreeMap<String, String>,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            min_file_size: default_min_file_size(),
            max_file_size: default_max_file_size(),
            max_decompressed_size: default_max_decompressed_size(),
            max_xml_depth: default_max_xml_depth(),
            workers: default_workers(),
            custom_device_mappings: BTreeMap::new(),
        }
    }
}

/// Complexity scoring settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSettings {
    /// Device types counted as CPU-heavy (raw tag or standard name)
    #[serde(default = "default_heavy_devices")]
    pub heavy_devices: Vec<String>,

    /// Score above which freezing is recommended
    #[serde(default = "default_freeze_threshold")]
    pub freeze_threshold: f64,

    /// Heavy device count above which simpler alternatives are recommended
    #[serde(default = "default_heavy_device_limit")]
    pub heavy_device_limit: usize,

    /// Chain count above which splitting the rack is recommended
    #[serde(default = "default_chain_split_threshold")]
    pub chain_split_threshold: usize,

    /// Score boundaries for the complexity level label
    #[serde(default)]
    pub complexity_thresholds: ComplexityThresholds,
}

impl Default for PerformanceSettings {
    fn default() -> Self {
        Self {
            heavy_devices: default_heavy_devices(),
            freeze_threshold: default_freeze_threshold(),
            heavy_device_limit: default_heavy_device_limit(),
            chain_split_threshold: default_chain_split_threshold(),
            complexity_thresholds: ComplexityThresholds::default(),
        }
    }
}

/// Score boundaries: below `low` is low, below `medium` is moderate,
/// below `high` is high, anything else is extreme.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComplexityThresholds {
    #[serde(default = "default_low_threshold")]
    pub low: f64,
    #[serde(default = "default_medium_threshold")]
    pub medium: f64,
    #[serde(default = "default_high_threshold")]
    pub high: f64,
}

impl Default for ComplexityThresholds {
    fn default() -> Self {
        Self {
            low: default_low_threshold(),
            medium: default_medium_threshold(),
            high: default_high_threshold(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_depth() -> usize {
    10
}

fn default_min_file_size() -> u64 {
    100
}

fn default_max_file_size() -> u64 {
    100 * 1024 * 1024
}

fn default_max_decompressed_size() -> u64 {
    512 * 1024 * 1024
}

fn default_max_xml_depth() -> usize {
    2048
}

fn default_workers() -> usize {
    4
}

fn default_heavy_devices() -> Vec<String> {
    ["ConvolutionReverb", "HybridReverb", "Wavetable", "Operator"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_freeze_threshold() -> f64 {
    70.0
}

fn default_heavy_device_limit() -> usize {
    3
}

fn default_chain_split_threshold() -> usize {
    32
}

fn default_low_threshold() -> f64 {
    30.0
}

fn default_medium_threshold() -> f64 {
    60.0
}

fn default_high_threshold() -> f64 {
    80.0
}

/// Resolves which config file (if any) to load
pub struct ConfigResolver {
    cli_path: Option<PathBuf>,
    env_var_name: String,
}

impl ConfigResolver {
    /// Create a resolver honoring the given `--config` argument
    pub fn new(cli_path: Option<PathBuf>) -> Self {
        Self {
            cli_path,
            env_var_name: CONFIG_ENV_VAR.to_string(),
        }
    }

    /// Override the environment variable consulted at priority 2
    pub fn with_env_var(mut self, name: impl Into<String>) -> Self {
        self.env_var_name = name.into();
        self
    }

    /// Resolve the config file path, or `None` when compiled defaults apply
    pub fn resolve(&self) -> Option<PathBuf> {
        // Priority 1: Command-line argument
        if let Some(path) = &self.cli_path {
            debug!(path = %path.display(), "Using config file from command line");
            return Some(path.clone());
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(&self.env_var_name) {
            if !path.trim().is_empty() {
                debug!(var = %self.env_var_name, path = %path, "Using config file from environment");
                return Some(PathBuf::from(path));
            }
        }

        // Priority 3: User config file
        if let Some(path) = default_config_path() {
            if path.exists() {
                debug!(path = %path.display(), "Using user config file");
                return Some(path);
            }
        }

        // Priority 4: Compiled defaults
        None
    }

    /// Resolve and load the configuration, degrading to defaults on any failure
    ///
    /// Logs the outcome immediately. Callers that install the tracing
    /// subscriber from the loaded config use [`ConfigResolver::load_detailed`]
    /// and log afterwards.
    pub fn load(&self) -> TomlConfig {
        let loaded = self.load_detailed();
        loaded.log_source();
        loaded.config
    }

    /// Resolve and load the configuration, recording where it came from
    pub fn load_detailed(&self) -> LoadedConfig {
        match self.resolve() {
            Some(path) => match load_toml_config(&path) {
                Ok(config) => LoadedConfig {
                    config,
                    source: ConfigSource::File(path),
                },
                Err(e) => LoadedConfig {
                    config: TomlConfig::default(),
                    source: ConfigSource::Fallback {
                        path,
                        error: e.to_string(),
                    },
                },
            },
            None => LoadedConfig {
                config: TomlConfig::default(),
                source: ConfigSource::Defaults,
            },
        }
    }
}

/// Where the effective configuration came from
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// No config file found; compiled defaults
    Defaults,
    /// Loaded from this file
    File(PathBuf),
    /// This file was selected but could not be used; compiled defaults
    Fallback { path: PathBuf, error: String },
}

/// Effective configuration plus its source
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConfig {
    pub config: TomlConfig,
    pub source: ConfigSource,
}

impl LoadedConfig {
    /// Whether a selected config file was ignored
    pub fn is_fallback(&self) -> bool {
        matches!(self.source, ConfigSource::Fallback { .. })
    }

    /// Report the config source through tracing
    pub fn log_source(&self) {
        match &self.source {
            ConfigSource::File(path) => info!(path = %path.display(), "Loaded configuration"),
            ConfigSource::Fallback { path, error } => warn!(
                path = %path.display(),
                error = %error,
                "Failed to load config file, using compiled defaults"
            ),
            ConfigSource::Defaults => info!("No config file found, using compiled defaults"),
        }
    }
}

/// Platform config file location: `<config dir>/rackscan/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
}

/// Load and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        return Err(Error::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    validate(&config)?;
    Ok(config)
}

/// Write configuration to a TOML file
///
/// Writes to a temporary sibling first and renames it into place, so a
/// crash never leaves a truncated config behind.
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Serialize(e.to_string()))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = path.with_extension("toml.tmp");
    std::fs::write(&tmp_path, content)?;
    std::fs::rename(&tmp_path, path)?;

    info!(path = %path.display(), "Wrote configuration");
    Ok(())
}

fn validate(config: &TomlConfig) -> Result<()> {
    let analysis = &config.analysis;
    if analysis.min_file_size > analysis.max_file_size {
        return Err(Error::InvalidSetting {
            key: "analysis.min_file_size",
            reason: format!(
                "{} exceeds max_file_size ({})",
                analysis.min_file_size, analysis.max_file_size
            ),
        });
    }
    if analysis.workers == 0 {
        return Err(Error::InvalidSetting {
            key: "analysis.workers",
            reason: "must be at least 1".to_string(),
        });
    }

    let t = &config.performance.complexity_thresholds;
    if !(t.low <= t.medium && t.medium <= t.high) {
        return Err(Error::InvalidSetting {
            key: "performance.complexity_thresholds",
            reason: format!(
                "must be ascending (low {}, medium {}, high {})",
                t.low, t.medium, t.high
            ),
        });
    }
    Ok(())
}
