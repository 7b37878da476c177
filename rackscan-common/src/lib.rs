//! # rackscan Common Library
//!
//! Shared code for the rackscan crates:
//! - Common error type
//! - TOML configuration (analysis limits, performance heuristics, logging)
//! - Logging bootstrap

pub mod config;
pub mod error;
pub mod logging;

pub use config::{AnalysisSettings, PerformanceSettings, TomlConfig};
pub use error::{Error, Result};
