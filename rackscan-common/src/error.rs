//! Errors raised while loading settings and wiring up the process

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file does not exist
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Config file exists but is not valid TOML for [`crate::TomlConfig`]
    #[error("Failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    /// Config could not be rendered back to TOML
    #[error("Failed to serialize config: {0}")]
    Serialize(String),

    /// A setting parsed but holds an unusable value
    #[error("Invalid setting `{key}`: {reason}")]
    InvalidSetting { key: &'static str, reason: String },

    /// Tracing subscriber could not be installed
    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}

impl Error {
    /// Name of the offending setting, for validation failures
    pub fn setting_key(&self) -> Option<&'static str> {
        match self {
            Error::InvalidSetting { key, .. } => Some(*key),
            _ => None,
        }
    }
}
