//! Error types for rackscan-ra
//!
//! Three tiers:
//! - [`DecodeError`]: fatal for a file; the container could not be turned into XML
//! - [`StructuralError`]: recorded in `parsing_errors`, aborts only one subtree
//! - Warnings: plain strings in `parsing_warnings`
//!
//! [`AnalyzerError`] wraps everything that can fail outside the pure core
//! (export, scanning, batch workers).

use crate::services::file_scanner::ScanError;
use thiserror::Error;

/// Failure to turn raw bytes into a parsed document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// File missing or unreadable
    #[error("File not found or unreadable: {0}")]
    NotFound(String),

    /// Input (or decompressed output) above the configured maximum
    #[error("File too large: {size} bytes (maximum {max})")]
    TooLarge { size: u64, max: u64 },

    /// Input below the configured minimum
    #[error("File too small: {size} bytes (minimum {min})")]
    TooSmall { size: u64, min: u64 },

    /// Not a gzip/zlib stream, or the stream is corrupt
    #[error("Failed to decompress rack file: {0}")]
    DecompressionFailed(String),

    /// Decompression produced no bytes
    #[error("Decompressed content is empty")]
    EmptyContent,

    /// Decompressed content does not start with an XML prolog or tag
    #[error("Decompressed content is not XML")]
    NotXml,

    /// XML is malformed
    #[error("Failed to parse XML: {0}")]
    XmlParseFailed(String),
}

impl DecodeError {
    /// Stable category code for reports and logs
    pub fn code(&self) -> &'static str {
        match self {
            DecodeError::NotFound(_) => "NOT_FOUND",
            DecodeError::TooLarge { .. } => "TOO_LARGE",
            DecodeError::TooSmall { .. } => "TOO_SMALL",
            DecodeError::DecompressionFailed(_) => "DECOMPRESSION_FAILED",
            DecodeError::EmptyContent => "EMPTY_CONTENT",
            DecodeError::NotXml => "NOT_XML",
            DecodeError::XmlParseFailed(_) => "XML_PARSE_FAILED",
        }
    }

    /// Emit one structured log entry for this failure
    ///
    /// Size-bound violations log at warn, everything else at error.
    pub fn log(&self, source: &str) {
        match self {
            DecodeError::TooLarge { .. } | DecodeError::TooSmall { .. } => {
                tracing::warn!(source, code = self.code(), "{}", self);
            }
            _ => {
                tracing::error!(source, code = self.code(), "{}", self);
            }
        }
    }
}

/// Structural failure that aborts one subtree of the walk
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    /// No rack device could be located
    #[error("Unknown rack type - unable to detect DrumRack, DrumGroupDevice, InstrumentGroupDevice, AudioEffectGroupDevice or MidiEffectGroupDevice")]
    UnknownRackType,

    /// Rack tag has no branch preset mapping
    #[error("Unknown branch preset type for rack type {0}")]
    UnknownBranchType(String),

    /// BranchPresets holds branches of a different rack variant
    #[error("{rack} expects {expected} branches but BranchPresets contains {found}")]
    BranchTypeMismatch {
        rack: String,
        expected: String,
        found: String,
    },
}

/// Errors outside the pure analysis core
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// Rack file could not be decoded
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Directory scan error
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    /// Batch worker failed (panic or cancellation)
    #[error("Worker failed: {0}")]
    Worker(String),
}

/// Result type for operations outside the core
pub type AnalyzerResult<T> = Result<T, AnalyzerError>;
