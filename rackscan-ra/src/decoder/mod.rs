//! Rack container decoder
//!
//! `.adg`/`.adv` files are gzip-compressed XML (some exporters write a bare
//! zlib stream instead). The decoder enforces size bounds, decompresses
//! with an output cap, checks that the payload looks like XML and parses
//! it into an owned [`XmlElement`] tree.
//!
//! Every failure is returned as a [`DecodeError`] and logged once; nothing
//! in here panics on hostile input.

pub mod xml;

pub use xml::XmlElement;

use crate::error::DecodeError;
use flate2::read::{MultiGzDecoder, ZlibDecoder};
use rackscan_common::AnalysisSettings;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const UTF8_BOM: &str = "\u{feff}";

/// Root tags seen in real exports; anything else is only a warning
pub const EXPECTED_ROOT_TAGS: [&str; 3] = ["Ableton", "GroupDevicePreset", "PresetRef"];

/// Size bounds applied by the decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeLimits {
    pub min_file_size: u64,
    pub max_file_size: u64,
    pub max_decompressed_size: u64,
    pub max_xml_depth: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self::from(&AnalysisSettings::default())
    }
}

impl From<&AnalysisSettings> for DecodeLimits {
    fn from(settings: &AnalysisSettings) -> Self {
        Self {
            min_file_size: settings.min_file_size,
            max_file_size: settings.max_file_size,
            max_decompressed_size: settings.max_decompressed_size,
            max_xml_depth: settings.max_xml_depth,
        }
    }
}

/// A decoded rack document plus advisory warnings raised while decoding
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    root: XmlElement,
    warnings: Vec<String>,
}

impl ParsedDocument {
    /// Wrap an already parsed tree, e.g. one built in memory
    pub fn new(root: XmlElement, warnings: Vec<String>) -> Self {
        Self { root, warnings }
    }

    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

/// Read a rack file from disk, enforcing the size bounds before reading it whole
pub fn read_rack_file(path: &Path, limits: &DecodeLimits) -> Result<Vec<u8>, DecodeError> {
    let source = path.display().to_string();
    let result = read_checked(path, limits);
    if let Err(e) = &result {
        e.log(&source);
    }
    result
}

fn read_checked(path: &Path, limits: &DecodeLimits) -> Result<Vec<u8>, DecodeError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| DecodeError::NotFound(format!("{}: {}", path.display(), e)))?;
    if !metadata.is_file() {
        return Err(DecodeError::NotFound(format!(
            "{}: not a regular file",
            path.display()
        )));
    }
    check_size(metadata.len(), limits)?;

    std::fs::read(path).map_err(|e| DecodeError::NotFound(format!("{}: {}", path.display(), e)))
}

/// Decode raw container bytes into a parsed document
pub fn decode(bytes: &[u8], limits: &DecodeLimits) -> Result<ParsedDocument, DecodeError> {
    let result = decode_inner(bytes, limits);
    if let Err(e) = &result {
        e.log("<bytes>");
    }
    result
}

fn decode_inner(bytes: &[u8], limits: &DecodeLimits) -> Result<ParsedDocument, DecodeError> {
    check_size(bytes.len() as u64, limits)?;

    let raw = decompress(bytes, limits.max_decompressed_size)?;
    if raw.is_empty() {
        return Err(DecodeError::EmptyContent);
    }
    debug!(
        compressed = bytes.len(),
        decompressed = raw.len(),
        "Decompressed rack container"
    );

    let text = std::str::from_utf8(&raw).map_err(|_| DecodeError::NotXml)?;
    let text = text.strip_prefix(UTF8_BOM).unwrap_or(text).trim();
    if text.is_empty() {
        return Err(DecodeError::EmptyContent);
    }
    if !text.starts_with('<') {
        return Err(DecodeError::NotXml);
    }

    let root = xml::parse_document(text, limits.max_xml_depth)?;

    let mut warnings = Vec::new();
    if !EXPECTED_ROOT_TAGS.contains(&root.name()) {
        let msg = format!(
            "Unexpected root element '{}' (expected one of: {})",
            root.name(),
            EXPECTED_ROOT_TAGS.join(", ")
        );
        warn!(root = root.name(), "{}", msg);
        warnings.push(msg);
    }

    Ok(ParsedDocument::new(root, warnings))
}

fn check_size(size: u64, limits: &DecodeLimits) -> Result<(), DecodeError> {
    if size < limits.min_file_size {
        return Err(DecodeError::TooSmall {
            size,
            min: limits.min_file_size,
        });
    }
    if size > limits.max_file_size {
        return Err(DecodeError::TooLarge {
            size,
            max: limits.max_file_size,
        });
    }
    Ok(())
}

/// zlib header: CM = 8 (deflate), CINFO ≤ 7, and CMF·256 + FLG divisible by 31
fn is_zlib_header(bytes: &[u8]) -> bool {
    match bytes {
        [cmf, flg, ..] => {
            cmf & 0x0f == 8 && cmf >> 4 <= 7 && (u16::from(*cmf) * 256 + u16::from(*flg)) % 31 == 0
        }
        _ => false,
    }
}

fn decompress(bytes: &[u8], max_output: u64) -> Result<Vec<u8>, DecodeError> {
    let mut out = Vec::new();
    // Read one byte past the cap so an oversized stream is detectable
    let read = if bytes.starts_with(&GZIP_MAGIC) {
        MultiGzDecoder::new(bytes)
            .take(max_output.saturating_add(1))
            .read_to_end(&mut out)
    } else if is_zlib_header(bytes) {
        ZlibDecoder::new(bytes)
            .take(max_output.saturating_add(1))
            .read_to_end(&mut out)
    } else {
        return Err(DecodeError::DecompressionFailed(
            "not a gzip or zlib stream".to_string(),
        ));
    };

    read.map_err(|e| DecodeError::DecompressionFailed(e.to_string()))?;

    if out.len() as u64 > max_output {
        return Err(DecodeError::TooLarge {
            size: out.len() as u64,
            max: max_output,
        });
    }
    Ok(out)
}
