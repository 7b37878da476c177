//! Rack file scanner
//!
//! Recursive `.adg`/`.adv` discovery. Symlinks are not followed, system
//! clutter (`.DS_Store`, `__MACOSX`, VCS folders) is skipped, and unreadable
//! entries are logged and skipped rather than aborting the scan.

use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

/// Rack file scanner errors
#[derive(Debug, Error)]
pub enum ScanError {
    /// Specified path does not exist
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// Path is a file without a rack extension
    #[error("Not a rack file (.adg/.adv): {0}")]
    NotARackFile(PathBuf),
}

/// File extensions of rack presets
pub const RACK_EXTENSIONS: [&str; 2] = ["adg", "adv"];

/// Whether the path carries a rack extension (case-insensitive)
pub fn is_rack_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| RACK_EXTENSIONS.contains(&ext.as_str()))
}

/// Rack file scanner
pub struct RackFileScanner {
    ignore_patterns: Vec<String>,
    max_depth: Option<usize>,
}

impl Default for RackFileScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl RackFileScanner {
    /// Create new scanner with default ignore patterns
    pub fn new() -> Self {
        Self {
            ignore_patterns: vec![
                ".DS_Store".to_string(),
                "Thumbs.db".to_string(),
                "__MACOSX".to_string(),
                ".git".to_string(),
                ".svn".to_string(),
            ],
            max_depth: None,
        }
    }

    /// Limit directory recursion (1 = only the given directory)
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// Rack files under `root_path`, sorted
    ///
    /// A file path is returned as-is when it has a rack extension.
    pub fn scan(&self, root_path: &Path) -> Result<Vec<PathBuf>, ScanError> {
        if !root_path.exists() {
            return Err(ScanError::PathNotFound(root_path.to_path_buf()));
        }

        if root_path.is_file() {
            return if is_rack_file(root_path) {
                Ok(vec![root_path.to_path_buf()])
            } else {
                Err(ScanError::NotARackFile(root_path.to_path_buf()))
            };
        }

        let walker = WalkDir::new(root_path)
            .follow_links(false)
            .max_depth(self.max_depth.unwrap_or(usize::MAX))
            .into_iter()
            .filter_entry(|e| self.should_process_entry(e));

        let mut files = Vec::new();
        for entry in walker {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_file() && is_rack_file(entry.path()) {
                        files.push(entry.path().to_path_buf());
                    }
                }
                Err(e) => {
                    tracing::warn!("Error accessing entry: {}", e);
                    // Continue scanning, don't abort
                }
            }
        }

        files.sort();
        tracing::debug!(
            root = %root_path.display(),
            count = files.len(),
            "Rack file scan complete"
        );
        Ok(files)
    }

    /// Scan several roots, skipping (and logging) the ones that fail
    pub fn scan_all(&self, roots: &[PathBuf]) -> (Vec<PathBuf>, Vec<ScanError>) {
        let mut files = Vec::new();
        let mut errors = Vec::new();
        for root in roots {
            match self.scan(root) {
                Ok(found) => files.extend(found),
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping input path");
                    errors.push(e);
                }
            }
        }
        files.sort();
        files.dedup();
        (files, errors)
    }

    /// Ignore patterns match whole entry names; the scan root is always walked
    fn should_process_entry(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 {
            return true;
        }
        let file_name = entry.file_name().to_string_lossy();
        !self
            .ignore_patterns
            .iter()
            .any(|pattern| file_name == pattern.as_str())
    }
}
