//! Services around the analysis core: file discovery and batch execution

pub mod batch_analyzer;
pub mod file_scanner;

pub use batch_analyzer::{analyze_batch, BatchOutcome};
pub use file_scanner::{RackFileScanner, ScanError};
