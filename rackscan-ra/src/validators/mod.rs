//! Derived reports over a finished analysis
//!
//! # Validators
//! 1. **performance_scorer** - CPU complexity score and recommendations
//! 2. **edition_detector** - Lowest Live edition that can load the rack

pub mod edition_detector;
pub mod performance_scorer;

pub use edition_detector::EditionDetector;
pub use performance_scorer::PerformanceScorer;
