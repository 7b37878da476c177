//! Test Helper Utilities
//!
//! Shared utilities for testing rackscan-ra

#![allow(dead_code)]

pub mod rack_fixtures;

pub use rack_fixtures::{
    audio_chain, audio_effect_rack, bypassable_device, device, doubly_located_rack,
    drum_branch_pad, drum_pad, drum_rack, gzip, mapped_audio_rack, nested_audio_rack, write_rack,
    zlib,
};

use rackscan_common::AnalysisSettings;
use rackscan_ra::RackAnalyzer;

/// Analyzer with default settings except the minimum file size, which tiny
/// fixtures would otherwise trip
pub fn test_analyzer() -> RackAnalyzer {
    let analysis = AnalysisSettings {
        min_file_size: 0,
        ..AnalysisSettings::default()
    };
    RackAnalyzer::new(&analysis, &Default::default())
}
