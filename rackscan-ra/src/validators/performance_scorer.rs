//! Performance Scorer
//!
//! Estimates how CPU-hungry a rack is from its shape.
//!
//! # Scoring Algorithm
//! `complexity_score = min(100, 2 × chains + 1.5 × devices + 10 × heavy devices)`
//!
//! Counts cover the top-level chains and the devices placed directly in
//! them; devices inside nested racks are not counted.
//!
//! # Recommendations
//! - score above the freeze threshold → freeze to audio
//! - heavy devices above the limit → simpler alternatives
//! - chains above the split threshold → split the rack
//!
//! Rules are deterministic: the same result always yields the same report.

use crate::types::{AnalysisResult, ComplexityLevel, Device, PerformanceReport, RackType};
use rackscan_common::PerformanceSettings;
use tracing::debug;

/// Performance Scorer
pub struct PerformanceScorer {
    settings: PerformanceSettings,
}

impl Default for PerformanceScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl PerformanceScorer {
    /// Create new scorer with default thresholds and heavy-device list
    pub fn new() -> Self {
        Self {
            settings: PerformanceSettings::default(),
        }
    }

    /// Create scorer from configured settings
    pub fn with_settings(settings: PerformanceSettings) -> Self {
        Self { settings }
    }

    fn is_heavy(&self, device: &Device) -> bool {
        self.settings
            .heavy_devices
            .iter()
            .any(|h| *h == device.device_type || *h == device.standard_name)
    }

    fn level_for(&self, score: f64) -> ComplexityLevel {
        let t = &self.settings.complexity_thresholds;
        if score < t.low {
            ComplexityLevel::Low
        } else if score < t.medium {
            ComplexityLevel::Moderate
        } else if score < t.high {
            ComplexityLevel::High
        } else {
            ComplexityLevel::Extreme
        }
    }

    /// Score one analysis result
    pub fn score(&self, result: &AnalysisResult) -> PerformanceReport {
        let chain_count = result.chains.len();
        let devices: Vec<&Device> = result.chains.iter().flat_map(|c| c.devices.iter()).collect();
        let total_device_count = devices.len();
        let heavy_device_count = devices.iter().filter(|d| self.is_heavy(d)).count();

        let raw = 2.0 * chain_count as f64
            + 1.5 * total_device_count as f64
            + 10.0 * heavy_device_count as f64;
        let complexity_score = raw.min(100.0);

        let (rack_noun, chain_noun) = match result.rack_type {
            RackType::Drum => ("drum rack", "drum chains"),
            _ => ("rack", "chains"),
        };

        let mut recommendations = Vec::new();
        if complexity_score > self.settings.freeze_threshold {
            recommendations.push(format!(
                "High complexity {} - consider freezing to audio for better performance",
                rack_noun
            ));
        }
        if heavy_device_count > self.settings.heavy_device_limit {
            recommendations.push(
                "Multiple CPU-intensive devices detected - consider using simpler alternatives"
                    .to_string(),
            );
        }
        if chain_count > self.settings.chain_split_threshold {
            recommendations.push(format!(
                "Large number of {} - consider splitting into multiple racks",
                chain_noun
            ));
        }

        debug!(
            chain_count,
            total_device_count,
            heavy_device_count,
            complexity_score,
            "Scored rack complexity"
        );

        PerformanceReport {
            chain_count,
            total_device_count,
            heavy_device_count,
            complexity_score,
            complexity_level: self.level_for(complexity_score),
            recommendations,
        }
    }
}
