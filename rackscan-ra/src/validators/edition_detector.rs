//! Edition Detector
//!
//! Finds the lowest Live edition (Intro, Standard, Suite) able to load every
//! device in a rack, nested racks included. Device tags and standard names
//! are normalized (lowercase, digits and punctuation removed) before lookup,
//! so `Compressor2` and `Compressor` are the same device.

use crate::types::{AnalysisResult, Device, Edition, EditionReport};
use tracing::debug;

/// Devices that ship only with Suite
const SUITE_ONLY_DEVICES: &[&str] = &[
    "operator",
    "analog",
    "collision",
    "tension",
    "electric",
    "sampler",
    "wavetable",
    "poli",
    "bass",
    "drift",
    "meld",
    "amp",
    "cabinet",
    "corpus",
    "drumbuss",
    "echo",
    "filterdelay",
    "gluecompressor",
    "hybridreverb",
    "multibandcompressor",
    "multibanddynamics",
    "overdrive",
    "pedal",
    "resonators",
    "saturator",
    "vocoder",
];

/// Devices that need at least Standard
const STANDARD_DEVICES: &[&str] = &[
    "eq",
    "eqeight",
    "compressor",
    "autofilter",
    "reverb",
    "delay",
    "chorus",
    "phaser",
    "flanger",
    "autopan",
    "gate",
    "limiter",
    "beatrepeat",
    "looper",
    "grain",
    "simpler",
    "impulse",
    "drumrack",
];

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Edition Detector
#[derive(Debug, Default)]
pub struct EditionDetector;

impl EditionDetector {
    pub fn new() -> Self {
        Self
    }

    fn edition_of(device: &Device) -> Edition {
        let keys = [normalize(&device.device_type), normalize(&device.standard_name)];
        if keys.iter().any(|k| SUITE_ONLY_DEVICES.contains(&k.as_str())) {
            Edition::Suite
        } else if keys.iter().any(|k| STANDARD_DEVICES.contains(&k.as_str())) {
            Edition::Standard
        } else {
            Edition::Intro
        }
    }

    /// Walk the device tree in document order
    ///
    /// Every Suite device is listed. A Standard device is listed only while
    /// the verdict is still Intro, so `standard_devices` names the device
    /// that first raised the requirement, and nothing once Suite is reached.
    pub fn detect(&self, result: &AnalysisResult) -> EditionReport {
        let devices = result.all_devices();
        let mut report = EditionReport {
            required_edition: Edition::Intro,
            suite_devices: Vec::new(),
            standard_devices: Vec::new(),
            total_devices: devices.len(),
        };

        for device in devices {
            match Self::edition_of(device) {
                Edition::Suite => {
                    report.suite_devices.push(device.display_name.clone());
                    report.required_edition = Edition::Suite;
                }
                Edition::Standard if report.required_edition == Edition::Intro => {
                    report.standard_devices.push(device.display_name.clone());
                    report.required_edition = Edition::Standard;
                }
                Edition::Standard | Edition::Intro => {}
            }
        }

        debug!(
            required = ?report.required_edition,
            suite = report.suite_devices.len(),
            standard = report.standard_devices.len(),
            "Detected required edition"
        );
        report
    }
}
