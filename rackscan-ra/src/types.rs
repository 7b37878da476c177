//! Analysis data model
//!
//! Built once per file by the tree builder, optionally annotated, then
//! serialized. Field declaration order is the JSON field order.

use serde::{Deserialize, Serialize};

/// Rack variant of the analyzed file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RackType {
    AudioEffect,
    Instrument,
    Midi,
    Drum,
    /// Detection failed
    Unknown,
}

impl RackType {
    /// Rack type for a detected main device tag
    pub fn from_device_tag(tag: &str) -> Self {
        match tag {
            "DrumRack" | "DrumGroupDevice" => RackType::Drum,
            "InstrumentGroupDevice" | "InstrumentRack" => RackType::Instrument,
            "AudioEffectGroupDevice" => RackType::AudioEffect,
            "MidiEffectGroupDevice" => RackType::Midi,
            _ => RackType::Unknown,
        }
    }

    /// Name used for chains without an explicit `Name`
    pub fn default_chain_name(&self, index: usize) -> String {
        match self {
            RackType::Drum => format!("Drum Pad {}", index + 1),
            _ => format!("Chain {}", index + 1),
        }
    }

    /// Rack name used when every structural lookup fails
    pub fn unknown_rack_name(&self) -> &'static str {
        match self {
            RackType::Drum => "Unknown Drum Rack",
            _ => "Unknown Rack",
        }
    }
}

/// Live version that saved the file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub major: Option<i64>,
    pub minor: Option<i64>,
    pub build: Option<i64>,
    pub revision: Option<i64>,
    pub display: Option<String>,
    pub creator: Option<String>,
}

/// Named macro knob on the main rack device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroControl {
    pub name: String,
    pub value: f64,
    pub index: u8,
}

/// Inclusive MIDI range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRange {
    pub low: i32,
    pub high: i32,
}

impl NoteRange {
    /// The single note this range covers, if it covers exactly one
    pub fn single_note(&self) -> Option<i32> {
        (self.low == self.high).then_some(self.low)
    }
}

/// Key and velocity zones of a chain as read from its branch preset
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainZones {
    /// `Name` value when explicitly set and non-empty; feeds pad naming only
    #[serde(skip)]
    pub explicit_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_range: Option<NoteRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity_range: Option<NoteRange>,
}

impl ChainZones {
    /// No zone was declared
    pub fn is_unzoned(&self) -> bool {
        self.key_range.is_none() && self.velocity_range.is_none()
    }
}

/// One parallel path within a rack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chain {
    pub name: String,
    pub chain_index: usize,
    pub is_soloed: bool,
    pub devices: Vec<Device>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drum_annotation: Option<DrumAnnotation>,
    #[serde(default, skip_serializing_if = "ChainZones::is_unzoned")]
    pub zones: ChainZones,
}

/// One device inside a chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    #[serde(rename = "type")]
    pub device_type: String,
    pub standard_name: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset_name: Option<String>,
    pub is_on: bool,
    /// `Bypass/Manual`, when the device carries one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_bypassed: Option<bool>,
    pub nested_chains: Vec<Chain>,
}

impl Device {
    /// This device and every device nested below it, depth first
    pub fn walk(&self) -> Vec<&Device> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(device) = stack.pop() {
            out.push(device);
            for chain in device.nested_chains.iter().rev() {
                stack.extend(chain.devices.iter().rev());
            }
        }
        out
    }
}

/// Per-pad drum metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrumAnnotation {
    pub key_range: Option<NoteRange>,
    pub velocity_range: Option<NoteRange>,
    pub midi_note: Option<i32>,
    pub note_name: Option<String>,
    pub drum_type_label: Option<String>,
    pub pad_name: Option<String>,
}

/// Pad counters accumulated in one pass over the pads
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrumStats {
    pub total_pads: usize,
    pub active_pads: usize,
    pub chained_pads: usize,
    pub sample_based_pads: usize,
    pub synthesized_pads: usize,
}

/// External file referenced by the rack (usually a sample)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleReference {
    pub name: Option<String>,
    pub path: Option<String>,
    pub relative_path: Option<String>,
    pub path_type: Option<i64>,
}

/// Chain selector position of a rack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainSelector {
    pub value: f64,
    /// Automation target id, when the selector is automatable
    pub automation_target: Option<String>,
}

/// Macro knob mapped onto a device parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationMapping {
    pub macro_index: u32,
    pub parameter_id: String,
    pub min_value: f64,
    pub max_value: f64,
}

/// Result of analyzing one rack file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub rack_name: String,
    pub rack_type: RackType,
    pub detected_root_tag: String,
    pub detected_rack_tag: Option<String>,
    pub ableton_version: VersionInfo,
    pub macro_controls: Vec<MacroControl>,
    pub chains: Vec<Chain>,
    pub parsing_errors: Vec<String>,
    pub parsing_warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drum_statistics: Option<DrumStats>,
    #[serde(default)]
    pub sample_references: Vec<SampleReference>,
    /// Every `ChainSelector` in document order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chain_selectors: Vec<ChainSelector>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub automation_mappings: Vec<AutomationMapping>,
}

impl AnalysisResult {
    /// True when no structural errors were recorded
    pub fn is_clean(&self) -> bool {
        self.parsing_errors.is_empty()
    }

    /// Every device in the tree, depth first
    pub fn all_devices(&self) -> Vec<&Device> {
        self.chains
            .iter()
            .flat_map(|c| c.devices.iter())
            .flat_map(Device::walk)
            .collect()
    }

    /// Deepest populated `nested_chains` level (0 when no device nests chains)
    pub fn max_nesting_depth(&self) -> usize {
        fn chain_depth(chain: &Chain) -> usize {
            chain
                .devices
                .iter()
                .filter(|d| !d.nested_chains.is_empty())
                .map(|d| 1 + d.nested_chains.iter().map(chain_depth).max().unwrap_or(0))
                .max()
                .unwrap_or(0)
        }
        self.chains.iter().map(chain_depth).max().unwrap_or(0)
    }
}

/// Complexity level bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityLevel {
    Low,
    Moderate,
    High,
    Extreme,
}

/// Output of the performance heuristics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub chain_count: usize,
    pub total_device_count: usize,
    pub heavy_device_count: usize,
    pub complexity_score: f64,
    pub complexity_level: ComplexityLevel,
    pub recommendations: Vec<String>,
}

/// Live edition tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Edition {
    Intro,
    Standard,
    Suite,
}

/// Lowest Live edition able to load every device in the rack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditionReport {
    pub required_edition: Edition,
    pub suite_devices: Vec<String>,
    pub standard_devices: Vec<String>,
    pub total_devices: usize,
}

/// Exported envelope: the analysis plus derived reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    #[serde(flatten)]
    pub analysis: AnalysisResult,
    pub performance: Option<PerformanceReport>,
    pub edition: Option<EditionReport>,
    pub file_hash: Option<String>,
    pub source_file: Option<String>,
}
