//! Rack and device-type registry
//!
//! Compile-time tables:
//! - raw device tag → canonical display name ([`DeviceType`])
//! - rack tag → branch preset child tag ([`branch_child_tag`])
//! - device category used by drum statistics ([`DeviceCategory`])
//! - MIDI note → drum label and note name
//!
//! Unknown tags are never an error: they fall through to
//! [`DeviceType::Unknown`] and keep their raw tag as display name, so
//! devices from newer Live versions still analyze.

use std::collections::BTreeMap;

/// Generates the closed device enum plus its tag and name lookups
macro_rules! device_types {
    ($($variant:ident => $tag:literal : $name:literal),* $(,)?) => {
        /// Known device tags, plus a fallback for anything unrecognized
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum DeviceType {
            $($variant,)*
            Unknown(String),
        }

        impl DeviceType {
            /// Map a raw XML tag to its device type
            pub fn from_tag(tag: &str) -> Self {
                match tag {
                    $($tag => DeviceType::$variant,)*
                    other => DeviceType::Unknown(other.to_string()),
                }
            }

            /// Raw XML tag
            pub fn tag(&self) -> &str {
                match self {
                    $(DeviceType::$variant => $tag,)*
                    DeviceType::Unknown(raw) => raw,
                }
            }

            /// Canonical display name; unknown tags fall back to themselves
            pub fn canonical_name(&self) -> &str {
                match self {
                    $(DeviceType::$variant => $name,)*
                    DeviceType::Unknown(raw) => raw,
                }
            }
        }
    };
}

device_types! {
    // Audio effects
    AlignDelay => "AlignDelay": "Align Delay",
    Amp => "Amp": "Amp",
    AudioEffectGroupDevice => "AudioEffectGroupDevice": "Audio Effect Rack",
    AutoFilter => "AutoFilter": "Auto Filter",
    AutoPan => "AutoPan": "Auto Pan",
    AutoShift => "AutoShift": "Auto Shift",
    BeatRepeat => "BeatRepeat": "Beat Repeat",
    Cabinet => "Cabinet": "Cabinet",
    ChannelEq => "ChannelEq": "Channel EQ",
    Chorus => "Chorus": "Chorus-Ensemble",
    ChromaticChorus => "ChromaticChorus": "Chorus-Ensemble",
    ChorusEnsemble => "ChorusEnsemble": "Chorus-Ensemble",
    Compressor2 => "Compressor2": "Compressor",
    Compressor => "Compressor": "Compressor",
    Corpus => "Corpus": "Corpus",
    Delay => "Delay": "Delay",
    DrumBuss => "DrumBuss": "Drum Buss",
    DynamicTube => "DynamicTube": "Dynamic Tube",
    Tube => "Tube": "Dynamic Tube",
    Echo => "Echo": "Echo",
    EnvelopeFollower => "EnvelopeFollower": "Envelope Follower",
    FilterEq3 => "FilterEQ3": "EQ Three",
    Eq3 => "Eq3": "EQ Three",
    EqThree => "EQThree": "EQ Three",
    Eq8 => "Eq8": "EQ Eight",
    EqEight => "EQEight": "EQ Eight",
    Erosion => "Erosion": "Erosion",
    ExternalAudioEffect => "ExternalAudioEffect": "External Audio Effect",
    FilterDelay => "FilterDelay": "Filter Delay",
    Flanger => "Flanger": "Flanger",
    Frequency => "Frequency": "Frequency Shifter",
    FrequencyShifter => "FrequencyShifter": "Frequency Shifter",
    Gate => "Gate": "Gate",
    GlueCompressor => "GlueCompressor": "Glue Compressor",
    GrainDelay => "GrainDelay": "Grain Delay",
    HybridReverb => "HybridReverb": "Hybrid Reverb",
    Lfo => "LFO": "LFO",
    Limiter => "Limiter": "Limiter",
    Looper => "Looper": "Looper",
    MultibandCompressor => "MultibandCompressor": "Multiband Dynamics",
    MultibandDynamics => "MultibandDynamics": "Multiband Dynamics",
    Overdrive => "Overdrive": "Overdrive",
    Pedal => "Pedal": "Pedal",
    Phaser => "Phaser": "Phaser",
    PhaserFlanger => "PhaserFlanger": "Phaser-Flanger",
    PhaserNew => "PhaserNew": "Phaser-Flanger",
    PitchHack => "PitchHack": "Pitch Hack",
    Redux => "Redux": "Redux",
    Resonators => "Resonators": "Resonators",
    Reverb => "Reverb": "Reverb",
    Roar => "Roar": "Roar",
    Saturator => "Saturator": "Saturator",
    Shaper => "Shaper": "Shaper",
    Shifter => "Shifter": "Shifter",
    SpectralResonator => "SpectralResonator": "Spectral Resonator",
    SpectralTime => "SpectralTime": "Spectral Time",
    Spectrum => "Spectrum": "Spectrum",
    StereoGain => "StereoGain": "Utility",
    SurroundPanner => "SurroundPanner": "Surround Panner",
    Tuner => "Tuner": "Tuner",
    Utility => "Utility": "Utility",
    VinylDistortion => "VinylDistortion": "Vinyl Distortion",
    Vocoder => "Vocoder": "Vocoder",

    // Instruments
    Analog => "Analog": "Analog",
    AnalogDevice => "AnalogDevice": "Analog",
    UltraAnalog => "UltraAnalog": "Analog",
    Bass => "Bass": "Bass",
    Collision => "Collision": "Collision",
    Drift => "Drift": "Drift",
    DrumGroupDevice => "DrumGroupDevice": "Drum Rack",
    DrumRack => "DrumRack": "Drum Rack",
    DrumSampler => "DrumSampler": "Drum Sampler",
    Electric => "Electric": "Electric",
    LoungeLizard => "LoungeLizard": "Electric",
    ExternalInstrument => "ExternalInstrument": "External Instrument",
    Granulator => "Granulator": "Granulator III",
    GranulatorIii => "GranulatorIII": "Granulator III",
    Impulse => "Impulse": "Impulse",
    InstrumentImpulse => "InstrumentImpulse": "Impulse",
    InstrumentGroupDevice => "InstrumentGroupDevice": "Instrument Rack",
    InstrumentRack => "InstrumentRack": "Instrument Rack",
    Meld => "Meld": "Meld",
    MidiEffectGroupDevice => "MidiEffectGroupDevice": "MIDI Effect Rack",
    Operator => "Operator": "Operator",
    Poli => "Poli": "Poli",
    Sampler => "Sampler": "Sampler",
    MultiSampler => "MultiSampler": "Sampler",
    Simpler => "Simpler": "Simpler",
    OriginalSimpler => "OriginalSimpler": "Simpler",
    Tension => "Tension": "Tension",
    StringStudio => "StringStudio": "Tension",
    Wavetable => "Wavetable": "Wavetable",
    InstrumentVector => "InstrumentVector": "Wavetable",

    // Drum synths
    BassDrum => "BassDrum": "Bass Drum",
    Clap => "Clap": "Clap",
    Cymbal => "Cymbal": "Cymbal",
    FmDrum => "FMDrum": "FM Drum",
    HiHat => "HiHat": "Hi Hat",
    Kick => "Kick": "Kick",
    Perc => "Perc": "Perc",
    Snare => "Snare": "Snare",
    Tom => "Tom": "Tom",
    DsAnalog => "DSAnalog": "DS Analog",
    DsClang => "DSClang": "DS Clang",
    DsClap => "DSClap": "DS Clap",
    DsCymbal => "DSCymbal": "DS Cymbal",
    DsDrum => "DSDrum": "DS Drum",
    DsFm => "DSFM": "DS FM",
    DsHh => "DSHH": "DS HH",
    DsKick => "DSKick": "DS Kick",
    DsPenta => "DSPenta": "DS Penta",
    DsSnare => "DSSnare": "DS Snare",
    DsTom => "DSTom": "DS Tom",

    // MIDI effects
    Arpeggiate => "Arpeggiate": "Arpeggiator",
    Arpeggiator => "Arpeggiator": "Arpeggiator",
    MidiArpeggiator => "MidiArpeggiator": "Arpeggiator",
    CcControl => "CCControl": "CC Control",
    Chord => "Chord": "Chord",
    MidiChord => "MidiChord": "Chord",
    NoteEcho => "NoteEcho": "Note Echo",
    NoteLength => "NoteLength": "Note Length",
    MidiNoteLength => "MidiNoteLength": "Note Length",
    Pitch => "Pitch": "Pitch",
    MidiPitcher => "MidiPitcher": "Pitch",
    Random => "Random": "Random",
    MidiRandom => "MidiRandom": "Random",
    Scale => "Scale": "Scale",
    MidiScale => "MidiScale": "Scale",
    Velocity => "Velocity": "Velocity",
    MidiVelocity => "MidiVelocity": "Velocity",

    // CV Tools
    CvInstrument => "CVInstrument": "CV Instrument",
    CvLfo => "CVLFO": "CV LFO",
    CvUtility => "CVUtility": "CV Utility",
}

/// Coarse device role, used for drum pad classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceCategory {
    Sampler,
    DrumSynth,
    DrumEffect,
    Rack,
    Other,
}

impl DeviceType {
    pub fn category(&self) -> DeviceCategory {
        use DeviceType::*;
        match self {
            Sampler | MultiSampler | Simpler | OriginalSimpler | Impulse | InstrumentImpulse
            | DrumSampler => DeviceCategory::Sampler,

            BassDrum | Clap | Cymbal | FmDrum | HiHat | Kick | Perc | Snare | Tom | DsAnalog
            | DsClang | DsClap | DsCymbal | DsDrum | DsFm | DsHh | DsKick | DsPenta | DsSnare
            | DsTom => DeviceCategory::DrumSynth,

            DrumBuss | GlueCompressor | Compressor | Compressor2 | MultibandDynamics
            | MultibandCompressor => DeviceCategory::DrumEffect,

            AudioEffectGroupDevice | InstrumentGroupDevice | MidiEffectGroupDevice
            | DrumGroupDevice | DrumRack | InstrumentRack => DeviceCategory::Rack,

            _ => DeviceCategory::Other,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, DeviceType::Unknown(_))
    }
}

/// Canonical display name for a raw tag, or the tag itself when unmapped
pub fn canonical_name(raw_tag: &str) -> String {
    DeviceType::from_tag(raw_tag).canonical_name().to_string()
}

/// Branch preset tag holding the chains of a group device
///
/// `None` for leaf devices (and for `DrumRack`, which never carries
/// chains directly).
pub fn branch_child_tag(rack_tag: &str) -> Option<&'static str> {
    match rack_tag {
        "DrumGroupDevice" | "InstrumentGroupDevice" => Some("InstrumentBranchPreset"),
        "AudioEffectGroupDevice" => Some("AudioEffectBranchPreset"),
        "MidiEffectGroupDevice" => Some("MidiEffectBranchPreset"),
        _ => None,
    }
}

/// Secondary branch tag accepted when the primary one is absent
///
/// Drum racks saved by recent Live versions store pads as `DrumBranchPreset`.
pub fn alternate_branch_tag(rack_tag: &str) -> Option<&'static str> {
    match rack_tag {
        "DrumGroupDevice" => Some("DrumBranchPreset"),
        _ => None,
    }
}

/// Group device tags in detection priority order
pub const RACK_DEVICE_TAGS: [&str; 4] = [
    "DrumGroupDevice",
    "InstrumentGroupDevice",
    "AudioEffectGroupDevice",
    "MidiEffectGroupDevice",
];

/// General-MIDI style drum label for a pad note
pub fn drum_type_label(note: i32) -> Option<&'static str> {
    match note {
        36 => Some("Kick"),
        38 | 40 => Some("Snare"),
        42 => Some("Hi-Hat Closed"),
        44 => Some("Hi-Hat Pedal"),
        46 => Some("Hi-Hat Open"),
        49 => Some("Crash"),
        51 => Some("Ride"),
        57 => Some("Crash 2"),
        59 => Some("Ride 2"),
        _ => None,
    }
}

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Live's note naming: 0 = C-2, 36 = C1, 60 = C3
pub fn note_name(note: i32) -> Option<String> {
    if !(0..=127).contains(&note) {
        return None;
    }
    let octave = note / 12 - 2;
    Some(format!("{}{}", NOTE_NAMES[(note % 12) as usize], octave))
}

/// Canonical names with user-configured overrides applied first
#[derive(Debug, Clone, Default)]
pub struct DeviceRegistry {
    overrides: BTreeMap<String, String>,
}

impl DeviceRegistry {
    pub fn new(overrides: BTreeMap<String, String>) -> Self {
        Self { overrides }
    }

    pub fn canonical_name(&self, raw_tag: &str) -> String {
        match self.overrides.get(raw_tag) {
            Some(name) => name.clone(),
            None => canonical_name(raw_tag),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_tags_resolve() {
        assert_eq!(canonical_name("Eq8"), "EQ Eight");
        assert_eq!(canonical_name("DSHH"), "DS HH");
        assert_eq!(canonical_name("InstrumentVector"), "Wavetable");
        assert_eq!(canonical_name("AudioEffectGroupDevice"), "Audio Effect Rack");
    }

    #[test]
    fn test_unknown_tag_falls_back_to_itself() {
        let ty = DeviceType::from_tag("FutureDevice2031");
        assert!(!ty.is_known());
        assert_eq!(ty.tag(), "FutureDevice2031");
        assert_eq!(canonical_name("FutureDevice2031"), "FutureDevice2031");
    }

    #[test]
    fn test_tag_round_trips_for_irregular_variant_names() {
        for tag in ["LFO", "FilterEQ3", "CCControl", "DSFM", "GranulatorIII"] {
            let ty = DeviceType::from_tag(tag);
            assert!(ty.is_known(), "{} should be known", tag);
            assert_eq!(ty.tag(), tag);
        }
    }

    #[test]
    fn test_branch_child_tags() {
        assert_eq!(branch_child_tag("DrumGroupDevice"), Some("InstrumentBranchPreset"));
        assert_eq!(branch_child_tag("InstrumentGroupDevice"), Some("InstrumentBranchPreset"));
        assert_eq!(branch_child_tag("AudioEffectGroupDevice"), Some("AudioEffectBranchPreset"));
        assert_eq!(branch_child_tag("MidiEffectGroupDevice"), Some("MidiEffectBranchPreset"));
        assert_eq!(branch_child_tag("Operator"), None);
        assert_eq!(branch_child_tag("DrumRack"), None);
    }

    #[test]
    fn test_categories() {
        assert_eq!(DeviceType::from_tag("MultiSampler").category(), DeviceCategory::Sampler);
        assert_eq!(DeviceType::from_tag("DSKick").category(), DeviceCategory::DrumSynth);
        assert_eq!(DeviceType::from_tag("GlueCompressor").category(), DeviceCategory::DrumEffect);
        assert_eq!(DeviceType::from_tag("Operator").category(), DeviceCategory::Other);
        assert_eq!(DeviceType::from_tag("Whatever").category(), DeviceCategory::Other);
    }

    #[test]
    fn test_drum_labels() {
        assert_eq!(drum_type_label(36), Some("Kick"));
        assert_eq!(drum_type_label(40), Some("Snare"));
        assert_eq!(drum_type_label(44), Some("Hi-Hat Pedal"));
        assert_eq!(drum_type_label(37), None);
    }

    #[test]
    fn test_note_names() {
        assert_eq!(note_name(36).as_deref(), Some("C1"));
        assert_eq!(note_name(0).as_deref(), Some("C-2"));
        assert_eq!(note_name(61).as_deref(), Some("C#3"));
        assert_eq!(note_name(127).as_deref(), Some("G8"));
        assert_eq!(note_name(128), None);
        assert_eq!(note_name(-1), None);
    }

    #[test]
    fn test_overrides_win() {
        let mut overrides = BTreeMap::new();
        overrides.insert("Operator".to_string(), "FM Synth".to_string());
        let registry = DeviceRegistry::new(overrides);
        assert_eq!(registry.canonical_name("Operator"), "FM Synth");
        assert_eq!(registry.canonical_name("Saturator"), "Saturator");
    }
}
