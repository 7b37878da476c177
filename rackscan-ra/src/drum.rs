//! Drum rack annotation
//!
//! Adds per-pad metadata (key/velocity zones, MIDI note, GM-style drum
//! label) to the top-level chains of a drum rack and counts pad
//! statistics in the same pass.

use crate::registry::{drum_type_label, note_name, DeviceCategory, DeviceType};
use crate::types::{AnalysisResult, Chain, DrumAnnotation, DrumStats, RackType};
use tracing::debug;

/// Annotate the pads of a drum rack; other rack types pass through untouched
pub fn annotate_drum(mut result: AnalysisResult) -> AnalysisResult {
    if result.rack_type != RackType::Drum {
        return result;
    }

    let mut stats = DrumStats::default();
    for chain in &mut result.chains {
        chain.drum_annotation = Some(annotate_pad(chain));
        record_pad(&mut stats, chain);
    }

    debug!(
        total = stats.total_pads,
        active = stats.active_pads,
        sample_based = stats.sample_based_pads,
        synthesized = stats.synthesized_pads,
        "Drum pad statistics"
    );

    result.drum_statistics = Some(stats);
    result
}

fn annotate_pad(chain: &Chain) -> DrumAnnotation {
    let zones = &chain.zones;
    let midi_note = zones.key_range.and_then(|r| r.single_note());

    DrumAnnotation {
        key_range: zones.key_range,
        velocity_range: zones.velocity_range,
        midi_note,
        note_name: midi_note.and_then(note_name),
        drum_type_label: midi_note
            .and_then(drum_type_label)
            .map(str::to_string),
        pad_name: zones.explicit_name.clone(),
    }
}

/// Count one pad; the first sampler or drum synth on the pad decides its kind
fn record_pad(stats: &mut DrumStats, chain: &Chain) {
    stats.total_pads += 1;
    if chain.devices.is_empty() {
        return;
    }
    stats.active_pads += 1;
    if chain.devices.len() > 1 {
        stats.chained_pads += 1;
    }

    let source = chain.devices.iter().find_map(|d| {
        match DeviceType::from_tag(&d.device_type).category() {
            category @ (DeviceCategory::Sampler | DeviceCategory::DrumSynth) => Some(category),
            _ => None,
        }
    });
    match source {
        Some(DeviceCategory::Sampler) => stats.sample_based_pads += 1,
        Some(DeviceCategory::DrumSynth) => stats.synthesized_pads += 1,
        _ => {}
    }
}
