//! Rack Fixture Generator
//!
//! Builds rack preset XML the way Live lays it out and packs it into
//! gzip containers.

use flate2::write::{GzEncoder, ZlibEncoder};
use flate2::Compression;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Gzip-compress a document
pub fn gzip(xml: &str) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(xml.as_bytes()).unwrap();
    encoder.finish().unwrap()
}

/// Zlib-compress arbitrary bytes
pub fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Write a gzipped rack file into `dir`
pub fn write_rack(dir: &Path, file_name: &str, xml: &str) -> PathBuf {
    let path = dir.join(file_name);
    std::fs::write(&path, gzip(xml)).unwrap();
    path
}

/// A plain device inside a chain's `DevicePresets`
pub fn device(tag: &str, user_name: Option<&str>) -> String {
    let user_name = user_name
        .map(|n| format!(r#"<UserName Value="{}"/>"#, n))
        .unwrap_or_default();
    format!(
        r#"<AbletonDevicePreset><Device><{tag}><On><Manual Value="true"/></On>{user_name}</{tag}></Device></AbletonDevicePreset>"#
    )
}

/// An audio effect chain holding `devices`
pub fn audio_chain(name: &str, devices: &[String]) -> String {
    format!(
        r#"<AudioEffectBranchPreset><Name Value="{}"/><IsSoloed Value="false"/><DevicePresets>{}</DevicePresets></AudioEffectBranchPreset>"#,
        name,
        devices.concat()
    )
}

/// A drum pad mapped to a single note
pub fn drum_pad(name: Option<&str>, note: i32, devices: &[String]) -> String {
    let name = name
        .map(|n| format!(r#"<Name Value="{}"/>"#, n))
        .unwrap_or_default();
    format!(
        r#"<InstrumentBranchPreset>{name}<IsSoloed Value="false"/><DevicePresets>{}</DevicePresets><KeyRange><Min Value="{note}"/><Max Value="{note}"/></KeyRange><VelocityRange><Min Value="1"/><Max Value="127"/></VelocityRange></InstrumentBranchPreset>"#,
        devices.concat()
    )
}

/// A drum pad saved with Live's drum-specific branch tag
pub fn drum_branch_pad(name: Option<&str>, note: i32, devices: &[String]) -> String {
    drum_pad(name, note, devices).replace("InstrumentBranchPreset", "DrumBranchPreset")
}

/// A device whose `Bypass` switch is set to `bypassed`
pub fn bypassable_device(tag: &str, bypassed: bool) -> String {
    format!(
        r#"<AbletonDevicePreset><Device><{tag}><On><Manual Value="true"/></On><Bypass><Manual Value="{bypassed}"/></Bypass></{tag}></Device></AbletonDevicePreset>"#
    )
}

/// A nested audio effect rack carrying `BranchPresets` both on the device
/// and on its enclosing preset
pub fn doubly_located_rack(local: &[String], parent: &[String]) -> String {
    format!(
        r#"<GroupDevicePreset><Device><AudioEffectGroupDevice><On><Manual Value="true"/></On><BranchPresets>{}</BranchPresets></AudioEffectGroupDevice></Device><BranchPresets>{}</BranchPresets></GroupDevicePreset>"#,
        local.concat(),
        parent.concat()
    )
}

/// Audio effect rack with an automated chain selector and macro mappings
pub fn mapped_audio_rack(name: &str, chains: &[String]) -> String {
    let body = format!(
        r#"{}<ChainSelector><Manual Value="12"/><AutomationTarget Id="2201"/></ChainSelector><MacroControlTarget MacroIndex="0" ParameterId="Drive" Min="0.1" Max="0.9"/><MacroControlTarget MacroIndex="3" ParameterId="Dry/Wet"/>"#,
        macros(&[("Drive", "64.5")])
    );
    document(name, "AudioEffectGroupDevice", &body, chains)
}

/// Complete audio effect rack document
pub fn audio_effect_rack(name: &str, chains: &[String]) -> String {
    document(name, "AudioEffectGroupDevice", &macros(&[("Drive", "64.5")]), chains)
}

/// Complete drum rack document
pub fn drum_rack(name: &str, pads: &[String]) -> String {
    document(name, "DrumGroupDevice", "", pads)
}

/// An audio effect rack with racks nested `levels` deep in its first chain
pub fn nested_audio_rack(levels: usize) -> String {
    let mut inner = audio_chain("Leaf", &[device("Saturator", None)]);
    for level in (1..=levels).rev() {
        let rack = format!(
            r#"<GroupDevicePreset><Device><AudioEffectGroupDevice><On><Manual Value="true"/></On></AudioEffectGroupDevice></Device><BranchPresets>{}</BranchPresets></GroupDevicePreset>"#,
            inner
        );
        inner = audio_chain(&format!("Level {}", level), &[rack]);
    }
    document("Deep", "AudioEffectGroupDevice", "", &[inner])
}

fn macros(controls: &[(&str, &str)]) -> String {
    controls
        .iter()
        .enumerate()
        .map(|(i, (name, value))| {
            format!(
                r#"<MacroDisplayNames.{i} Value="{name}"/><MacroControls.{i}><Manual Value="{value}"/></MacroControls.{i}>"#
            )
        })
        .collect()
}

fn document(name: &str, rack_tag: &str, rack_body: &str, branches: &[String]) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Ableton MajorVersion="5" MinorVersion="11.0_433" SchemaChangeCount="3" Creator="Ableton Live 11.3.4" Revision="19">
  <GroupDevicePreset>
    <Name Value="{name}"/>
    <Device><{rack_tag}><UserName Value=""/><On><Manual Value="true"/></On>{rack_body}</{rack_tag}></Device>
    <BranchPresets>{branches}</BranchPresets>
  </GroupDevicePreset>
</Ableton>"#,
        branches = branches.concat()
    )
}
