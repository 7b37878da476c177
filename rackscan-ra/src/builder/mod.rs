//! Rack tree builder
//!
//! Turns a parsed rack document into an [`AnalysisResult`]:
//! 1. Detect the main rack device (drum racks win, then the preset's own
//!    device, then any group device in the document)
//! 2. Read name, version and macros
//! 3. Walk `BranchPresets` → chains → `DevicePresets/*/Device/*` → devices,
//!    recursing into nested group devices up to `max_depth`
//!
//! Local failures never abort the walk. A malformed subtree is recorded in
//! `parsing_errors` (structural) or `parsing_warnings` (optional data) and
//! its siblings are still analyzed.

pub mod diagnostics;

pub use diagnostics::Diagnostics;

use crate::decoder::{ParsedDocument, XmlElement};
use crate::error::StructuralError;
use crate::metadata;
use crate::registry::{alternate_branch_tag, branch_child_tag, DeviceRegistry, RACK_DEVICE_TAGS};
use crate::types::{AnalysisResult, Chain, ChainZones, Device, NoteRange, RackType};
use rackscan_common::AnalysisSettings;
use tracing::{debug, info};

/// The detected main rack device
#[derive(Debug, Clone, Copy)]
pub struct RackRoot<'a> {
    pub tag: &'a str,
    pub element: &'a XmlElement,
}

/// Locate the main rack device
///
/// Priority: `DrumRack`, `DrumGroupDevice`, a group device directly under
/// `GroupDevicePreset/Device`, then the first group device of each kind.
pub fn detect_rack(root: &XmlElement) -> Option<RackRoot<'_>> {
    for tag in ["DrumRack", "DrumGroupDevice"] {
        if let Some(element) = root.find(tag) {
            return Some(RackRoot { tag, element });
        }
    }

    if let Some(device) = root.find("GroupDevicePreset").and_then(|p| p.child("Device")) {
        if let Some(element) = device
            .children()
            .iter()
            .find(|c| branch_child_tag(c.name()).is_some())
        {
            return Some(RackRoot {
                tag: element.name(),
                element,
            });
        }
    }

    RACK_DEVICE_TAGS.iter().find_map(|tag| {
        root.find(tag).map(|element| RackRoot {
            tag: element.name(),
            element,
        })
    })
}

/// Display/preset name pair for a device
///
/// A custom name that is present, non-empty and differs from the standard
/// name becomes the display name and demotes the standard name to
/// `preset_name`. Otherwise the standard name is shown and there is no
/// preset name.
pub fn resolve_names(standard_name: &str, custom_name: Option<&str>) -> (String, Option<String>) {
    match custom_name.map(str::trim) {
        Some(custom) if !custom.is_empty() && custom != standard_name => {
            (custom.to_string(), Some(standard_name.to_string()))
        }
        _ => (standard_name.to_string(), None),
    }
}

/// Where a nested group device's `BranchPresets` was found
#[derive(Debug, Clone, Copy)]
pub struct BranchLocation<'a> {
    pub presets: &'a XmlElement,
    /// The enclosing `GroupDevicePreset` also carries `BranchPresets`,
    /// which was ignored in favor of the device-local one
    pub ambiguous: bool,
}

/// `BranchPresets` of a nested group device
///
/// Live exports disagree on where this lives: some put it under the
/// device element, others under the enclosing `GroupDevicePreset`. The
/// device-local one wins; the parent is consulted only when it is a
/// `GroupDevicePreset`.
pub fn locate_branch_presets<'a>(
    device: &'a XmlElement,
    parent_preset: Option<&'a XmlElement>,
) -> Option<BranchLocation<'a>> {
    let parent = parent_preset
        .filter(|p| p.name() == "GroupDevicePreset")
        .and_then(|p| p.child("BranchPresets"));

    match (device.child("BranchPresets"), parent) {
        (Some(local), parent) => Some(BranchLocation {
            presets: local,
            ambiguous: parent.is_some(),
        }),
        (None, Some(parent)) => {
            debug!(device = device.name(), "Found BranchPresets at parent level");
            Some(BranchLocation {
                presets: parent,
                ambiguous: false,
            })
        }
        (None, None) => None,
    }
}

fn join_path(parent: &str, segment: &str) -> String {
    if parent.is_empty() {
        segment.to_string()
    } else {
        format!("{} > {}", parent, segment)
    }
}

/// Per-walk mutable state
struct WalkContext {
    rack_type: RackType,
    diagnostics: Diagnostics,
}

/// Builds analysis results from parsed documents
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    registry: DeviceRegistry,
    max_depth: usize,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::from_settings(&AnalysisSettings::default())
    }
}

impl TreeBuilder {
    pub fn new(registry: DeviceRegistry, max_depth: usize) -> Self {
        Self {
            registry,
            max_depth,
        }
    }

    pub fn from_settings(settings: &AnalysisSettings) -> Self {
        Self::new(
            DeviceRegistry::new(settings.custom_device_mappings.clone()),
            settings.max_depth,
        )
    }

    /// Build the analysis tree for one document
    ///
    /// `source_name` is the file name used as a last-resort rack name.
    pub fn build(&self, doc: &ParsedDocument, source_name: Option<&str>) -> AnalysisResult {
        let root = doc.root();
        let mut ctx = WalkContext {
            rack_type: RackType::Unknown,
            diagnostics: Diagnostics::with_warnings(doc.warnings()),
        };

        if root.find("GroupDevicePreset").is_none() {
            ctx.diagnostics
                .warn("Missing expected node: GroupDevicePreset (possibly different format)");
        }

        let ableton_version = metadata::extract_version(root);
        let rack = detect_rack(root);
        ctx.rack_type = rack
            .map(|r| RackType::from_device_tag(r.tag))
            .unwrap_or(RackType::Unknown);

        let rack_name = metadata::extract_name(root, source_name)
            .unwrap_or_else(|| ctx.rack_type.unknown_rack_name().to_string());

        let mut macro_controls = Vec::new();
        let mut chains = Vec::new();

        match rack {
            None => ctx
                .diagnostics
                .structural("", &StructuralError::UnknownRackType),
            Some(rack) => {
                info!(
                    rack_tag = rack.tag,
                    rack_name = %rack_name,
                    "Detected rack"
                );
                if rack.element.child("Name").is_none() && rack.element.child("UserName").is_none() {
                    ctx.diagnostics.warn(format!(
                        "Main device {} has no Name or UserName; its name may be unavailable",
                        rack.tag
                    ));
                }
                macro_controls = metadata::extract_macros(rack.element, &mut ctx.diagnostics);
                match self.rack_chains(root, rack, &mut ctx) {
                    Ok(found) => chains = found,
                    Err(e) => ctx.diagnostics.structural("", &e),
                }
            }
        }

        let chain_selectors = metadata::extract_chain_selectors(root, &mut ctx.diagnostics);
        let automation_mappings = metadata::extract_automation_mappings(root, &mut ctx.diagnostics);

        let rack_type = ctx.rack_type;
        let (parsing_errors, parsing_warnings) = ctx.diagnostics.into_parts();

        AnalysisResult {
            rack_name,
            rack_type,
            detected_root_tag: root.name().to_string(),
            detected_rack_tag: rack.map(|r| r.tag.to_string()),
            ableton_version,
            macro_controls,
            chains,
            parsing_errors,
            parsing_warnings,
            drum_statistics: None,
            sample_references: metadata::extract_sample_references(root),
            chain_selectors,
            automation_mappings,
        }
    }

    /// Top-level chains, from the first `GroupDevicePreset/BranchPresets`
    fn rack_chains(
        &self,
        root: &XmlElement,
        rack: RackRoot<'_>,
        ctx: &mut WalkContext,
    ) -> Result<Vec<Chain>, StructuralError> {
        let branch_presets = root
            .find_all("GroupDevicePreset")
            .find_map(|preset| preset.child("BranchPresets"));

        let Some(branch_presets) = branch_presets else {
            ctx.diagnostics
                .warn("No BranchPresets element found; rack contains no chains");
            return Ok(Vec::new());
        };

        self.build_branches(branch_presets, rack.tag, 0, "", ctx)
    }

    /// One chain per expected branch child of `BranchPresets`
    fn build_branches(
        &self,
        branch_presets: &XmlElement,
        rack_tag: &str,
        depth: usize,
        path: &str,
        ctx: &mut WalkContext,
    ) -> Result<Vec<Chain>, StructuralError> {
        let branch_tag = branch_child_tag(rack_tag)
            .ok_or_else(|| StructuralError::UnknownBranchType(rack_tag.to_string()))?;

        let mut branches: Vec<&XmlElement> = branch_presets.children_named(branch_tag).collect();
        if branches.is_empty() {
            if let Some(alternate) = alternate_branch_tag(rack_tag) {
                branches = branch_presets.children_named(alternate).collect();
            }
        }

        if branches.is_empty() {
            if let Some(foreign) = branch_presets
                .children()
                .iter()
                .find(|c| c.name().ends_with("BranchPreset"))
            {
                return Err(StructuralError::BranchTypeMismatch {
                    rack: rack_tag.to_string(),
                    expected: branch_tag.to_string(),
                    found: foreign.name().to_string(),
                });
            }
            let message = format!("No chains found - expected {} elements", branch_tag);
            if path.is_empty() {
                ctx.diagnostics.warn(message);
            } else {
                ctx.diagnostics.warn(format!("{}: {}", path, message));
            }
            return Ok(Vec::new());
        }

        debug!(
            count = branches.len(),
            branch_tag,
            depth,
            "Walking branch presets"
        );

        let mut chains = Vec::with_capacity(branches.len());
        for (index, branch) in branches.into_iter().enumerate() {
            chains.push(self.build_chain(branch, index, depth, path, ctx));
        }
        Ok(chains)
    }

    fn build_chain(
        &self,
        branch: &XmlElement,
        index: usize,
        depth: usize,
        parent_path: &str,
        ctx: &mut WalkContext,
    ) -> Chain {
        let explicit_name = branch
            .value_at(&["Name"])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        let name = explicit_name
            .clone()
            .unwrap_or_else(|| ctx.rack_type.default_chain_name(index));
        let path = join_path(parent_path, &name);

        let is_soloed = branch.value_at(&["IsSoloed"]) == Some("true");
        let key_range = read_range(branch, "KeyRange", (0, 127), &path, ctx);
        let velocity_range = read_range(branch, "VelocityRange", (1, 127), &path, ctx);

        let mut devices = Vec::new();
        if let Some(device_presets) = branch.child("DevicePresets") {
            for (i, preset) in device_presets.children().iter().enumerate() {
                match preset.child("Device") {
                    Some(device) => {
                        for element in device.children() {
                            devices.push(self.build_device(element, Some(preset), depth, &path, ctx));
                        }
                    }
                    None => ctx.diagnostics.warn(format!(
                        "{}: device preset {} ({}) has no Device element",
                        path,
                        i + 1,
                        preset.name()
                    )),
                }
            }
        }

        Chain {
            name,
            chain_index: index,
            is_soloed,
            devices,
            drum_annotation: None,
            zones: ChainZones {
                explicit_name,
                key_range,
                velocity_range,
            },
        }
    }

    fn build_device(
        &self,
        element: &XmlElement,
        parent_preset: Option<&XmlElement>,
        depth: usize,
        chain_path: &str,
        ctx: &mut WalkContext,
    ) -> Device {
        let tag = element.name();
        let standard_name = self.registry.canonical_name(tag);
        let (display_name, preset_name) =
            resolve_names(&standard_name, element.value_at(&["UserName"]));
        let is_on = element
            .value_at(&["On", "Manual"])
            .map_or(true, |v| v == "true");
        let is_bypassed = element
            .child_path(&["Bypass", "Manual"])
            .map(|manual| manual.value() == Some("true"));

        let nested_chains = if branch_child_tag(tag).is_some() {
            let path = join_path(chain_path, &display_name);
            self.nested_chains(element, parent_preset, depth, &path, ctx)
        } else {
            Vec::new()
        };

        Device {
            device_type: tag.to_string(),
            standard_name,
            display_name,
            preset_name,
            is_on,
            is_bypassed,
            nested_chains,
        }
    }

    /// Chains of a nested group device living in a chain at `depth`
    fn nested_chains(
        &self,
        element: &XmlElement,
        parent_preset: Option<&XmlElement>,
        depth: usize,
        path: &str,
        ctx: &mut WalkContext,
    ) -> Vec<Chain> {
        let Some(location) = locate_branch_presets(element, parent_preset) else {
            debug!(path, device = element.name(), "No BranchPresets for nested rack");
            return Vec::new();
        };
        if location.ambiguous {
            ctx.diagnostics.warn(format!(
                "{}: ambiguous branch location; BranchPresets found on both the device and its preset, using the device's",
                path
            ));
        }

        if depth + 1 > self.max_depth {
            ctx.diagnostics.warn(format!(
                "{}: maximum nesting depth ({}) reached; nested chains were not analyzed",
                path, self.max_depth
            ));
            return Vec::new();
        }

        match self.build_branches(location.presets, element.name(), depth + 1, path, ctx) {
            Ok(chains) => chains,
            Err(e) => {
                ctx.diagnostics.structural(path, &e);
                Vec::new()
            }
        }
    }
}

/// `Min`/`Max` pair under `tag`; both elements must exist
///
/// A missing `Value` attribute takes the given default. An unparseable one
/// drops the whole range with a warning.
fn read_range(
    branch: &XmlElement,
    tag: &str,
    defaults: (i32, i32),
    path: &str,
    ctx: &mut WalkContext,
) -> Option<NoteRange> {
    let range = branch.child(tag)?;
    let (min, max) = (range.child("Min")?, range.child("Max")?);

    let parse = |element: &XmlElement, default: i32| -> Result<i32, String> {
        match element.value() {
            None => Ok(default),
            Some(raw) => raw.trim().parse::<i32>().map_err(|_| raw.to_string()),
        }
    };

    match (parse(min, defaults.0), parse(max, defaults.1)) {
        (Ok(low), Ok(high)) => Some(NoteRange { low, high }),
        (Err(raw), _) | (_, Err(raw)) => {
            ctx.diagnostics.warn(format!(
                "{}: invalid {} value '{}'; range ignored",
                path, tag, raw
            ));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::xml::parse_document;

    fn doc(xml: &str) -> XmlElement {
        parse_document(xml, 512).unwrap()
    }

    #[test]
    fn test_resolve_names() {
        assert_eq!(
            resolve_names("Saturator", Some("Warmth")),
            ("Warmth".to_string(), Some("Saturator".to_string()))
        );
        assert_eq!(resolve_names("Saturator", Some("Saturator")), ("Saturator".to_string(), None));
        assert_eq!(resolve_names("Saturator", Some("   ")), ("Saturator".to_string(), None));
        assert_eq!(resolve_names("Saturator", None), ("Saturator".to_string(), None));
        assert_eq!(
            resolve_names("Saturator", Some("  Warmth ")),
            ("Warmth".to_string(), Some("Saturator".to_string()))
        );
    }

    #[test]
    fn test_detect_prefers_drum_devices() {
        let root = doc(
            "<Ableton><GroupDevicePreset><Device><AudioEffectGroupDevice/></Device>\
             <BranchPresets><AudioEffectBranchPreset><DevicePresets><GroupDevicePreset><Device>\
             <DrumGroupDevice/></Device></GroupDevicePreset></DevicePresets></AudioEffectBranchPreset>\
             </BranchPresets></GroupDevicePreset></Ableton>",
        );
        assert_eq!(detect_rack(&root).map(|r| r.tag), Some("DrumGroupDevice"));
    }

    #[test]
    fn test_detect_uses_preset_device_before_document_scan() {
        let root = doc(
            "<Ableton><GroupDevicePreset><Device><MidiEffectGroupDevice/></Device></GroupDevicePreset>\
             <InstrumentGroupDevice/></Ableton>",
        );
        assert_eq!(detect_rack(&root).map(|r| r.tag), Some("MidiEffectGroupDevice"));
    }

    #[test]
    fn test_detect_falls_back_to_document_scan() {
        let root = doc("<Ableton><Something><InstrumentGroupDevice/></Something></Ableton>");
        assert_eq!(detect_rack(&root).map(|r| r.tag), Some("InstrumentGroupDevice"));
        assert!(detect_rack(&doc("<Ableton><Operator/></Ableton>")).is_none());
    }

    #[test]
    fn test_locate_branch_presets_prefers_device_local() {
        let preset = doc(
            r#"<GroupDevicePreset>
                <Device><AudioEffectGroupDevice><BranchPresets><Local/></BranchPresets></AudioEffectGroupDevice></Device>
                <BranchPresets><Parent/></BranchPresets>
            </GroupDevicePreset>"#,
        );
        let device = preset.child_path(&["Device", "AudioEffectGroupDevice"]).unwrap();
        let found = locate_branch_presets(device, Some(&preset)).unwrap();
        assert_eq!(found.presets.children()[0].name(), "Local");
        assert!(found.ambiguous);

        let lone = doc(r#"<GroupDevicePreset><Device><AudioEffectGroupDevice><BranchPresets/></AudioEffectGroupDevice></Device></GroupDevicePreset>"#);
        let device = lone.child_path(&["Device", "AudioEffectGroupDevice"]).unwrap();
        assert!(!locate_branch_presets(device, Some(&lone)).unwrap().ambiguous);
    }

    #[test]
    fn test_locate_branch_presets_parent_only_for_group_presets() {
        let preset = doc(
            r#"<AbletonDevicePreset>
                <Device><AudioEffectGroupDevice/></Device>
                <BranchPresets><Parent/></BranchPresets>
            </AbletonDevicePreset>"#,
        );
        let device = preset.child_path(&["Device", "AudioEffectGroupDevice"]).unwrap();
        assert!(locate_branch_presets(device, Some(&preset)).is_none());
        assert!(locate_branch_presets(device, None).is_none());
    }

    fn build(xml: &str) -> AnalysisResult {
        TreeBuilder::default().build(&ParsedDocument::new(doc(xml), Vec::new()), Some("t.adg"))
    }

    #[test]
    fn test_drum_rack_tag_has_no_branch_type() {
        let result = build(
            "<Ableton><GroupDevicePreset><Device><DrumRack/></Device>\
             <BranchPresets><InstrumentBranchPreset/></BranchPresets></GroupDevicePreset></Ableton>",
        );
        assert_eq!(result.rack_type, RackType::Drum);
        assert_eq!(
            result.parsing_errors,
            vec!["Unknown branch preset type for rack type DrumRack".to_string()]
        );
    }

    #[test]
    fn test_chain_defaults_and_warnings() {
        let result = build(
            r#"<Ableton><GroupDevicePreset><Device><InstrumentGroupDevice><UserName Value=""/></InstrumentGroupDevice></Device><BranchPresets>
                <InstrumentBranchPreset>
                    <IsSoloed Value="true"/>
                    <KeyRange><Min/><Max Value="x"/></KeyRange>
                    <VelocityRange><Min/><Max/></VelocityRange>
                    <DevicePresets>
                        <AbletonDevicePreset><Device><Operator><On><Manual Value="false"/></On><Bypass><Manual Value="true"/></Bypass></Operator></Device></AbletonDevicePreset>
                        <AbletonDevicePreset/>
                    </DevicePresets>
                </InstrumentBranchPreset>
            </BranchPresets></GroupDevicePreset></Ableton>"#,
        );
        assert!(result.is_clean());
        let chain = &result.chains[0];
        assert_eq!(chain.name, "Chain 1");
        assert!(chain.is_soloed);
        assert_eq!(chain.zones.key_range, None);
        assert_eq!(chain.zones.velocity_range, Some(NoteRange { low: 1, high: 127 }));
        assert_eq!(chain.devices.len(), 1);
        assert!(!chain.devices[0].is_on);
        assert_eq!(chain.devices[0].is_bypassed, Some(true));
        assert_eq!(result.parsing_warnings.len(), 2);
        assert!(result.parsing_warnings[0].contains("invalid KeyRange value 'x'"));
        assert!(result.parsing_warnings[1].contains("has no Device element"));
    }

    #[test]
    fn test_nested_mismatch_only_drops_that_subtree() {
        let result = build(
            r#"<Ableton><GroupDevicePreset><Device><AudioEffectGroupDevice/></Device><BranchPresets>
                <AudioEffectBranchPreset><Name Value="A"/><DevicePresets>
                    <GroupDevicePreset>
                        <Device><MidiEffectGroupDevice/></Device>
                        <BranchPresets><AudioEffectBranchPreset/></BranchPresets>
                    </GroupDevicePreset>
                </DevicePresets></AudioEffectBranchPreset>
                <AudioEffectBranchPreset><Name Value="B"/></AudioEffectBranchPreset>
            </BranchPresets></GroupDevicePreset></Ableton>"#,
        );
        assert_eq!(result.chains.len(), 2);
        assert_eq!(result.chains[0].devices[0].device_type, "MidiEffectGroupDevice");
        assert!(result.chains[0].devices[0].nested_chains.is_empty());
        assert_eq!(result.parsing_errors.len(), 1);
        assert!(result.parsing_errors[0].starts_with("A > MIDI Effect Rack: "));
    }

    #[test]
    fn test_main_device_without_name_warns() {
        let result = build(
            "<Ableton><GroupDevicePreset><Device><AudioEffectGroupDevice/></Device>\
             <BranchPresets/></GroupDevicePreset></Ableton>",
        );
        assert!(result
            .parsing_warnings
            .iter()
            .any(|w| w.contains("Main device AudioEffectGroupDevice has no Name or UserName")));

        let named = build(
            r#"<Ableton><GroupDevicePreset><Device><AudioEffectGroupDevice><UserName Value="Bus"/></AudioEffectGroupDevice></Device>
             <BranchPresets/></GroupDevicePreset></Ableton>"#,
        );
        assert!(!named.parsing_warnings.iter().any(|w| w.contains("Main device")));
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("", "Chain 1"), "Chain 1");
        assert_eq!(join_path("Chain 1", "Audio Effect Rack"), "Chain 1 > Audio Effect Rack");
    }
}
