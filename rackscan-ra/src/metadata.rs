//! Metadata extraction: Live version, rack name, macro controls, sample
//! references, chain selectors and macro mappings

use crate::builder::Diagnostics;
use crate::decoder::XmlElement;
use crate::types::{AutomationMapping, ChainSelector, MacroControl, SampleReference, VersionInfo};
use std::path::Path;

const MACRO_SLOTS: u8 = 8;

/// Leading-integer parse: `"11.0_433"` → 11, `"abc"` → None
pub fn parse_leading_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

/// Version attributes from the root `Ableton` element, else the first nested one
pub fn extract_version(root: &XmlElement) -> VersionInfo {
    let source = if root.name() == "Ableton" && root.attr("MajorVersion").is_some() {
        Some(root)
    } else {
        root.descendants_or_self()
            .skip(1)
            .find(|e| e.name() == "Ableton")
            .or_else(|| (root.name() == "Ableton").then_some(root))
    };

    let Some(element) = source else {
        return VersionInfo::default();
    };

    let int_attr = |key: &str| element.attr(key).and_then(parse_leading_int);
    let mut info = VersionInfo {
        major: int_attr("MajorVersion"),
        minor: int_attr("MinorVersion"),
        build: int_attr("BuildNumber"),
        revision: int_attr("Revision"),
        display: None,
        creator: element.attr("Creator").map(str::to_string),
    };

    // Revision only follows minor; no placeholder zeros
    if let Some(major) = info.major {
        let mut parts = vec![major.to_string()];
        if let Some(minor) = info.minor {
            parts.push(minor.to_string());
            if let Some(revision) = info.revision {
                parts.push(revision.to_string());
            }
        }
        info.display = Some(parts.join("."));
    }
    info
}

/// Rack display name from the document, or the file stem of `fallback_filename`
///
/// Lookup order: `GroupDevicePreset/Name`, the `UserName` of the main
/// device, the first `Name` anywhere, then the file stem.
pub fn extract_name(root: &XmlElement, fallback_filename: Option<&str>) -> Option<String> {
    let non_empty = |v: Option<&str>| {
        v.map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    if let Some(preset) = root.find("GroupDevicePreset") {
        if let Some(name) = non_empty(preset.value_at(&["Name"])) {
            return Some(name);
        }
        if let Some(device) = preset.child("Device") {
            let user_name = device
                .children()
                .iter()
                .find_map(|d| non_empty(d.value_at(&["UserName"])));
            if user_name.is_some() {
                return user_name;
            }
        }
    }

    if let Some(name) = non_empty(root.find("Name").and_then(XmlElement::value)) {
        return Some(name);
    }

    fallback_filename
        .and_then(|f| Path::new(f).file_stem())
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
}

/// Named macro knobs of the main rack device
///
/// A slot is emitted only when its display name is non-empty and differs
/// from the default `Macro N`.
pub fn extract_macros(device: &XmlElement, diagnostics: &mut Diagnostics) -> Vec<MacroControl> {
    let mut macros = Vec::new();

    for index in 0..MACRO_SLOTS {
        let default_name = format!("Macro {}", index + 1);
        let name_tag = format!("MacroDisplayNames.{}", index);
        let control_tag = format!("MacroControls.{}", index);
        let Some(name) = device.value_at(&[name_tag.as_str()]) else {
            continue;
        };
        let name = name.trim();
        if name.is_empty() || name == default_name {
            continue;
        }

        let value = match device.value_at(&[control_tag.as_str(), "Manual"]) {
            Some(raw) => match raw.trim().parse::<f64>() {
                Ok(v) if v.is_finite() => v,
                _ => {
                    diagnostics.warn(format!(
                        "Invalid value '{}' for macro control {} ({}); using 0",
                        raw, index, name
                    ));
                    0.0
                }
            },
            None => 0.0,
        };

        macros.push(MacroControl {
            name: name.to_string(),
            value,
            index,
        });
    }

    macros
}

/// Every `FileRef` in document order
pub fn extract_sample_references(root: &XmlElement) -> Vec<SampleReference> {
    let text = |file_ref: &XmlElement, key: &str| {
        file_ref
            .value_at(&[key])
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    root.find_all("FileRef")
        .map(|file_ref| SampleReference {
            name: text(file_ref, "Name"),
            path: text(file_ref, "Path"),
            relative_path: text(file_ref, "RelativePath"),
            path_type: file_ref
                .value_at(&["RelativePathType"])
                .and_then(parse_leading_int),
        })
        .filter(|r| r.name.is_some() || r.path.is_some() || r.relative_path.is_some())
        .collect()
}

/// Scalar stored either as an attribute or as a `<key Value=".."/>` child
fn scalar<'a>(element: &'a XmlElement, key: &str) -> Option<&'a str> {
    element
        .attr(key)
        .or_else(|| element.value_at(&[key]))
        .map(str::trim)
}

fn parse_number(
    raw: Option<&str>,
    default: f64,
    what: &str,
    diagnostics: &mut Diagnostics,
) -> f64 {
    match raw {
        None | Some("") => default,
        Some(raw) => match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => v,
            _ => {
                diagnostics.warn(format!("Invalid {} '{}'; using {}", what, raw, default));
                default
            }
        },
    }
}

/// Every `ChainSelector` in document order
///
/// The position is the selector's own `Value` or its `Manual` child; the
/// target is its `AutomationTarget` (attribute, or the child's `Id`).
pub fn extract_chain_selectors(
    root: &XmlElement,
    diagnostics: &mut Diagnostics,
) -> Vec<ChainSelector> {
    root.find_all("ChainSelector")
        .map(|selector| {
            let raw = selector
                .attr("Value")
                .or_else(|| selector.value_at(&["Manual"]))
                .map(str::trim);
            let automation_target = selector
                .attr("AutomationTarget")
                .or_else(|| selector.child("AutomationTarget").and_then(|t| t.attr("Id")))
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string);
            ChainSelector {
                value: parse_number(raw, 0.0, "chain selector value", diagnostics),
                automation_target,
            }
        })
        .collect()
}

/// Every `MacroControlTarget` in document order
///
/// Missing fields default to macro 0, an empty parameter id and a 0..1
/// range.
pub fn extract_automation_mappings(
    root: &XmlElement,
    diagnostics: &mut Diagnostics,
) -> Vec<AutomationMapping> {
    root.find_all("MacroControlTarget")
        .map(|target| {
            let macro_index = scalar(target, "MacroIndex")
                .and_then(parse_leading_int)
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(0);
            AutomationMapping {
                macro_index,
                parameter_id: scalar(target, "ParameterId").unwrap_or_default().to_string(),
                min_value: parse_number(scalar(target, "Min"), 0.0, "mapping minimum", diagnostics),
                max_value: parse_number(scalar(target, "Max"), 1.0, "mapping maximum", diagnostics),
            }
        })
        .collect()
}
