//! Owned XML element tree
//!
//! Rack files keep all data in attributes (mostly `Value="..."`), so text
//! nodes are dropped. Lookups mirror the handful of XPath shapes the
//! analyzer needs: direct child, descendant-or-self, and attribute access.

use crate::error::DecodeError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// One XML element with its attributes (document order) and child elements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<XmlElement>,
}

impl XmlElement {
    /// Create an element without attributes or children
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Tag name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attribute value by key
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Shorthand for the `Value` attribute
    pub fn value(&self) -> Option<&str> {
        self.attr("Value")
    }

    /// Child elements in document order
    pub fn children(&self) -> &[XmlElement] {
        &self.children
    }

    /// First direct child with the given tag
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All direct children with the given tag
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Follow a path of direct children, e.g. `["KeyRange", "Min"]`
    pub fn child_path(&self, path: &[&str]) -> Option<&XmlElement> {
        path.iter().try_fold(self, |node, name| node.child(name))
    }

    /// `Value` attribute at the end of a child path
    pub fn value_at(&self, path: &[&str]) -> Option<&str> {
        self.child_path(path).and_then(XmlElement::value)
    }

    /// Pre-order traversal including `self`
    pub fn descendants_or_self(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// First element with the given tag in document order, `self` included
    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        self.descendants_or_self().find(|e| e.name == name)
    }

    /// All elements with the given tag in document order, `self` included
    pub fn find_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.descendants_or_self().filter(move |e| e.name == name)
    }

    fn with_attributes(name: String, attributes: Vec<(String, String)>) -> Self {
        Self {
            name,
            attributes,
            children: Vec::new(),
        }
    }
}

/// Iterative pre-order walk; deep documents never grow the call stack
pub struct Descendants<'a> {
    stack: Vec<&'a XmlElement>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a XmlElement;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Parse a complete document into its root element
///
/// Only the XML built-in entities are decoded; DOCTYPE declarations are
/// skipped and never expanded. Elements nested deeper than `max_depth`
/// are rejected.
pub fn parse_document(text: &str, max_depth: usize) -> Result<XmlElement, DecodeError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                if stack.len() >= max_depth {
                    return Err(DecodeError::XmlParseFailed(format!(
                        "element nesting exceeds {} levels",
                        max_depth
                    )));
                }
                stack.push(element_from(e)?);
            }
            Ok(Event::Empty(ref e)) => {
                let element = element_from(e)?;
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::End(_)) => {
                // quick-xml checks that end names match their start tags
                let element = stack.pop().ok_or_else(|| {
                    DecodeError::XmlParseFailed("closing tag without matching open tag".to_string())
                })?;
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(DecodeError::XmlParseFailed(format!(
                    "{} at position {}",
                    e,
                    reader.buffer_position()
                )));
            }
        }
    }

    if let Some(open) = stack.last() {
        return Err(DecodeError::XmlParseFailed(format!(
            "unexpected end of document inside <{}>",
            open.name
        )));
    }

    root.ok_or_else(|| DecodeError::XmlParseFailed("document has no root element".to_string()))
}

fn element_from(start: &BytesStart<'_>) -> Result<XmlElement, DecodeError> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();

    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| {
            DecodeError::XmlParseFailed(format!("malformed attribute on <{}>: {}", name, e))
        })?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = match attr.unescape_value() {
            Ok(v) => v.into_owned(),
            Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
        };
        attributes.push((key, value));
    }

    Ok(XmlElement::with_attributes(name, attributes))
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<(), DecodeError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        return Ok(());
    }
    if root.is_some() {
        return Err(DecodeError::XmlParseFailed(format!(
            "multiple root elements (second root <{}>)",
            element.name
        )));
    }
    *root = Some(element);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Ableton MajorVersion="5" Creator="Ableton Live 11.3">
    <GroupDevicePreset>
        <Name Value="Bus &amp; Glue"/>
        <Device>
            <AudioEffectGroupDevice Id="0">
                <On><Manual Value="true"/></On>
            </AudioEffectGroupDevice>
        </Device>
    </GroupDevicePreset>
</Ableton>"#;

    #[test]
    fn test_parse_builds_tree_with_attributes() {
        let root = parse_document(SAMPLE, 64).unwrap();
        assert_eq!(root.name(), "Ableton");
        assert_eq!(root.attr("MajorVersion"), Some("5"));
        assert_eq!(root.attr("Creator"), Some("Ableton Live 11.3"));

        let preset = root.child("GroupDevicePreset").unwrap();
        assert_eq!(preset.value_at(&["Name"]), Some("Bus & Glue"));
        assert_eq!(
            preset.value_at(&["Device", "AudioEffectGroupDevice", "On", "Manual"]),
            Some("true")
        );
    }

    #[test]
    fn test_find_is_document_order_and_includes_self() {
        let root = parse_document(SAMPLE, 64).unwrap();
        assert_eq!(root.find("Ableton").map(|e| e.name()), Some("Ableton"));
        let names: Vec<_> = root.descendants_or_self().map(|e| e.name()).collect();
        assert_eq!(
            names,
            vec![
                "Ableton",
                "GroupDevicePreset",
                "Name",
                "Device",
                "AudioEffectGroupDevice",
                "On",
                "Manual"
            ]
        );
    }

    #[test]
    fn test_mismatched_tags_fail() {
        let err = parse_document("<A><B></A>", 64).unwrap_err();
        assert!(matches!(err, DecodeError::XmlParseFailed(_)));
    }

    #[test]
    fn test_unclosed_root_fails() {
        let err = parse_document("<A><B/>", 64).unwrap_err();
        assert!(matches!(err, DecodeError::XmlParseFailed(_)));
    }

    #[test]
    fn test_multiple_roots_fail() {
        assert!(parse_document("<A/><B/>", 64).is_err());
    }

    #[test]
    fn test_nesting_limit() {
        let deep = format!("{}{}", "<N>".repeat(10), "</N>".repeat(10));
        assert!(parse_document(&deep, 10).is_ok());
        assert!(parse_document(&deep, 9).is_err());
    }
}
