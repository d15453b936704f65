// crates/bindery-xml/src/codec.rs
// ============================================================================
// Module: XML Codec
// Description: Reads and writes XML documents as element trees.
// Purpose: Single parsing/serialization seam for every stored document.
// Dependencies: quick-xml, thiserror
// ============================================================================

//! ## Overview
//! The codec turns document text into an [`XmlElement`] tree and back.
//! Parsing is strict: mismatched tags, unclosed elements, content after the
//! document root, and unresolvable entity references are rejected. Writing is
//! deterministic: an XML declaration, two-space indentation, attributes in
//! stored order, and self-closing tags for empty elements, so rewriting an
//! unchanged tree produces byte-identical output.

// ============================================================================
// SECTION: Imports
// ============================================================================

use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::escape::partial_escape;
use quick_xml::events::BytesStart;
use quick_xml::events::Event;
use thiserror::Error;

use crate::tree::XmlElement;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Codec failure raised while reading a document.
///
/// # Invariants
/// - Variants are stable for error classification at the API layer.
#[derive(Debug, Error)]
pub enum XmlError {
    /// Input could not be parsed as well-formed XML.
    #[error("malformed XML: {0}")]
    Malformed(String),
    /// Input contained no root element.
    #[error("document has no root element")]
    Empty,
    /// Content followed the closed document root.
    #[error("unexpected content after the document root")]
    TrailingContent,
}

// ============================================================================
// SECTION: Reader
// ============================================================================

/// Parses a full XML document into its root element.
///
/// Accepts an optional XML declaration, comments, and processing
/// instructions. Whitespace-only character data is dropped; all other text is
/// preserved verbatim after entity decoding.
///
/// # Errors
///
/// Returns [`XmlError`] when the input is empty, ill-formed, or carries
/// content after the root element.
pub fn parse_document(input: &str) -> Result<XmlElement, XmlError> {
    let mut reader = Reader::from_str(input);
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;
    loop {
        let event = reader.read_event().map_err(|err| XmlError::Malformed(err.to_string()))?;
        match event {
            Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
            Event::Start(start) => {
                if root.is_some() && stack.is_empty() {
                    return Err(XmlError::TrailingContent);
                }
                stack.push(element_from_start(&start)?);
            }
            Event::Empty(start) => {
                let element = element_from_start(&start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let Some(element) = stack.pop() else {
                    return Err(XmlError::Malformed("unmatched closing tag".to_string()));
                };
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                let value =
                    text.decode().map_err(|err| XmlError::Malformed(err.to_string()))?;
                let Some(parent) = stack.last_mut() else {
                    if value.trim().is_empty() {
                        continue;
                    }
                    return Err(XmlError::Malformed(
                        "character data outside the root element".to_string(),
                    ));
                };
                parent.text.push_str(&value);
            }
            Event::CData(data) => {
                let Some(parent) = stack.last_mut() else {
                    return Err(XmlError::Malformed(
                        "character data outside the root element".to_string(),
                    ));
                };
                parent.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
            }
            Event::GeneralRef(reference) => {
                let Some(parent) = stack.last_mut() else {
                    return Err(XmlError::Malformed(
                        "entity reference outside the root element".to_string(),
                    ));
                };
                let name = String::from_utf8_lossy(&reference).into_owned();
                parent.text.push(resolve_reference(&name)?);
            }
            Event::Eof => break,
        }
    }
    if !stack.is_empty() {
        return Err(XmlError::Malformed("unclosed element at end of input".to_string()));
    }
    root.ok_or(XmlError::Empty)
}

/// Builds an element from a start or empty tag, decoding attribute values.
fn element_from_start(start: &BytesStart<'_>) -> Result<XmlElement, XmlError> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut element = XmlElement::new(name);
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|err| XmlError::Malformed(err.to_string()))?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute
            .unescape_value()
            .map_err(|err| XmlError::Malformed(err.to_string()))?
            .into_owned();
        element.set_attr(key, value);
    }
    Ok(element)
}

/// Attaches a completed element to its parent, or installs it as the root.
///
/// Character data is finalized here: content that is only whitespace, such
/// as the indentation around child elements, collapses to empty.
fn attach(
    stack: &mut Vec<XmlElement>,
    root: &mut Option<XmlElement>,
    mut element: XmlElement,
) -> Result<(), XmlError> {
    if element.text.trim().is_empty() {
        element.text.clear();
    }
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        return Ok(());
    }
    if root.is_some() {
        return Err(XmlError::TrailingContent);
    }
    *root = Some(element);
    Ok(())
}

/// Resolves a general entity reference to a character.
///
/// Supports the five predefined XML entities plus decimal and hexadecimal
/// character references. Anything else is rejected.
fn resolve_reference(name: &str) -> Result<char, XmlError> {
    match name {
        "amp" => return Ok('&'),
        "lt" => return Ok('<'),
        "gt" => return Ok('>'),
        "quot" => return Ok('"'),
        "apos" => return Ok('\''),
        _ => {}
    }
    if let Some(digits) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
        if let Ok(code) = u32::from_str_radix(digits, 16)
            && let Some(decoded) = char::from_u32(code)
        {
            return Ok(decoded);
        }
    } else if let Some(digits) = name.strip_prefix('#')
        && let Ok(code) = digits.parse::<u32>()
        && let Some(decoded) = char::from_u32(code)
    {
        return Ok(decoded);
    }
    Err(XmlError::Malformed(format!("unresolvable entity reference &{name};")))
}

// ============================================================================
// SECTION: Writer
// ============================================================================

/// Serializes an element tree as a full XML document.
///
/// The output starts with `<?xml version="1.0" encoding="UTF-8"?>`, indents
/// nested elements by two spaces, renders empty elements self-closed, and
/// ends with a trailing newline.
#[must_use]
pub fn write_document(root: &XmlElement) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    write_element(&mut out, root, 0);
    out
}

/// Writes one element at the given nesting depth.
fn write_element(out: &mut String, element: &XmlElement, depth: usize) {
    push_indent(out, depth);
    out.push('<');
    out.push_str(&element.name);
    for (name, value) in &element.attributes {
        out.push(' ');
        out.push_str(name);
        out.push_str("=\"");
        out.push_str(&escape(value.as_str()));
        out.push('"');
    }
    if element.children.is_empty() && element.text.is_empty() {
        out.push_str("/>\n");
        return;
    }
    if element.children.is_empty() {
        out.push('>');
        out.push_str(&partial_escape(element.text.as_str()));
        out.push_str("</");
        out.push_str(&element.name);
        out.push_str(">\n");
        return;
    }
    out.push_str(">\n");
    for child in &element.children {
        write_element(out, child, depth + 1);
    }
    push_indent(out, depth);
    out.push_str("</");
    out.push_str(&element.name);
    out.push_str(">\n");
}

/// Appends two spaces of indentation per nesting level.
fn push_indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
