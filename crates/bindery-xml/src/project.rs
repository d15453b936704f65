// crates/bindery-xml/src/project.rs
// ============================================================================
// Module: Object-Mapping Projection
// Description: Projects XML element trees into generic JSON values.
// Purpose: Schema-free XML-to-object mapping for inspection surfaces.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! The projection renders any element tree as a generic JSON value using the
//! conventional object-mapping sentinels: attributes collect under `$`, text
//! content lives under `_`, and child elements become keys named after
//! themselves. A child name that occurs once projects as a scalar; a name
//! that repeats projects as an array in document order. The projection is
//! schema-free on purpose: consumers that need an array for a
//! possibly-single child normalize at the typed layer, not here.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Map;
use serde_json::Value;

use crate::tree::XmlElement;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Sentinel key holding an element's attributes.
pub const ATTRIBUTE_KEY: &str = "$";
/// Sentinel key holding an element's text content in object form.
pub const TEXT_KEY: &str = "_";

// ============================================================================
// SECTION: Projection
// ============================================================================

/// Projects a single element into a JSON value.
///
/// An element with neither attributes nor children projects to its text as a
/// JSON string (possibly empty). Any other element projects to an object:
/// attributes under [`ATTRIBUTE_KEY`], non-empty text under [`TEXT_KEY`], and
/// children under their own names, collapsing to a scalar for a single
/// occurrence and an array for repeats.
#[must_use]
pub fn element_to_value(element: &XmlElement) -> Value {
    if element.attributes.is_empty() && element.children.is_empty() {
        return Value::String(element.text.clone());
    }
    let mut object = Map::new();
    if !element.attributes.is_empty() {
        let mut attributes = Map::new();
        for (name, value) in &element.attributes {
            attributes.insert(name.clone(), Value::String(value.clone()));
        }
        object.insert(ATTRIBUTE_KEY.to_string(), Value::Object(attributes));
    }
    if !element.text.is_empty() {
        object.insert(TEXT_KEY.to_string(), Value::String(element.text.clone()));
    }
    for child in &element.children {
        let projected = element_to_value(child);
        match object.get_mut(&child.name) {
            None => {
                object.insert(child.name.clone(), projected);
            }
            Some(Value::Array(entries)) => entries.push(projected),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, projected]);
            }
        }
    }
    Value::Object(object)
}

/// Projects a document root into a single-key JSON object.
///
/// The key is the root element's name, mirroring how object mappers expose
/// parsed documents.
#[must_use]
pub fn document_to_value(root: &XmlElement) -> Value {
    let mut document = Map::new();
    document.insert(root.name.clone(), element_to_value(root));
    Value::Object(document)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
