// crates/bindery-xml/src/tree.rs
// ============================================================================
// Module: XML Element Tree
// Description: Generic in-memory representation of an XML document.
// Purpose: Shared tree type for the codec, projection, and schema layers.
// Dependencies: (none)
// ============================================================================

//! ## Overview
//! [`XmlElement`] is the single tree type every other layer in this crate
//! works on. It stores element names, attributes in document order, child
//! elements in document order, and concatenated character data. Mixed content
//! is out of scope for the documents this crate manages: an element carries
//! either children or text, and whitespace-only character data is dropped at
//! parse time so indentation never leaks into the model.

// ============================================================================
// SECTION: Element Tree
// ============================================================================

/// A single XML element with its attributes, children, and text content.
///
/// # Invariants
/// - `attributes` and `children` preserve document order exactly; the writer
///   re-emits them in stored order so round trips are stable.
/// - `text` holds entity-decoded character data. Whitespace-only character
///   data is never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    /// Element name as written in the document.
    pub name: String,
    /// Attribute name/value pairs in document order.
    pub attributes: Vec<(String, String)>,
    /// Child elements in document order.
    pub children: Vec<XmlElement>,
    /// Concatenated character data, entity-decoded.
    pub text: String,
}

impl XmlElement {
    /// Creates an empty element with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            text: String::new(),
        }
    }

    /// Creates a text-only element.
    #[must_use]
    pub fn with_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        let mut element = Self::new(name);
        element.text = text.into();
        element
    }

    /// Sets an attribute, replacing an existing value in place.
    ///
    /// Replacing in place keeps the original attribute position so rewriting
    /// a document does not reorder it.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        for entry in &mut self.attributes {
            if entry.0 == name {
                entry.1 = value;
                return;
            }
        }
        self.attributes.push((name, value));
    }

    /// Returns an attribute value by name.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(attr_name, _)| attr_name == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns the first child element with the given name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Returns all child elements with the given name in document order.
    pub fn children_named<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// Returns the text content of the first child with the given name.
    #[must_use]
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(|child| child.text.as_str())
    }

    /// Appends a child element.
    pub fn push_child(&mut self, child: XmlElement) {
        self.children.push(child);
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
