// crates/bindery-xml/src/schema.rs
// ============================================================================
// Module: XSD Subset Validation
// Description: Compiles and enforces the schema subset the stored documents use.
// Purpose: Gate every document write behind structural validation.
// Dependencies: bigdecimal, serde, thiserror, time
// ============================================================================

//! ## Overview
//! This module compiles an XML Schema document into a small declarative model
//! and validates element trees against it. The supported subset is exactly
//! what the shipped catalog and orders schemas need: one global element,
//! named simple types with restriction facets, sequences, attributes, and
//! simple content with attribute extensions. Compilation fails closed on any
//! construct outside the subset. Validation never mutates the tree and
//! reports every violation it finds, each with a tree path such as
//! `/orders/order[2]/items/item[1]/@quantity`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::codec::XmlError;
use crate::codec::parse_document;
use crate::tree::XmlElement;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Schema compilation failure.
///
/// # Invariants
/// - Compilation fails closed: any construct outside the supported subset is
///   an error, never a silent skip.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The schema document itself is not well-formed XML.
    #[error("schema document is not well-formed: {0}")]
    Malformed(#[from] XmlError),
    /// The document root is not a schema element.
    #[error("expected a schema root element, found <{0}>")]
    NotASchema(String),
    /// A construct outside the supported subset was encountered.
    #[error("unsupported schema construct: {0}")]
    Unsupported(String),
    /// A declaration is missing its `name` attribute.
    #[error("{0} declaration is missing a name attribute")]
    MissingName(&'static str),
    /// A type reference does not resolve to a built-in or named simple type.
    #[error("unknown type reference {0}")]
    UnknownType(String),
    /// An element declares neither a type nor an inline complex type.
    #[error("element {0} has neither a type nor an inline complexType")]
    Untyped(String),
    /// An occurrence bound has a value outside the supported subset.
    #[error("unsupported occurrence bound {value} on element {element}")]
    BadOccurs {
        /// Element declaration carrying the bound.
        element: String,
        /// Literal bound value as written in the schema.
        value: String,
    },
    /// A facet value could not be parsed.
    #[error("invalid {facet} facet value {value}")]
    BadFacet {
        /// Facet name as written in the schema.
        facet: String,
        /// Literal facet value as written in the schema.
        value: String,
    },
    /// The schema does not declare exactly one global element.
    #[error("schema must declare exactly one global element")]
    RootCount,
}

/// A single validation finding against the compiled schema.
///
/// # Invariants
/// - `path` uses 1-based sibling indexes for repeatable elements and `@name`
///   segments for attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaViolation {
    /// Tree path of the offending element or attribute.
    pub path: String,
    /// Human-readable description of the violation.
    pub message: String,
}

// ============================================================================
// SECTION: Compiled Model
// ============================================================================

/// A compiled schema: the document root declaration plus named simple types.
#[derive(Debug, Clone)]
pub struct Schema {
    /// Declaration of the single global element.
    pub root: ElementDecl,
    /// Named top-level simple types, keyed by declaration name.
    pub simple_types: BTreeMap<String, SimpleType>,
}

/// A compiled element declaration.
#[derive(Debug, Clone)]
pub struct ElementDecl {
    /// Element name.
    pub name: String,
    /// Minimum occurrence count (`0` or `1`).
    pub min_occurs: usize,
    /// Maximum occurrence bound.
    pub max_occurs: Occurs,
    /// Content model for the element body.
    pub content: ContentModel,
    /// Declared attributes.
    pub attributes: Vec<AttributeDecl>,
}

/// Maximum occurrence bound for an element declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occurs {
    /// The element occurs at most once.
    One,
    /// The element may repeat without bound.
    Unbounded,
}

/// Content model of an element declaration.
#[derive(Debug, Clone)]
pub enum ContentModel {
    /// Text content constrained by a simple type.
    Text(SimpleType),
    /// An ordered sequence of child element declarations.
    Children(Vec<ElementDecl>),
    /// No content: attributes only.
    Empty,
}

/// A compiled attribute declaration.
#[derive(Debug, Clone)]
pub struct AttributeDecl {
    /// Attribute name.
    pub name: String,
    /// Simple type constraining the attribute value.
    pub simple_type: SimpleType,
    /// Whether the attribute must be present.
    pub required: bool,
}

/// A simple type: a built-in base plus restriction facets.
#[derive(Debug, Clone)]
pub struct SimpleType {
    /// Built-in base type.
    pub base: BaseType,
    /// Restriction facets applied on top of the base.
    pub facets: Vec<Facet>,
}

/// Built-in simple types in the supported subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseType {
    /// Any character data.
    String,
    /// Decimal number without exponent notation.
    Decimal,
    /// Integer of arbitrary sign.
    Integer,
    /// Integer greater than or equal to zero.
    NonNegativeInteger,
    /// Integer greater than or equal to one.
    PositiveInteger,
    /// `true`, `false`, `1`, or `0`.
    Boolean,
    /// RFC 3339 timestamp.
    DateTime,
}

/// A restriction facet.
#[derive(Debug, Clone)]
pub enum Facet {
    /// Value must equal one of the listed literals.
    Enumeration(Vec<String>),
    /// Numeric value must be at least the bound.
    MinInclusive(BigDecimal),
    /// Numeric value must be at most the bound.
    MaxInclusive(BigDecimal),
    /// Character count must be at least the bound.
    MinLength(usize),
    /// Character count must be at most the bound.
    MaxLength(usize),
}

// ============================================================================
// SECTION: Compilation
// ============================================================================

impl Schema {
    /// Compiles a schema document from XSD source text.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] when the source is not well-formed XML or uses
    /// a construct outside the supported subset.
    pub fn parse(source: &str) -> Result<Self, SchemaError> {
        let document = parse_document(source)?;
        if local_name(&document.name) != "schema" {
            return Err(SchemaError::NotASchema(document.name));
        }
        let mut simple_types = BTreeMap::new();
        for child in &document.children {
            if local_name(&child.name) == "simpleType" {
                let (name, simple_type) = compile_named_simple_type(child)?;
                simple_types.insert(name, simple_type);
            }
        }
        let mut root = None;
        for child in &document.children {
            match local_name(&child.name) {
                "simpleType" => {}
                "element" => {
                    if root.is_some() {
                        return Err(SchemaError::RootCount);
                    }
                    root = Some(compile_element(child, &simple_types)?);
                }
                _ => return Err(SchemaError::Unsupported(child.name.clone())),
            }
        }
        let root = root.ok_or(SchemaError::RootCount)?;
        Ok(Self {
            root,
            simple_types,
        })
    }

    /// Validates an element tree against the compiled schema.
    ///
    /// Returns every violation found; an empty vector means the tree is
    /// valid. A wrong root name short-circuits because no declaration applies
    /// below it.
    #[must_use]
    pub fn validate(&self, root: &XmlElement) -> Vec<SchemaViolation> {
        let mut violations = Vec::new();
        if root.name != self.root.name {
            violations.push(SchemaViolation {
                path: "/".to_string(),
                message: format!(
                    "expected root element <{}>, found <{}>",
                    self.root.name, root.name
                ),
            });
            return violations;
        }
        let path = format!("/{}", root.name);
        validate_element(&self.root, root, &path, &mut violations);
        violations
    }
}

/// Returns the part of a possibly prefixed XML name after the last colon.
fn local_name(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

/// Finds the first child whose local name matches.
fn find_child<'a>(element: &'a XmlElement, local: &str) -> Option<&'a XmlElement> {
    element.children.iter().find(|child| local_name(&child.name) == local)
}

/// Iterates children whose local name matches.
fn children_local<'a>(
    element: &'a XmlElement,
    local: &'a str,
) -> impl Iterator<Item = &'a XmlElement> + 'a {
    element.children.iter().filter(move |child| local_name(&child.name) == local)
}

/// Compiles an element declaration, recursing into inline complex types.
fn compile_element(
    element: &XmlElement,
    simple_types: &BTreeMap<String, SimpleType>,
) -> Result<ElementDecl, SchemaError> {
    let name = element
        .attr("name")
        .ok_or(SchemaError::MissingName("element"))?
        .to_string();
    let min_occurs = match element.attr("minOccurs") {
        None | Some("1") => 1,
        Some("0") => 0,
        Some(other) => {
            return Err(SchemaError::BadOccurs {
                element: name,
                value: other.to_string(),
            });
        }
    };
    let max_occurs = match element.attr("maxOccurs") {
        None | Some("1") => Occurs::One,
        Some("unbounded") => Occurs::Unbounded,
        Some(other) => {
            return Err(SchemaError::BadOccurs {
                element: name,
                value: other.to_string(),
            });
        }
    };
    if let Some(type_name) = element.attr("type") {
        let simple_type = resolve_type(type_name, simple_types)?;
        return Ok(ElementDecl {
            name,
            min_occurs,
            max_occurs,
            content: ContentModel::Text(simple_type),
            attributes: Vec::new(),
        });
    }
    let Some(complex) = find_child(element, "complexType") else {
        return Err(SchemaError::Untyped(name));
    };
    let (content, attributes) = compile_complex_type(complex, simple_types)?;
    Ok(ElementDecl {
        name,
        min_occurs,
        max_occurs,
        content,
        attributes,
    })
}

/// Compiles a complex type into a content model and attribute declarations.
fn compile_complex_type(
    complex: &XmlElement,
    simple_types: &BTreeMap<String, SimpleType>,
) -> Result<(ContentModel, Vec<AttributeDecl>), SchemaError> {
    for child in &complex.children {
        if !matches!(local_name(&child.name), "sequence" | "attribute" | "simpleContent") {
            return Err(SchemaError::Unsupported(child.name.clone()));
        }
    }
    if let Some(simple_content) = find_child(complex, "simpleContent") {
        let Some(extension) = find_child(simple_content, "extension") else {
            return Err(SchemaError::Unsupported("simpleContent without extension".to_string()));
        };
        let base = extension
            .attr("base")
            .ok_or_else(|| SchemaError::UnknownType("(missing extension base)".to_string()))?;
        let simple_type = resolve_type(base, simple_types)?;
        let attributes = compile_attributes(extension, simple_types)?;
        return Ok((ContentModel::Text(simple_type), attributes));
    }
    let attributes = compile_attributes(complex, simple_types)?;
    if let Some(sequence) = find_child(complex, "sequence") {
        let mut declared = Vec::new();
        for child in &sequence.children {
            if local_name(&child.name) != "element" {
                return Err(SchemaError::Unsupported(child.name.clone()));
            }
            declared.push(compile_element(child, simple_types)?);
        }
        return Ok((ContentModel::Children(declared), attributes));
    }
    Ok((ContentModel::Empty, attributes))
}

/// Compiles the attribute declarations directly under a parent element.
fn compile_attributes(
    parent: &XmlElement,
    simple_types: &BTreeMap<String, SimpleType>,
) -> Result<Vec<AttributeDecl>, SchemaError> {
    let mut attributes = Vec::new();
    for declaration in children_local(parent, "attribute") {
        let name = declaration
            .attr("name")
            .ok_or(SchemaError::MissingName("attribute"))?
            .to_string();
        let simple_type = match declaration.attr("type") {
            Some(type_name) => resolve_type(type_name, simple_types)?,
            None => SimpleType {
                base: BaseType::String,
                facets: Vec::new(),
            },
        };
        let required = match declaration.attr("use") {
            Some("required") => true,
            None | Some("optional") => false,
            Some(other) => {
                return Err(SchemaError::Unsupported(format!("attribute use=\"{other}\"")));
            }
        };
        attributes.push(AttributeDecl {
            name,
            simple_type,
            required,
        });
    }
    Ok(attributes)
}

/// Resolves a type reference to a built-in or a named simple type.
fn resolve_type(
    name: &str,
    simple_types: &BTreeMap<String, SimpleType>,
) -> Result<SimpleType, SchemaError> {
    if let Some(base) = builtin_base(local_name(name)) {
        return Ok(SimpleType {
            base,
            facets: Vec::new(),
        });
    }
    simple_types
        .get(local_name(name))
        .cloned()
        .ok_or_else(|| SchemaError::UnknownType(name.to_string()))
}

/// Maps a built-in type's local name to its base classification.
fn builtin_base(local: &str) -> Option<BaseType> {
    match local {
        "string" => Some(BaseType::String),
        "decimal" => Some(BaseType::Decimal),
        "integer" => Some(BaseType::Integer),
        "nonNegativeInteger" => Some(BaseType::NonNegativeInteger),
        "positiveInteger" => Some(BaseType::PositiveInteger),
        "boolean" => Some(BaseType::Boolean),
        "dateTime" => Some(BaseType::DateTime),
        _ => None,
    }
}

/// Compiles a named top-level simple type.
fn compile_named_simple_type(
    declaration: &XmlElement,
) -> Result<(String, SimpleType), SchemaError> {
    let name = declaration
        .attr("name")
        .ok_or(SchemaError::MissingName("simpleType"))?
        .to_string();
    let Some(restriction) = find_child(declaration, "restriction") else {
        return Err(SchemaError::Unsupported(format!("simpleType {name} without restriction")));
    };
    let base_name = restriction
        .attr("base")
        .ok_or_else(|| SchemaError::UnknownType(format!("(simpleType {name} missing base)")))?;
    let Some(base) = builtin_base(local_name(base_name)) else {
        return Err(SchemaError::UnknownType(base_name.to_string()));
    };
    let mut facets = Vec::new();
    let mut enumeration = Vec::new();
    for facet in &restriction.children {
        let facet_name = local_name(&facet.name);
        let value = facet.attr("value").ok_or_else(|| SchemaError::BadFacet {
            facet: facet_name.to_string(),
            value: "(missing)".to_string(),
        })?;
        match facet_name {
            "enumeration" => enumeration.push(value.to_string()),
            "minInclusive" => facets.push(Facet::MinInclusive(decimal_facet(facet_name, value)?)),
            "maxInclusive" => facets.push(Facet::MaxInclusive(decimal_facet(facet_name, value)?)),
            "minLength" => facets.push(Facet::MinLength(length_facet(facet_name, value)?)),
            "maxLength" => facets.push(Facet::MaxLength(length_facet(facet_name, value)?)),
            other => return Err(SchemaError::Unsupported(format!("facet {other}"))),
        }
    }
    if !enumeration.is_empty() {
        facets.push(Facet::Enumeration(enumeration));
    }
    Ok((
        name,
        SimpleType {
            base,
            facets,
        },
    ))
}

/// Parses a numeric facet bound.
fn decimal_facet(facet: &str, value: &str) -> Result<BigDecimal, SchemaError> {
    BigDecimal::from_str(value).map_err(|_| SchemaError::BadFacet {
        facet: facet.to_string(),
        value: value.to_string(),
    })
}

/// Parses a length facet bound.
fn length_facet(facet: &str, value: &str) -> Result<usize, SchemaError> {
    value.parse::<usize>().map_err(|_| SchemaError::BadFacet {
        facet: facet.to_string(),
        value: value.to_string(),
    })
}

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Validates one element against its declaration, recursing into children.
fn validate_element(
    decl: &ElementDecl,
    element: &XmlElement,
    path: &str,
    out: &mut Vec<SchemaViolation>,
) {
    for attribute in &decl.attributes {
        let attribute_path = format!("{path}/@{}", attribute.name);
        match element.attr(&attribute.name) {
            Some(value) => check_value(&attribute.simple_type, value, &attribute_path, out),
            None if attribute.required => out.push(SchemaViolation {
                path: attribute_path,
                message: "required attribute is missing".to_string(),
            }),
            None => {}
        }
    }
    for (name, _) in &element.attributes {
        if !decl.attributes.iter().any(|attribute| attribute.name == *name) {
            out.push(SchemaViolation {
                path: format!("{path}/@{name}"),
                message: "unknown attribute".to_string(),
            });
        }
    }
    match &decl.content {
        ContentModel::Text(simple_type) => {
            for child in &element.children {
                out.push(SchemaViolation {
                    path: format!("{path}/{}", child.name),
                    message: "unexpected element in text-only content".to_string(),
                });
            }
            check_value(simple_type, &element.text, path, out);
        }
        ContentModel::Empty => {
            if !element.text.is_empty() {
                out.push(SchemaViolation {
                    path: path.to_string(),
                    message: "text content not allowed".to_string(),
                });
            }
            for child in &element.children {
                out.push(SchemaViolation {
                    path: format!("{path}/{}", child.name),
                    message: "unexpected element in empty content".to_string(),
                });
            }
        }
        ContentModel::Children(declared) => {
            if !element.text.is_empty() {
                out.push(SchemaViolation {
                    path: path.to_string(),
                    message: "text content not allowed in element-only content".to_string(),
                });
            }
            validate_sequence(declared, element, path, out);
        }
    }
}

/// Walks an ordered sequence, enforcing occurrence bounds.
fn validate_sequence(
    declared: &[ElementDecl],
    element: &XmlElement,
    path: &str,
    out: &mut Vec<SchemaViolation>,
) {
    let mut cursor = 0;
    for decl in declared {
        let mut seen = 0;
        while cursor < element.children.len() && element.children[cursor].name == decl.name {
            let child = &element.children[cursor];
            let child_path = child_path(path, decl, seen + 1);
            validate_element(decl, child, &child_path, out);
            seen += 1;
            cursor += 1;
        }
        if seen < decl.min_occurs {
            out.push(SchemaViolation {
                path: format!("{path}/{}", decl.name),
                message: "required element is missing".to_string(),
            });
        }
        if decl.max_occurs == Occurs::One && seen > 1 {
            out.push(SchemaViolation {
                path: format!("{path}/{}", decl.name),
                message: format!("element occurs {seen} times; at most one allowed"),
            });
        }
    }
    for child in &element.children[cursor..] {
        out.push(SchemaViolation {
            path: format!("{path}/{}", child.name),
            message: "unexpected element".to_string(),
        });
    }
}

/// Builds the path for one child occurrence.
///
/// Repeatable declarations carry a 1-based occurrence index; singletons do
/// not.
fn child_path(parent: &str, decl: &ElementDecl, index: usize) -> String {
    match decl.max_occurs {
        Occurs::Unbounded => format!("{parent}/{}[{index}]", decl.name),
        Occurs::One => format!("{parent}/{}", decl.name),
    }
}

/// Checks a lexical value against a simple type, then its facets.
///
/// Facets are skipped when the base check fails so a single bad value does
/// not produce a cascade of findings.
fn check_value(simple_type: &SimpleType, value: &str, path: &str, out: &mut Vec<SchemaViolation>) {
    let numeric = match check_base(simple_type.base, value) {
        Ok(numeric) => numeric,
        Err(message) => {
            out.push(SchemaViolation {
                path: path.to_string(),
                message,
            });
            return;
        }
    };
    for facet in &simple_type.facets {
        check_facet(facet, value, numeric.as_ref(), path, out);
    }
}

/// Checks a value against a built-in base type.
///
/// Returns the parsed numeric value for numeric bases so facet comparisons
/// do not reparse.
fn check_base(base: BaseType, value: &str) -> Result<Option<BigDecimal>, String> {
    match base {
        BaseType::String => Ok(None),
        BaseType::Decimal => {
            if !is_decimal_literal(value) {
                return Err(format!("value \"{value}\" is not a valid decimal"));
            }
            BigDecimal::from_str(value)
                .map(Some)
                .map_err(|_| format!("value \"{value}\" is not a valid decimal"))
        }
        BaseType::Integer => parse_integer(value)
            .map(Some)
            .ok_or_else(|| format!("value \"{value}\" is not a valid integer")),
        BaseType::NonNegativeInteger => {
            let Some(number) = parse_integer(value) else {
                return Err(format!("value \"{value}\" is not a valid integer"));
            };
            if number < BigDecimal::from(0) {
                return Err(format!("value \"{value}\" is not a non-negative integer"));
            }
            Ok(Some(number))
        }
        BaseType::PositiveInteger => {
            let Some(number) = parse_integer(value) else {
                return Err(format!("value \"{value}\" is not a valid integer"));
            };
            if number < BigDecimal::from(1) {
                return Err(format!("value \"{value}\" is not a positive integer"));
            }
            Ok(Some(number))
        }
        BaseType::Boolean => match value {
            "true" | "false" | "1" | "0" => Ok(None),
            _ => Err(format!("value \"{value}\" is not a valid boolean")),
        },
        BaseType::DateTime => match OffsetDateTime::parse(value, &Rfc3339) {
            Ok(_) => Ok(None),
            Err(_) => Err(format!("value \"{value}\" is not a valid dateTime")),
        },
    }
}

/// Checks one facet against a value.
fn check_facet(
    facet: &Facet,
    value: &str,
    numeric: Option<&BigDecimal>,
    path: &str,
    out: &mut Vec<SchemaViolation>,
) {
    match facet {
        Facet::Enumeration(allowed) => {
            if !allowed.iter().any(|candidate| candidate == value) {
                out.push(SchemaViolation {
                    path: path.to_string(),
                    message: format!(
                        "value \"{value}\" is not one of: {}",
                        allowed.join(", ")
                    ),
                });
            }
        }
        Facet::MinInclusive(bound) => {
            if let Some(number) = numeric
                && number < bound
            {
                out.push(SchemaViolation {
                    path: path.to_string(),
                    message: format!("value {value} is below the minimum {bound}"),
                });
            }
        }
        Facet::MaxInclusive(bound) => {
            if let Some(number) = numeric
                && number > bound
            {
                out.push(SchemaViolation {
                    path: path.to_string(),
                    message: format!("value {value} is above the maximum {bound}"),
                });
            }
        }
        Facet::MinLength(min) => {
            if value.chars().count() < *min {
                out.push(SchemaViolation {
                    path: path.to_string(),
                    message: format!("value is shorter than the minimum length {min}"),
                });
            }
        }
        Facet::MaxLength(max) => {
            if value.chars().count() > *max {
                out.push(SchemaViolation {
                    path: path.to_string(),
                    message: format!("value is longer than the maximum length {max}"),
                });
            }
        }
    }
}

/// Returns true for decimal literals without exponent notation.
fn is_decimal_literal(value: &str) -> bool {
    let body = value.strip_prefix(['+', '-']).unwrap_or(value);
    if body.is_empty() || body == "." {
        return false;
    }
    let mut dots = 0;
    for ch in body.chars() {
        if ch == '.' {
            dots += 1;
        } else if !ch.is_ascii_digit() {
            return false;
        }
    }
    dots <= 1
}

/// Parses an integer literal of arbitrary precision.
fn parse_integer(value: &str) -> Option<BigDecimal> {
    let body = value.strip_prefix(['+', '-']).unwrap_or(value);
    if body.is_empty() || !body.chars().all(|ch| ch.is_ascii_digit()) {
        return None;
    }
    BigDecimal::from_str(value).ok()
}

// ============================================================================
// SECTION: Tests
// ============================================================================
