// crates/bindery-xml/src/lib.rs
// ============================================================================
// Module: Bindery XML Crate Root
// Description: XML tree, codec, projection, schema validation, and stores.
// Purpose: Own every XML concern so other crates work with typed models.
// Dependencies: bigdecimal, bindery-core, quick-xml, serde, serde_json,
//               thiserror, time
// ============================================================================

//! ## Overview
//! This crate owns the XML persistence layer: a generic element tree, a
//! strict reader/writer, the object-mapping JSON projection, an XSD-subset
//! validator, and the file-backed catalog and orders stores. Every write
//! passes schema validation before it reaches disk, so the stored documents
//! are valid at rest by construction.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod codec;
pub mod docs;
pub mod project;
pub mod schema;
pub mod tree;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use codec::XmlError;
pub use codec::parse_document;
pub use codec::write_document;
pub use docs::CATALOG_FILE;
pub use docs::CatalogStore;
pub use docs::DocError;
pub use docs::ORDERS_FILE;
pub use docs::OrdersStore;
pub use docs::book_to_element;
pub use docs::order_to_element;
pub use project::document_to_value;
pub use project::element_to_value;
pub use schema::Schema;
pub use schema::SchemaError;
pub use schema::SchemaViolation;
pub use tree::XmlElement;
