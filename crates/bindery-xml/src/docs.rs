// crates/bindery-xml/src/docs.rs
// ============================================================================
// Module: Document Stores
// Description: File-backed catalog and orders documents with validated writes.
// Purpose: Map typed models to stored XML and gate every write on the schema.
// Dependencies: bindery-core
// ============================================================================

//! ## Overview
//! [`CatalogStore`] and [`OrdersStore`] own the two XML documents on disk.
//! Each store compiles its embedded schema at open time, bootstraps an empty
//! root when the file is missing, and serializes read-modify-write cycles
//! behind a mutex so concurrent handlers never interleave writes. Saving
//! validates the full tree first: an invalid tree is never written, and the
//! previous file contents survive a failed save.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Mutex;
use std::sync::MutexGuard;

use bindery_core::Book;
use bindery_core::BookId;
use bindery_core::Customer;
use bindery_core::DEFAULT_CURRENCY;
use bindery_core::Money;
use bindery_core::Order;
use bindery_core::OrderId;
use bindery_core::OrderItem;
use bindery_core::OrderStatus;
use bindery_core::Price;
use bindery_core::StatusChange;
use bindery_core::Timestamp;
use thiserror::Error;

use crate::codec::XmlError;
use crate::codec::parse_document;
use crate::codec::write_document;
use crate::schema::Schema;
use crate::schema::SchemaError;
use crate::schema::SchemaViolation;
use crate::tree::XmlElement;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Embedded catalog schema source.
const CATALOG_SCHEMA: &str = include_str!("../schemas/catalog.xsd");
/// Embedded orders schema source.
const ORDERS_SCHEMA: &str = include_str!("../schemas/orders.xsd");
/// File name of the catalog document inside the data directory.
pub const CATALOG_FILE: &str = "catalog.xml";
/// File name of the orders document inside the data directory.
pub const ORDERS_FILE: &str = "orders.xml";
/// Root element name of the catalog document.
const CATALOG_ROOT: &str = "catalog";
/// Root element name of the orders document.
const ORDERS_ROOT: &str = "orders";
/// Element name of one catalog entry.
const BOOK_ELEMENT: &str = "book";
/// Element name of one order entry.
const ORDER_ELEMENT: &str = "order";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Document store failure.
///
/// # Invariants
/// - Variants are stable for error classification at the API layer.
#[derive(Debug, Error)]
pub enum DocError {
    /// Filesystem or lock access failed.
    #[error("document I/O failed: {0}")]
    Io(String),
    /// Stored text is not well-formed XML.
    #[error("document parse failed: {0}")]
    Parse(#[from] XmlError),
    /// A tree failed schema validation; every violation is carried.
    #[error("document failed schema validation ({} violations)", .0.len())]
    Invalid(Vec<SchemaViolation>),
    /// Typed mapping between the tree and the model failed.
    #[error("document mapping failed: {0}")]
    Model(String),
    /// The requested entity does not exist in the document.
    #[error("entity not found")]
    NotFound,
    /// The embedded schema failed to compile.
    #[error("embedded schema failed to compile: {0}")]
    Schema(#[from] SchemaError),
}

// ============================================================================
// SECTION: Shared Document File
// ============================================================================

/// One XML document on disk plus its compiled schema and write guard.
struct DocumentFile {
    /// Path of the stored document.
    path: PathBuf,
    /// Compiled schema used to gate every write.
    schema: Schema,
    /// Embedded XSD source, exposed for export.
    schema_source: &'static str,
    /// Serializes read-modify-write cycles across handlers.
    guard: Mutex<()>,
}

impl DocumentFile {
    /// Opens a document, bootstrapping an empty root when the file is absent.
    fn open(
        data_dir: &Path,
        file_name: &str,
        schema_source: &'static str,
        root_name: &str,
    ) -> Result<Self, DocError> {
        let schema = Schema::parse(schema_source)?;
        fs::create_dir_all(data_dir).map_err(|err| DocError::Io(err.to_string()))?;
        let path = data_dir.join(file_name);
        if !path.exists() {
            let rendered = write_document(&XmlElement::new(root_name));
            fs::write(&path, rendered).map_err(|err| DocError::Io(err.to_string()))?;
        }
        Ok(Self {
            path,
            schema,
            schema_source,
            guard: Mutex::new(()),
        })
    }

    /// Acquires the write guard.
    fn lock(&self) -> Result<MutexGuard<'_, ()>, DocError> {
        self.guard.lock().map_err(|_| DocError::Io("document mutex poisoned".to_string()))
    }

    /// Reads the stored document text.
    fn read_text(&self) -> Result<String, DocError> {
        fs::read_to_string(&self.path).map_err(|err| DocError::Io(err.to_string()))
    }

    /// Reads and parses the stored document.
    fn read_tree(&self) -> Result<XmlElement, DocError> {
        let text = self.read_text()?;
        parse_document(&text).map_err(DocError::Parse)
    }

    /// Validates and writes a tree.
    ///
    /// The rendered text goes to a sibling staging file first, then replaces
    /// the live document by rename, so a failed write never truncates it.
    fn write_tree(&self, root: &XmlElement) -> Result<(), DocError> {
        let violations = self.schema.validate(root);
        if !violations.is_empty() {
            return Err(DocError::Invalid(violations));
        }
        let rendered = write_document(root);
        let staged = self.path.with_extension("tmp");
        fs::write(&staged, &rendered).map_err(|err| DocError::Io(err.to_string()))?;
        fs::rename(&staged, &self.path).map_err(|err| DocError::Io(err.to_string()))?;
        Ok(())
    }

    /// Parses the stored document and returns its schema violations.
    fn validate_stored(&self) -> Result<Vec<SchemaViolation>, DocError> {
        let tree = self.read_tree()?;
        Ok(self.schema.validate(&tree))
    }
}

// ============================================================================
// SECTION: Catalog Store
// ============================================================================

/// File-backed store for the catalog document.
pub struct CatalogStore {
    /// Underlying document file.
    file: DocumentFile,
}

impl CatalogStore {
    /// Opens the catalog document inside the data directory.
    ///
    /// Creates the directory and an empty `<catalog/>` document when absent.
    ///
    /// # Errors
    ///
    /// Returns [`DocError`] when the directory or file cannot be created.
    pub fn open(data_dir: &Path) -> Result<Self, DocError> {
        Ok(Self {
            file: DocumentFile::open(data_dir, CATALOG_FILE, CATALOG_SCHEMA, CATALOG_ROOT)?,
        })
    }

    /// Loads every book in document order.
    ///
    /// # Errors
    ///
    /// Returns [`DocError`] when the file cannot be read, parsed, or mapped.
    pub fn load(&self) -> Result<Vec<Book>, DocError> {
        let _guard = self.file.lock()?;
        self.load_locked()
    }

    /// Validates and saves the full book collection.
    ///
    /// # Errors
    ///
    /// Returns [`DocError::Invalid`] with every violation when the tree fails
    /// validation; the stored file is left untouched.
    pub fn save(&self, books: &[Book]) -> Result<(), DocError> {
        let _guard = self.file.lock()?;
        self.save_locked(books)
    }

    /// Runs a read-modify-write cycle under the write guard.
    ///
    /// # Errors
    ///
    /// Returns the closure's error without saving, or any load/save failure.
    pub fn mutate<T>(
        &self,
        apply: impl FnOnce(&mut Vec<Book>) -> Result<T, DocError>,
    ) -> Result<T, DocError> {
        let _guard = self.file.lock()?;
        let mut books = self.load_locked()?;
        let value = apply(&mut books)?;
        self.save_locked(&books)?;
        Ok(value)
    }

    /// Returns the document text exactly as stored.
    ///
    /// # Errors
    ///
    /// Returns [`DocError`] when the file cannot be read.
    pub fn raw_xml(&self) -> Result<String, DocError> {
        let _guard = self.file.lock()?;
        self.file.read_text()
    }

    /// Validates the stored document without mutating it.
    ///
    /// # Errors
    ///
    /// Returns [`DocError`] when the file cannot be read or parsed.
    pub fn validate_stored(&self) -> Result<Vec<SchemaViolation>, DocError> {
        let _guard = self.file.lock()?;
        self.file.validate_stored()
    }

    /// Returns the embedded XSD source.
    #[must_use]
    pub const fn schema_text(&self) -> &'static str {
        self.file.schema_source
    }

    /// Parses and validates an uploaded catalog document without storing it.
    ///
    /// # Errors
    ///
    /// Returns [`DocError::Parse`] for malformed XML, [`DocError::Invalid`]
    /// with every violation when the tree fails the schema, and
    /// [`DocError::Model`] when a valid tree cannot be mapped.
    pub fn parse_books(&self, xml: &str) -> Result<Vec<Book>, DocError> {
        let tree = parse_document(xml).map_err(DocError::Parse)?;
        let violations = self.file.schema.validate(&tree);
        if !violations.is_empty() {
            return Err(DocError::Invalid(violations));
        }
        tree.children_named(BOOK_ELEMENT).map(book_from_element).collect()
    }

    /// Loads books with the guard already held.
    fn load_locked(&self) -> Result<Vec<Book>, DocError> {
        let tree = self.file.read_tree()?;
        if tree.name != CATALOG_ROOT {
            return Err(DocError::Invalid(self.file.schema.validate(&tree)));
        }
        tree.children_named(BOOK_ELEMENT).map(book_from_element).collect()
    }

    /// Saves books with the guard already held.
    fn save_locked(&self, books: &[Book]) -> Result<(), DocError> {
        let mut root = XmlElement::new(CATALOG_ROOT);
        for book in books {
            root.push_child(book_to_element(book));
        }
        self.file.write_tree(&root)
    }
}

// ============================================================================
// SECTION: Orders Store
// ============================================================================

/// File-backed store for the orders document.
pub struct OrdersStore {
    /// Underlying document file.
    file: DocumentFile,
}

impl OrdersStore {
    /// Opens the orders document inside the data directory.
    ///
    /// Creates the directory and an empty `<orders/>` document when absent.
    ///
    /// # Errors
    ///
    /// Returns [`DocError`] when the directory or file cannot be created.
    pub fn open(data_dir: &Path) -> Result<Self, DocError> {
        Ok(Self {
            file: DocumentFile::open(data_dir, ORDERS_FILE, ORDERS_SCHEMA, ORDERS_ROOT)?,
        })
    }

    /// Loads every order in document order.
    ///
    /// A document holding a single `<item>` or `<statusChange>` loads into
    /// the same vector forms as the repeated case.
    ///
    /// # Errors
    ///
    /// Returns [`DocError`] when the file cannot be read, parsed, or mapped.
    pub fn load(&self) -> Result<Vec<Order>, DocError> {
        let _guard = self.file.lock()?;
        self.load_locked()
    }

    /// Validates and saves the full order collection.
    ///
    /// # Errors
    ///
    /// Returns [`DocError::Invalid`] with every violation when the tree fails
    /// validation; the stored file is left untouched.
    pub fn save(&self, orders: &[Order]) -> Result<(), DocError> {
        let _guard = self.file.lock()?;
        self.save_locked(orders)
    }

    /// Runs a read-modify-write cycle under the write guard.
    ///
    /// # Errors
    ///
    /// Returns the closure's error without saving, or any load/save failure.
    pub fn mutate<T>(
        &self,
        apply: impl FnOnce(&mut Vec<Order>) -> Result<T, DocError>,
    ) -> Result<T, DocError> {
        let _guard = self.file.lock()?;
        let mut orders = self.load_locked()?;
        let value = apply(&mut orders)?;
        self.save_locked(&orders)?;
        Ok(value)
    }

    /// Returns the document text exactly as stored.
    ///
    /// # Errors
    ///
    /// Returns [`DocError`] when the file cannot be read.
    pub fn raw_xml(&self) -> Result<String, DocError> {
        let _guard = self.file.lock()?;
        self.file.read_text()
    }

    /// Validates the stored document without mutating it.
    ///
    /// # Errors
    ///
    /// Returns [`DocError`] when the file cannot be read or parsed.
    pub fn validate_stored(&self) -> Result<Vec<SchemaViolation>, DocError> {
        let _guard = self.file.lock()?;
        self.file.validate_stored()
    }

    /// Returns the embedded XSD source.
    #[must_use]
    pub const fn schema_text(&self) -> &'static str {
        self.file.schema_source
    }

    /// Loads orders with the guard already held.
    fn load_locked(&self) -> Result<Vec<Order>, DocError> {
        let tree = self.file.read_tree()?;
        if tree.name != ORDERS_ROOT {
            return Err(DocError::Invalid(self.file.schema.validate(&tree)));
        }
        tree.children_named(ORDER_ELEMENT).map(order_from_element).collect()
    }

    /// Saves orders with the guard already held.
    fn save_locked(&self, orders: &[Order]) -> Result<(), DocError> {
        let mut root = XmlElement::new(ORDERS_ROOT);
        for order in orders {
            root.push_child(order_to_element(order));
        }
        self.file.write_tree(&root)
    }
}

// ============================================================================
// SECTION: Book Mapping
// ============================================================================

/// Serializes one book as a `<book>` element.
#[must_use]
pub fn book_to_element(book: &Book) -> XmlElement {
    let mut element = XmlElement::new(BOOK_ELEMENT);
    element.set_attr("id", book.id.as_str());
    element.set_attr("deleted", if book.deleted { "true" } else { "false" });
    element.push_child(XmlElement::with_text("title", book.title.as_str()));
    element.push_child(XmlElement::with_text("author", book.author.as_str()));
    element.push_child(XmlElement::with_text("category", book.category.as_str()));
    let mut price = XmlElement::with_text("price", book.price.amount.to_string());
    price.set_attr("currency", book.price.currency.as_str());
    element.push_child(price);
    element.push_child(XmlElement::with_text("description", book.description.as_str()));
    element.push_child(XmlElement::with_text("isbn", book.isbn.as_str()));
    element.push_child(XmlElement::with_text("year", book.year.to_string()));
    element.push_child(XmlElement::with_text("stock", book.stock.to_string()));
    if let Some(image) = &book.image {
        element.push_child(XmlElement::with_text("image", image.as_str()));
    }
    element
}

/// Reads one book from a `<book>` element.
///
/// Missing string children map to empty strings; the schema enforces their
/// presence on the next save.
fn book_from_element(element: &XmlElement) -> Result<Book, DocError> {
    let id = element
        .attr("id")
        .ok_or_else(|| DocError::Model("book is missing an id attribute".to_string()))?;
    let deleted = matches!(element.attr("deleted"), Some("true" | "1"));
    let price_element = element
        .child("price")
        .ok_or_else(|| DocError::Model(format!("book {id} has no price element")))?;
    let amount = Money::parse(price_element.text.trim())
        .map_err(|err| DocError::Model(format!("book {id}: {err}")))?;
    let currency = price_element.attr("currency").unwrap_or(DEFAULT_CURRENCY).to_string();
    let year = parse_child_number::<i32>(element, "year", id)?;
    let stock = parse_child_number::<u32>(element, "stock", id)?;
    Ok(Book {
        id: BookId::new(id),
        deleted,
        title: element.child_text("title").unwrap_or_default().to_string(),
        author: element.child_text("author").unwrap_or_default().to_string(),
        category: element.child_text("category").unwrap_or_default().to_string(),
        price: Price {
            amount,
            currency,
        },
        description: element.child_text("description").unwrap_or_default().to_string(),
        isbn: element.child_text("isbn").unwrap_or_default().to_string(),
        year,
        stock,
        image: element.child_text("image").map(ToString::to_string),
    })
}

/// Parses a numeric child element's text.
fn parse_child_number<T: FromStr>(
    element: &XmlElement,
    child: &str,
    context: &str,
) -> Result<T, DocError> {
    let text = element.child_text(child).unwrap_or_default();
    text.trim().parse::<T>().map_err(|_| {
        DocError::Model(format!("book {context} has an invalid {child} value \"{text}\""))
    })
}

// ============================================================================
// SECTION: Order Mapping
// ============================================================================

/// Serializes one order as an `<order>` element.
#[must_use]
pub fn order_to_element(order: &Order) -> XmlElement {
    let mut element = XmlElement::new(ORDER_ELEMENT);
    element.set_attr("id", order.id.as_str());
    element.set_attr("date", order.date.to_rfc3339());
    element.set_attr("status", order.status.as_str());
    let mut customer = XmlElement::new("customer");
    customer.push_child(XmlElement::with_text("name", order.customer.name.as_str()));
    customer.push_child(XmlElement::with_text("email", order.customer.email.as_str()));
    customer.push_child(XmlElement::with_text("phone", order.customer.phone.as_str()));
    customer.push_child(XmlElement::with_text("city", order.customer.city.as_str()));
    customer.push_child(XmlElement::with_text("address", order.customer.address.as_str()));
    element.push_child(customer);
    let mut items = XmlElement::new("items");
    for item in &order.items {
        let mut entry = XmlElement::new("item");
        entry.set_attr("book_id", item.book_id.as_str());
        entry.set_attr("quantity", item.quantity.to_string());
        entry.push_child(XmlElement::with_text("title", item.title.as_str()));
        entry.push_child(XmlElement::with_text("price", item.price.to_string()));
        entry.push_child(XmlElement::with_text("subtotal", item.subtotal.to_string()));
        items.push_child(entry);
    }
    element.push_child(items);
    element.push_child(XmlElement::with_text("total", order.total.to_string()));
    let mut history = XmlElement::new("statusHistory");
    for change in &order.status_history {
        let mut entry = XmlElement::new("statusChange");
        entry.set_attr("date", change.date.to_rfc3339());
        entry.set_attr("status", change.status.as_str());
        entry.set_attr("comment", change.comment.as_str());
        history.push_child(entry);
    }
    element.push_child(history);
    if !order.notes.is_empty() {
        element.push_child(XmlElement::with_text("notes", order.notes.as_str()));
    }
    element
}

/// Reads one order from an `<order>` element.
fn order_from_element(element: &XmlElement) -> Result<Order, DocError> {
    let id = element
        .attr("id")
        .ok_or_else(|| DocError::Model("order is missing an id attribute".to_string()))?;
    let date = element
        .attr("date")
        .ok_or_else(|| DocError::Model(format!("order {id} is missing a date attribute")))?;
    let date =
        Timestamp::parse(date).map_err(|err| DocError::Model(format!("order {id}: {err}")))?;
    let status = element
        .attr("status")
        .ok_or_else(|| DocError::Model(format!("order {id} is missing a status attribute")))?;
    let status = OrderStatus::from_str(status)
        .map_err(|err| DocError::Model(format!("order {id}: {err}")))?;
    let customer_element = element.child("customer");
    let customer = Customer {
        name: child_text_of(customer_element, "name"),
        email: child_text_of(customer_element, "email"),
        phone: child_text_of(customer_element, "phone"),
        city: child_text_of(customer_element, "city"),
        address: child_text_of(customer_element, "address"),
    };
    let mut items = Vec::new();
    if let Some(container) = element.child("items") {
        for entry in container.children_named("item") {
            items.push(item_from_element(entry, id)?);
        }
    }
    let total = money_child(element, "total", id)?;
    let mut status_history = Vec::new();
    if let Some(container) = element.child("statusHistory") {
        for entry in container.children_named("statusChange") {
            status_history.push(status_change_from_element(entry, id)?);
        }
    }
    Ok(Order {
        id: OrderId::new(id),
        date,
        status,
        customer,
        items,
        total,
        status_history,
        notes: element.child_text("notes").unwrap_or_default().to_string(),
    })
}

/// Reads a child's text through an optional parent.
fn child_text_of(parent: Option<&XmlElement>, name: &str) -> String {
    parent.and_then(|element| element.child_text(name)).unwrap_or_default().to_string()
}

/// Reads one order item from an `<item>` element.
fn item_from_element(element: &XmlElement, order_id: &str) -> Result<OrderItem, DocError> {
    let book_id = element.attr("book_id").ok_or_else(|| {
        DocError::Model(format!("order {order_id} has an item without a book_id attribute"))
    })?;
    let quantity = element.attr("quantity").unwrap_or_default();
    let quantity = quantity.trim().parse::<u32>().map_err(|_| {
        DocError::Model(format!(
            "order {order_id} item {book_id} has an invalid quantity \"{quantity}\""
        ))
    })?;
    Ok(OrderItem {
        book_id: BookId::new(book_id),
        quantity,
        title: element.child_text("title").unwrap_or_default().to_string(),
        price: money_child(element, "price", order_id)?,
        subtotal: money_child(element, "subtotal", order_id)?,
    })
}

/// Reads one status change from a `<statusChange>` element.
fn status_change_from_element(
    element: &XmlElement,
    order_id: &str,
) -> Result<StatusChange, DocError> {
    let date = element.attr("date").ok_or_else(|| {
        DocError::Model(format!("order {order_id} has a status change without a date"))
    })?;
    let date =
        Timestamp::parse(date).map_err(|err| DocError::Model(format!("order {order_id}: {err}")))?;
    let status = element.attr("status").ok_or_else(|| {
        DocError::Model(format!("order {order_id} has a status change without a status"))
    })?;
    let status = OrderStatus::from_str(status)
        .map_err(|err| DocError::Model(format!("order {order_id}: {err}")))?;
    Ok(StatusChange {
        date,
        status,
        comment: element.attr("comment").unwrap_or_default().to_string(),
    })
}

/// Reads a decimal child element as money.
fn money_child(element: &XmlElement, child: &str, context: &str) -> Result<Money, DocError> {
    let text = element.child_text(child).unwrap_or_default();
    Money::parse(text.trim())
        .map_err(|err| DocError::Model(format!("order {context} has an invalid {child}: {err}")))
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions and helpers are permitted."
    )]

    use bindery_core::Book;
    use bindery_core::BookId;
    use bindery_core::Money;
    use bindery_core::Price;

    use super::book_from_element;
    use super::book_to_element;
    use crate::codec::parse_document;

    fn demo_book() -> Book {
        Book {
            id: BookId::new("book_1700000000000_042"),
            deleted: false,
            title: "The Snow Queen".to_string(),
            author: "Hans Christian Andersen".to_string(),
            category: "children".to_string(),
            price: Price::uah(Money::parse("279.00").expect("price")),
            description: "Illustrated fairy tale".to_string(),
            isbn: "978-617-12-0001-1".to_string(),
            year: 2019,
            stock: 25,
            image: None,
        }
    }

    #[test]
    fn book_mapping_round_trips() {
        let book = demo_book();
        let element = book_to_element(&book);
        let back = book_from_element(&element).expect("element should map back");
        assert_eq!(back, book);
    }

    #[test]
    fn absent_deleted_attribute_means_false() {
        let source = "<book id=\"book_1\">\
                        <title>t</title><author>a</author><category>fiction</category>\
                        <price currency=\"UAH\">10.00</price><description>d</description>\
                        <isbn>i</isbn><year>2001</year><stock>3</stock>\
                      </book>";
        let element = parse_document(source).expect("book should parse");
        let book = book_from_element(&element).expect("book should map");
        assert!(!book.deleted);
        assert_eq!(book.price.currency, "UAH");
    }

    #[test]
    fn junk_numeric_fields_are_model_errors() {
        let source = "<book id=\"book_1\">\
                        <title>t</title><author>a</author><category>fiction</category>\
                        <price currency=\"UAH\">10.00</price><description>d</description>\
                        <isbn>i</isbn><year>MMXI</year><stock>3</stock>\
                      </book>";
        let element = parse_document(source).expect("book should parse");
        let error = book_from_element(&element).expect_err("junk year must fail");
        assert!(error.to_string().contains("invalid year"), "{error}");
    }
}
