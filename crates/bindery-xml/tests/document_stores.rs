// crates/bindery-xml/tests/document_stores.rs
// ============================================================================
// Module: Document Store Integration Tests
// Description: File-backed catalog and orders store behavior.
// Purpose: Validate bootstrap, round trips, validation gating, and recovery.
// ============================================================================

//! ## Overview
//! Integration tests for the two document stores:
//! - Bootstrap of empty roots on first open
//! - Typed save/load round trips for books and orders
//! - Validation gating: invalid trees never reach disk
//! - Mutation cycles and their failure behavior
//! - Raw export, stored validation, and schema export

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::fs;

use bindery_core::Book;
use bindery_core::BookId;
use bindery_core::Customer;
use bindery_core::Money;
use bindery_core::Order;
use bindery_core::OrderId;
use bindery_core::OrderItem;
use bindery_core::OrderStatus;
use bindery_core::Price;
use bindery_core::StatusChange;
use bindery_core::Timestamp;
use bindery_xml::CatalogStore;
use bindery_xml::DocError;
use bindery_xml::OrdersStore;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn sample_book(id: &str, title: &str) -> Book {
    Book {
        id: BookId::new(id),
        deleted: false,
        title: title.to_string(),
        author: "Ivan Franko".to_string(),
        category: "fiction".to_string(),
        price: Price::uah(Money::parse("189.50").expect("price")),
        description: "Collected stories".to_string(),
        isbn: "978-966-03-4539-1".to_string(),
        year: 1905,
        stock: 7,
        image: None,
    }
}

fn sample_order(id: &str) -> Order {
    let price = Money::parse("279.00").expect("price");
    let item = OrderItem::new(BookId::new("book_1700000000000_001"), 2, "The Snow Queen", price);
    let total = Order::total_of(std::slice::from_ref(&item));
    let placed = Timestamp::parse("2024-05-01T10:30:00Z").expect("timestamp");
    Order {
        id: OrderId::new(id),
        date: placed,
        status: OrderStatus::New,
        customer: Customer {
            name: "Anna Kovalenko".to_string(),
            email: "anna@example.com".to_string(),
            phone: "+380671234567".to_string(),
            city: "Kyiv".to_string(),
            address: "10 Khreshchatyk St, apt 5".to_string(),
        },
        items: vec![item],
        total,
        status_history: vec![StatusChange {
            date: placed,
            status: OrderStatus::New,
            comment: "Order created".to_string(),
        }],
        notes: String::new(),
    }
}

// ============================================================================
// SECTION: Catalog Store
// ============================================================================

#[test]
fn open_bootstraps_an_empty_catalog() {
    let dir = TempDir::new().expect("tempdir");
    let store = CatalogStore::open(dir.path()).expect("open");
    let books = store.load().expect("load");
    assert!(books.is_empty(), "fresh catalog must be empty");
    let stored = fs::read_to_string(dir.path().join("catalog.xml")).expect("read file");
    assert!(stored.contains("<catalog/>"), "bootstrap document: {stored}");
}

#[test]
fn catalog_save_and_load_round_trip() {
    let dir = TempDir::new().expect("tempdir");
    let store = CatalogStore::open(dir.path()).expect("open");
    let books =
        vec![sample_book("book_1700000000000_001", "Zakhar Berkut"), sample_book("book_1700000000000_002", "Perekhresni Stezhky")];
    store.save(&books).expect("save");
    let loaded = store.load().expect("load");
    assert_eq!(loaded, books);
}

#[test]
fn invalid_book_never_reaches_disk() {
    let dir = TempDir::new().expect("tempdir");
    let store = CatalogStore::open(dir.path()).expect("open");
    store.save(&[sample_book("book_1", "Kept")]).expect("first save");
    let before = store.raw_xml().expect("raw");

    let mut bad = sample_book("book_2", "Rejected");
    bad.category = "cooking".to_string();
    let error = store.save(&[sample_book("book_1", "Kept"), bad]).expect_err("must fail");
    let DocError::Invalid(violations) = error else {
        panic!("expected Invalid, got {error}");
    };
    assert!(
        violations
            .iter()
            .any(|violation| violation.path == "/catalog/book[2]/category"),
        "violations: {violations:?}"
    );
    assert_eq!(store.raw_xml().expect("raw"), before, "file must be untouched");
}

#[test]
fn mutate_applies_and_persists() {
    let dir = TempDir::new().expect("tempdir");
    let store = CatalogStore::open(dir.path()).expect("open");
    store.save(&[sample_book("book_1", "First")]).expect("save");
    let count = store
        .mutate(|books| {
            books.push(sample_book("book_2", "Second"));
            Ok(books.len())
        })
        .expect("mutate");
    assert_eq!(count, 2);
    assert_eq!(store.load().expect("load").len(), 2);
}

#[test]
fn mutate_closure_error_leaves_file_untouched() {
    let dir = TempDir::new().expect("tempdir");
    let store = CatalogStore::open(dir.path()).expect("open");
    store.save(&[sample_book("book_1", "Only")]).expect("save");
    let before = store.raw_xml().expect("raw");
    let error = store
        .mutate(|books| -> Result<(), DocError> {
            books.clear();
            Err(DocError::NotFound)
        })
        .expect_err("closure error must propagate");
    assert!(matches!(error, DocError::NotFound));
    assert_eq!(store.raw_xml().expect("raw"), before);
}

#[test]
fn corrupt_catalog_is_a_parse_error() {
    let dir = TempDir::new().expect("tempdir");
    let store = CatalogStore::open(dir.path()).expect("open");
    fs::write(dir.path().join("catalog.xml"), "<catalog><book></catalog>").expect("corrupt");
    assert!(matches!(store.load(), Err(DocError::Parse(_))));
}

#[test]
fn validate_stored_reports_hand_edited_damage() {
    let dir = TempDir::new().expect("tempdir");
    let store = CatalogStore::open(dir.path()).expect("open");
    store.save(&[sample_book("book_1", "Fine")]).expect("save");
    assert!(store.validate_stored().expect("validate").is_empty());

    let damaged = store.raw_xml().expect("raw").replace("fiction", "cooking");
    fs::write(dir.path().join("catalog.xml"), damaged).expect("write damage");
    let violations = store.validate_stored().expect("validate");
    assert!(
        violations.iter().any(|violation| violation.message.contains("not one of")),
        "violations: {violations:?}"
    );
}

#[test]
fn schema_text_exports_the_embedded_source() {
    let dir = TempDir::new().expect("tempdir");
    let store = CatalogStore::open(dir.path()).expect("open");
    assert!(store.schema_text().contains("xs:schema"));
    assert!(store.schema_text().contains("categoryType"));
}

// ============================================================================
// SECTION: Orders Store
// ============================================================================

#[test]
fn orders_save_and_load_round_trip() {
    let dir = TempDir::new().expect("tempdir");
    let store = OrdersStore::open(dir.path()).expect("open");
    let orders = vec![sample_order("ORD-000001"), sample_order("ORD-000002")];
    store.save(&orders).expect("save");
    let loaded = store.load().expect("load");
    assert_eq!(loaded, orders);
}

#[test]
fn single_item_and_single_change_load_as_vectors() {
    let dir = TempDir::new().expect("tempdir");
    let store = OrdersStore::open(dir.path()).expect("open");
    store.save(&[sample_order("ORD-000001")]).expect("save");
    let loaded = store.load().expect("load");
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].items.len(), 1, "single item must load as a one-element vector");
    assert_eq!(loaded[0].status_history.len(), 1);
    assert_eq!(loaded[0].total.to_string(), "558.00");
}

#[test]
fn order_with_notes_round_trips() {
    let dir = TempDir::new().expect("tempdir");
    let store = OrdersStore::open(dir.path()).expect("open");
    let mut order = sample_order("ORD-000001");
    order.notes = "Call before delivery".to_string();
    store.save(std::slice::from_ref(&order)).expect("save");
    assert_eq!(store.load().expect("load")[0].notes, "Call before delivery");
}

#[test]
fn short_customer_email_is_rejected_on_save() {
    let dir = TempDir::new().expect("tempdir");
    let store = OrdersStore::open(dir.path()).expect("open");
    let mut order = sample_order("ORD-000001");
    order.customer.email = "a".to_string();
    let error = store.save(std::slice::from_ref(&order)).expect_err("short email must fail");
    let DocError::Invalid(violations) = error else {
        panic!("expected Invalid, got {error}");
    };
    assert!(
        violations
            .iter()
            .any(|violation| violation.path == "/orders/order[1]/customer/email"),
        "violations: {violations:?}"
    );
}

#[test]
fn wrong_root_is_reported_as_invalid() {
    let dir = TempDir::new().expect("tempdir");
    let store = OrdersStore::open(dir.path()).expect("open");
    fs::write(dir.path().join("orders.xml"), "<receipts/>").expect("write");
    let error = store.load().expect_err("wrong root must fail");
    assert!(matches!(error, DocError::Invalid(_)));
}

#[test]
fn both_stores_share_one_data_directory() {
    let dir = TempDir::new().expect("tempdir");
    let catalog = CatalogStore::open(dir.path()).expect("open catalog");
    let orders = OrdersStore::open(dir.path()).expect("open orders");
    catalog.save(&[sample_book("book_1", "Alone")]).expect("save catalog");
    orders.save(&[sample_order("ORD-000001")]).expect("save orders");
    assert!(dir.path().join("catalog.xml").exists());
    assert!(dir.path().join("orders.xml").exists());
    assert_eq!(catalog.load().expect("load").len(), 1);
    assert_eq!(orders.load().expect("load").len(), 1);
}
