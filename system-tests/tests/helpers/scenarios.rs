// system-tests/tests/helpers/scenarios.rs
// ============================================================================
// Module: Scenario Fixtures
// Description: Shared request payloads and response accessors for suites.
// Purpose: Keep book and order fixtures consistent across test binaries.
// Dependencies: serde_json
// ============================================================================

use serde_json::Value;
use serde_json::json;

/// Builds a complete book creation payload.
pub fn book_payload(title: &str, isbn: &str) -> Value {
    json!({
        "title": title,
        "author": "Taras Shevchenko",
        "category": "fiction",
        "price": "279.00",
        "description": "Collected poems",
        "isbn": isbn,
        "year": 2019,
        "stock": 12,
    })
}

/// Builds an order placement payload with one line of the fixture book.
pub fn order_payload(email: &str, book_id: &str, quantity: u32) -> Value {
    json!({
        "customer": {
            "name": "Anna Kovalenko",
            "email": email,
            "phone": "+380671234567",
            "city": "Kyiv",
            "address": "10 Khreshchatyk St, apt 5",
        },
        "items": [{
            "book_id": book_id,
            "title": "Kobzar",
            "quantity": quantity,
            "price": "279.00",
        }],
    })
}

/// Renders a schema-valid one-book catalog document for imports.
pub fn import_document(id: &str, title: &str) -> String {
    format!(
        "<catalog><book id=\"{id}\" deleted=\"false\"><title>{title}</title>\
         <author>Lesia Ukrainka</author><category>fiction</category>\
         <price currency=\"UAH\">180.00</price>\
         <description>Drama in verse</description>\
         <isbn>978-617-12-4925-3</isbn><year>2021</year><stock>4</stock>\
         </book></catalog>"
    )
}

/// Pulls the generated identifier out of a book response.
pub fn extract_book_id(body: &Value) -> Result<String, String> {
    body["book"]["$"]["id"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| format!("missing book id in response: {body}"))
}

/// Pulls the generated identifier out of a placement response.
pub fn extract_order_id(body: &Value) -> Result<String, String> {
    body["order"]["id"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| format!("missing order id in response: {body}"))
}
