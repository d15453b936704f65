// system-tests/tests/suites/operations.rs
// ============================================================================
// Module: Operations Tests
// Description: Full catalog and order lifecycle coverage over HTTP.
// Purpose: Confirm mutations, imports, and the change log behave end to end.
// Dependencies: system-tests helpers
// ============================================================================

//! Operational lifecycle tests for the bookstore system-tests.

use helpers::harness::spawn_ready_server;
use helpers::scenarios::book_payload;
use helpers::scenarios::extract_book_id;
use helpers::scenarios::extract_order_id;
use helpers::scenarios::import_document;
use helpers::scenarios::order_payload;
use serde_json::json;

use crate::helpers;

#[tokio::test(flavor = "multi_thread")]
async fn order_placement_computes_totals_server_side() -> Result<(), Box<dyn std::error::Error>> {
    let (handle, client) = spawn_ready_server().await?;
    let (_, created) = client
        .post_json("/catalog", &book_payload("Kobzar", "978-966-03-4683-1"))
        .await?;
    let book_id = extract_book_id(&created)?;
    let payload = order_payload("anna@example.com", &book_id, 2);
    let (status, placed) = client.post_json("/orders", &payload).await?;
    if status != 200 || placed["message"] != "Order placed" {
        return Err(format!("placement failed ({status}): {placed}").into());
    }
    if placed["order"]["total"] != "558.00" || placed["order"]["totalPrice"] != "558.00" {
        return Err(format!("unexpected totals: {placed}").into());
    }
    if placed["order"]["status"] != "new" {
        return Err(format!("unexpected initial status: {placed}").into());
    }
    let order_id = extract_order_id(&placed)?;
    if !order_id.starts_with("ORD-") {
        return Err(format!("unexpected order id shape: {order_id}").into());
    }
    let (_, changes) = client.get_json("/xml/changes").await?;
    let entries = changes["changes"].as_array().ok_or("changes missing")?;
    let logged = entries
        .iter()
        .any(|entry| entry["file_type"] == "orders" && entry["operation"] == "CREATE");
    if !logged {
        return Err(format!("placement missing from the change log: {changes}").into());
    }
    handle.shutdown().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn status_and_notes_updates_write_the_document() -> Result<(), Box<dyn std::error::Error>> {
    let (handle, client) = spawn_ready_server().await?;
    let (_, created) = client
        .post_json("/catalog", &book_payload("Kobzar", "978-966-03-4683-1"))
        .await?;
    let book_id = extract_book_id(&created)?;
    let (_, placed) = client
        .post_json("/orders", &order_payload("anna@example.com", &book_id, 1))
        .await?;
    let order_id = extract_order_id(&placed)?;
    let transition = json!({"status": "processing"});
    let (status, updated) = client
        .patch_json(&format!("/orders/{order_id}/status"), &transition)
        .await?;
    if status != 200 || updated["order"]["$"]["status"] != "processing" {
        return Err(format!("status update failed ({status}): {updated}").into());
    }
    let history = updated["order"]["statusHistory"]["statusChange"]
        .as_array()
        .ok_or("status history missing")?;
    if history.len() != 2 {
        return Err(format!("unexpected history length: {updated}").into());
    }
    let notes = json!({"notes": "Leave at the door"});
    let (status, noted) = client
        .patch_json(&format!("/orders/{order_id}/notes"), &notes)
        .await?;
    if status != 200 || noted["order"]["notes"] != "Leave at the door" {
        return Err(format!("notes update failed ({status}): {noted}").into());
    }
    handle.shutdown().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn soft_delete_hides_then_hard_delete_removes() -> Result<(), Box<dyn std::error::Error>> {
    let (handle, client) = spawn_ready_server().await?;
    let (_, created) = client
        .post_json("/catalog", &book_payload("Kobzar", "978-966-03-4683-1"))
        .await?;
    let book_id = extract_book_id(&created)?;
    let (status, body) = client.delete_json(&format!("/catalog/{book_id}")).await?;
    if status != 200 || body["message"] != "Book marked as deleted" {
        return Err(format!("soft delete failed ({status}): {body}").into());
    }
    let (_, listing) = client.get_json("/catalog").await?;
    if listing["count"] != 0 {
        return Err(format!("soft-deleted book still listed: {listing}").into());
    }
    let (_, unfiltered) = client.get_json("/catalog?showDeleted=true").await?;
    if unfiltered["count"] != 1 {
        return Err(format!("deleted book missing from unfiltered listing: {unfiltered}").into());
    }
    let (status, body) = client
        .delete_json(&format!("/catalog/{book_id}?hard=true"))
        .await?;
    if status != 200 || body["message"] != "Book removed from catalog" {
        return Err(format!("hard delete failed ({status}): {body}").into());
    }
    let (status, body) = client.get_json(&format!("/catalog/{book_id}")).await?;
    if status != 404 || body["error"] != "Book not found" {
        return Err(format!("hard-deleted book still fetchable ({status}): {body}").into());
    }
    handle.shutdown().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn import_modes_follow_their_merge_rules() -> Result<(), Box<dyn std::error::Error>> {
    let (handle, client) = spawn_ready_server().await?;
    let document = import_document("book_1700000000000_042", "The Forest Song");
    let (status, body) = client
        .post_xml("/xml/import/catalog?mode=replace", &document)
        .await?;
    if status != 200 || body["message"] != "Catalog imported" || body["count"] != 1 {
        return Err(format!("replace import failed ({status}): {body}").into());
    }
    let (_, added) = client
        .post_xml("/xml/import/catalog?mode=add", &document)
        .await?;
    if added["count"] != 0 {
        return Err(format!("add import duplicated an existing id: {added}").into());
    }
    let annotated = import_document("book_1700000000000_042", "The Forest Song, annotated");
    let (_, updated) = client
        .post_xml("/xml/import/catalog?mode=update", &annotated)
        .await?;
    if updated["count"] != 1 {
        return Err(format!("update import missed the matching id: {updated}").into());
    }
    let (_, listing) = client.get_json("/catalog").await?;
    if listing["books"][0]["title"] != "The Forest Song, annotated" {
        return Err(format!("updated title not stored: {listing}").into());
    }
    handle.shutdown().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn stored_documents_validate_clean() -> Result<(), Box<dyn std::error::Error>> {
    let (handle, client) = spawn_ready_server().await?;
    let (_, created) = client
        .post_json("/catalog", &book_payload("Kobzar", "978-966-03-4683-1"))
        .await?;
    let book_id = extract_book_id(&created)?;
    client
        .post_json("/orders", &order_payload("anna@example.com", &book_id, 1))
        .await?;
    let (status, catalog) = client.get_json("/catalog/validate/xsd").await?;
    if status != 200 || catalog["valid"] != true {
        return Err(format!("catalog validation failed ({status}): {catalog}").into());
    }
    let (status, orders) = client.get_json("/orders/validate/xsd").await?;
    if status != 200 || orders["valid"] != true {
        return Err(format!("orders validation failed ({status}): {orders}").into());
    }
    let (status, verdict) = client.post_empty("/xml/validate/catalog").await?;
    if status != 200 || verdict["message"] != "Catalog is valid" {
        return Err(format!("catalog verdict failed ({status}): {verdict}").into());
    }
    handle.shutdown().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn order_listing_filters_by_customer_email() -> Result<(), Box<dyn std::error::Error>> {
    let (handle, client) = spawn_ready_server().await?;
    let (_, created) = client
        .post_json("/catalog", &book_payload("Kobzar", "978-966-03-4683-1"))
        .await?;
    let book_id = extract_book_id(&created)?;
    client
        .post_json("/orders", &order_payload("anna@example.com", &book_id, 1))
        .await?;
    client
        .post_json("/orders", &order_payload("bogdan@example.com", &book_id, 1))
        .await?;
    let (_, all) = client.get_json("/orders").await?;
    if all["count"] != 2 {
        return Err(format!("unexpected unfiltered count: {all}").into());
    }
    let (_, filtered) = client.get_json("/orders?email=anna@example.com").await?;
    if filtered["count"] != 1 {
        return Err(format!("unexpected filtered count: {filtered}").into());
    }
    if filtered["orders"][0]["customer"]["email"] != "anna@example.com" {
        return Err(format!("filter returned the wrong order: {filtered}").into());
    }
    handle.shutdown().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn change_listing_honors_limit_and_entity() -> Result<(), Box<dyn std::error::Error>> {
    let (handle, client) = spawn_ready_server().await?;
    let (_, first) = client
        .post_json("/catalog", &book_payload("Kobzar", "978-966-03-4683-1"))
        .await?;
    let first_id = extract_book_id(&first)?;
    let (_, second) = client
        .post_json("/catalog", &book_payload("The Forest Song", "978-617-12-4925-3"))
        .await?;
    let second_id = extract_book_id(&second)?;
    let (_, limited) = client.get_json("/xml/changes?limit=1").await?;
    let entries = limited["changes"].as_array().ok_or("changes missing")?;
    if entries.len() != 1 || entries[0]["entity_id"] != second_id.as_str() {
        return Err(format!("limit did not keep the newest entry: {limited}").into());
    }
    let (_, scoped) = client
        .get_json(&format!("/xml/changes?entity={first_id}"))
        .await?;
    let entries = scoped["changes"].as_array().ok_or("changes missing")?;
    if entries.is_empty() {
        return Err(format!("entity filter dropped the history: {scoped}").into());
    }
    if !entries.iter().all(|entry| entry["entity_id"] == first_id.as_str()) {
        return Err(format!("entity filter leaked other entities: {scoped}").into());
    }
    handle.shutdown().await;
    Ok(())
}
