// system-tests/tests/suites/security.rs
// ============================================================================
// Module: Security Tests
// Description: Rejection-path coverage for untrusted inputs over HTTP.
// Purpose: Confirm credentials, uploads, and lookups fail closed.
// Dependencies: system-tests helpers
// ============================================================================

//! Rejection-path tests for the bookstore system-tests.

use helpers::harness::spawn_ready_server;
use helpers::scenarios::book_payload;
use helpers::scenarios::extract_book_id;
use helpers::scenarios::extract_order_id;
use helpers::scenarios::import_document;
use helpers::scenarios::order_payload;
use serde_json::json;

use crate::helpers;

#[tokio::test(flavor = "multi_thread")]
async fn manager_login_rejects_bad_credentials() -> Result<(), Box<dyn std::error::Error>> {
    let (handle, client) = spawn_ready_server().await?;
    let wrong = json!({"username": "manager", "password": "wrong"});
    let (status, body) = client.post_json("/auth/login/manager", &wrong).await?;
    if status != 401 || body["error"] != "Invalid username or password" {
        return Err(format!("wrong password accepted ({status}): {body}").into());
    }
    let partial = json!({"username": "manager"});
    let (status, body) = client.post_json("/auth/login/manager", &partial).await?;
    if status != 400 || body["error"] != "Username and password are required" {
        return Err(format!("missing password accepted ({status}): {body}").into());
    }
    handle.shutdown().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn client_login_rejects_malformed_emails() -> Result<(), Box<dyn std::error::Error>> {
    let (handle, client) = spawn_ready_server().await?;
    for email in ["plain", "user@host", "@host.com", "user@"] {
        let login = json!({"email": email});
        let (status, body) = client.post_json("/auth/login/client", &login).await?;
        if status != 400 || body["error"] != "Invalid email format" {
            return Err(format!("malformed email {email} accepted ({status}): {body}").into());
        }
    }
    let (status, body) = client.post_json("/auth/login/client", &json!({})).await?;
    if status != 400 || body["error"] != "Email is required" {
        return Err(format!("empty login accepted ({status}): {body}").into());
    }
    handle.shutdown().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn stylesheet_lookup_is_confined() -> Result<(), Box<dyn std::error::Error>> {
    let (handle, client) = spawn_ready_server().await?;
    let (status, body) = client.get_json("/xml/xslt/..%2Fsecret").await?;
    if status != 400 || body["error"] != "Invalid stylesheet name" {
        return Err(format!("traversal name accepted ({status}): {body}").into());
    }
    let (status, body) = client.get_json("/xml/xslt/missing").await?;
    if status != 404 || body["error"] != "Stylesheet not found" {
        return Err(format!("missing stylesheet mishandled ({status}): {body}").into());
    }
    handle.shutdown().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn schema_kind_is_constrained() -> Result<(), Box<dyn std::error::Error>> {
    let (handle, client) = spawn_ready_server().await?;
    let download = client.get_xml("/xml/xsd/catalog").await?;
    if download.status != 200 || !download.body.contains("categoryType") {
        return Err(format!("catalog schema missing ({})", download.status).into());
    }
    let (status, body) = client.get_json("/xml/xsd/invoices").await?;
    if status != 400 || body["error"] != "Unknown schema kind" {
        return Err(format!("unknown schema kind accepted ({status}): {body}").into());
    }
    handle.shutdown().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn import_rejects_bad_documents() -> Result<(), Box<dyn std::error::Error>> {
    let (handle, client) = spawn_ready_server().await?;
    let (status, body) = client.post_xml("/xml/import/catalog", "<catalog>").await?;
    let malformed = body["error"].as_str().unwrap_or_default();
    if status != 400 || !malformed.starts_with("Malformed XML") {
        return Err(format!("malformed upload accepted ({status}): {body}").into());
    }
    let (status, body) = client.post_xml("/xml/import/catalog", "   \n").await?;
    if status != 400 || body["error"] != "No XML document supplied" {
        return Err(format!("empty upload accepted ({status}): {body}").into());
    }
    let invalid = "<catalog><book id=\"book_1\"><title>Torn</title></book></catalog>";
    let (status, body) = client.post_xml("/xml/import/catalog", invalid).await?;
    if status != 400 || body["error"] != "XML failed schema validation" {
        return Err(format!("invalid upload accepted ({status}): {body}").into());
    }
    if body["errors"].as_array().is_none_or(Vec::is_empty) {
        return Err(format!("violations missing from the envelope: {body}").into());
    }
    let document = import_document("book_1700000000000_042", "The Forest Song");
    let (status, body) = client
        .post_xml("/xml/import/catalog?mode=merge", &document)
        .await?;
    if status != 400 || body["error"] != "Unknown import mode \"merge\"" {
        return Err(format!("unknown mode accepted ({status}): {body}").into());
    }
    let (_, listing) = client.get_json("/catalog").await?;
    if listing["count"] != 0 {
        return Err(format!("rejected uploads mutated the catalog: {listing}").into());
    }
    handle.shutdown().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn stock_and_status_reject_invalid_values() -> Result<(), Box<dyn std::error::Error>> {
    let (handle, client) = spawn_ready_server().await?;
    let (_, created) = client
        .post_json("/catalog", &book_payload("Kobzar", "978-966-03-4683-1"))
        .await?;
    let book_id = extract_book_id(&created)?;
    let (status, body) = client
        .patch_json(&format!("/catalog/{book_id}/stock"), &json!({"stock": -3}))
        .await?;
    if status != 400 || body["error"] != "Invalid stock value" {
        return Err(format!("negative stock accepted ({status}): {body}").into());
    }
    let (status, body) = client
        .patch_json("/catalog/book_absent/stock", &json!({"stock": 3}))
        .await?;
    if status != 404 || body["error"] != "Book not found" {
        return Err(format!("absent book stock update mishandled ({status}): {body}").into());
    }
    let (_, placed) = client
        .post_json("/orders", &order_payload("anna@example.com", &book_id, 1))
        .await?;
    let order_id = extract_order_id(&placed)?;
    let (status, body) = client
        .patch_json(
            &format!("/orders/{order_id}/status"),
            &json!({"status": "teleported"}),
        )
        .await?;
    let message = body["error"].as_str().unwrap_or_default();
    if status != 400 || !message.contains("unknown order status") {
        return Err(format!("unknown status accepted ({status}): {body}").into());
    }
    let (status, body) = client
        .patch_json(&format!("/orders/{order_id}/status"), &json!({}))
        .await?;
    if status != 400 || body["error"] != "Status is required" {
        return Err(format!("missing status accepted ({status}): {body}").into());
    }
    handle.shutdown().await;
    Ok(())
}
