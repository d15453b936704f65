// system-tests/tests/suites/smoke.rs
// ============================================================================
// Module: Smoke Tests
// Description: Boot and happy-path coverage over HTTP.
// Purpose: Confirm a fresh server answers every route group.
// Dependencies: system-tests helpers
// ============================================================================

//! Smoke tests for the bookstore system-tests.

use helpers::harness::spawn_ready_server;
use helpers::scenarios::book_payload;
use helpers::scenarios::extract_book_id;
use serde_json::json;

use crate::helpers;

#[tokio::test(flavor = "multi_thread")]
async fn server_boots_and_serves_an_empty_catalog() -> Result<(), Box<dyn std::error::Error>> {
    let (handle, client) = spawn_ready_server().await?;
    let (status, body) = client.get_json("/catalog").await?;
    if status != 200 {
        return Err(format!("unexpected status {status}: {body}").into());
    }
    if body["success"] != true || body["count"] != 0 {
        return Err(format!("unexpected listing envelope: {body}").into());
    }
    handle.shutdown().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn manager_can_create_and_fetch_a_book() -> Result<(), Box<dyn std::error::Error>> {
    let (handle, client) = spawn_ready_server().await?;
    let login = json!({"username": "manager", "password": "manager123"});
    let (status, body) = client.post_json("/auth/login/manager", &login).await?;
    if status != 200 || body["user"]["role"] != "manager" {
        return Err(format!("manager login failed ({status}): {body}").into());
    }
    let payload = book_payload("Kobzar", "978-966-03-4683-1");
    let (status, body) = client.post_json("/catalog", &payload).await?;
    if status != 200 || body["message"] != "Book added" {
        return Err(format!("book creation failed ({status}): {body}").into());
    }
    let id = extract_book_id(&body)?;
    if !id.starts_with("book_") {
        return Err(format!("unexpected book id shape: {id}").into());
    }
    let (status, body) = client.get_json(&format!("/catalog/{id}")).await?;
    if status != 200 || body["book"]["title"] != "Kobzar" {
        return Err(format!("book fetch failed ({status}): {body}").into());
    }
    handle.shutdown().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn client_login_returns_the_seeded_profile() -> Result<(), Box<dyn std::error::Error>> {
    let (handle, client) = spawn_ready_server().await?;
    let login = json!({"email": "anna@example.com"});
    let (status, body) = client.post_json("/auth/login/client", &login).await?;
    if status != 200 {
        return Err(format!("client login failed ({status}): {body}").into());
    }
    if body["user"]["name"] != "Anna Kovalenko" || body["user"]["city"] != "Kyiv" {
        return Err(format!("unexpected seeded profile: {body}").into());
    }
    handle.shutdown().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn catalog_export_carries_download_headers() -> Result<(), Box<dyn std::error::Error>> {
    let (handle, client) = spawn_ready_server().await?;
    let download = client.get_xml("/xml/catalog").await?;
    if download.status != 200 {
        return Err(format!("export failed with status {}", download.status).into());
    }
    if download.content_type != "application/xml" {
        return Err(format!("unexpected content type: {}", download.content_type).into());
    }
    if !download.content_disposition.contains("catalog.xml") {
        return Err(format!("unexpected disposition: {}", download.content_disposition).into());
    }
    if !download.body.contains("<catalog") {
        return Err(format!("unexpected export body: {}", download.body).into());
    }
    handle.shutdown().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn demo_credentials_are_listed() -> Result<(), Box<dyn std::error::Error>> {
    let (handle, client) = spawn_ready_server().await?;
    let (status, body) = client.get_json("/auth/test-users").await?;
    if status != 200 {
        return Err(format!("test-users failed ({status}): {body}").into());
    }
    let users = body["testUsers"].as_array().ok_or("testUsers missing")?;
    if users.len() != 3 {
        return Err(format!("unexpected demo user count: {body}").into());
    }
    if users[0]["password"] != "manager123" {
        return Err(format!("manager entry missing its password: {body}").into());
    }
    handle.shutdown().await;
    Ok(())
}
