// system-tests/tests/helpers/client.rs
// ============================================================================
// Module: Bookstore API Client
// Description: JSON and raw-XML HTTP client for the bookstore API.
// Purpose: Issue requests against a spawned server and decode envelopes.
// Dependencies: reqwest, serde_json
// ============================================================================

//! ## Overview
//! Thin wrapper over `reqwest` for the bookstore API: JSON verbs return the
//! status code plus the decoded body, and the raw-XML getter carries the
//! download headers so suites can check export behavior.

use std::time::Duration;

use reqwest::Client;
use reqwest::Response;
use reqwest::header;
use serde_json::Value;

/// Raw XML response with its transport headers.
#[derive(Debug)]
pub struct XmlDownload {
    pub status: u16,
    pub content_type: String,
    pub content_disposition: String,
    pub body: String,
}

/// HTTP client bound to one spawned server's base URL.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    client: Client,
}

impl ApiClient {
    /// Builds a client with the given per-request timeout.
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, String> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| format!("build http client: {err}"))?;
        Ok(Self {
            base_url,
            client,
        })
    }

    /// Issues a GET and decodes the JSON body.
    pub async fn get_json(&self, path: &str) -> Result<(u16, Value), String> {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(|err| format!("GET {path}: {err}"))?;
        Self::into_json(path, response).await
    }

    /// Issues a POST with a JSON body and decodes the JSON response.
    pub async fn post_json(&self, path: &str, body: &Value) -> Result<(u16, Value), String> {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|err| format!("POST {path}: {err}"))?;
        Self::into_json(path, response).await
    }

    /// Issues a PUT with a JSON body and decodes the JSON response.
    pub async fn put_json(&self, path: &str, body: &Value) -> Result<(u16, Value), String> {
        let response = self
            .client
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|err| format!("PUT {path}: {err}"))?;
        Self::into_json(path, response).await
    }

    /// Issues a PATCH with a JSON body and decodes the JSON response.
    pub async fn patch_json(&self, path: &str, body: &Value) -> Result<(u16, Value), String> {
        let response = self
            .client
            .patch(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|err| format!("PATCH {path}: {err}"))?;
        Self::into_json(path, response).await
    }

    /// Issues a DELETE and decodes the JSON response.
    pub async fn delete_json(&self, path: &str) -> Result<(u16, Value), String> {
        let response = self
            .client
            .delete(self.url(path))
            .send()
            .await
            .map_err(|err| format!("DELETE {path}: {err}"))?;
        Self::into_json(path, response).await
    }

    /// Issues a POST without a body and decodes the JSON response.
    pub async fn post_empty(&self, path: &str) -> Result<(u16, Value), String> {
        let response = self
            .client
            .post(self.url(path))
            .send()
            .await
            .map_err(|err| format!("POST {path}: {err}"))?;
        Self::into_json(path, response).await
    }

    /// Issues a POST with a raw XML body and decodes the JSON response.
    pub async fn post_xml(&self, path: &str, body: &str) -> Result<(u16, Value), String> {
        let response = self
            .client
            .post(self.url(path))
            .header(header::CONTENT_TYPE, "application/xml")
            .body(body.to_string())
            .send()
            .await
            .map_err(|err| format!("POST {path}: {err}"))?;
        Self::into_json(path, response).await
    }

    /// Issues a GET and returns the raw body with its download headers.
    pub async fn get_xml(&self, path: &str) -> Result<XmlDownload, String> {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(|err| format!("GET {path}: {err}"))?;
        let status = response.status().as_u16();
        let content_type = header_text(&response, header::CONTENT_TYPE);
        let content_disposition = header_text(&response, header::CONTENT_DISPOSITION);
        let body = response
            .text()
            .await
            .map_err(|err| format!("read {path} body: {err}"))?;
        Ok(XmlDownload {
            status,
            content_type,
            content_disposition,
            body,
        })
    }

    /// Joins the base URL with a path.
    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Decodes a response body as JSON, keeping the status code.
    async fn into_json(path: &str, response: Response) -> Result<(u16, Value), String> {
        let status = response.status().as_u16();
        let body = response
            .json::<Value>()
            .await
            .map_err(|err| format!("decode {path} body: {err}"))?;
        Ok((status, body))
    }
}

/// Reads a response header as text, defaulting to empty.
fn header_text(response: &Response, name: header::HeaderName) -> String {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
