// system-tests/tests/helpers/harness.rs
// ============================================================================
// Module: Bookstore Server Harness
// Description: Helpers for spawning bookstore servers in system-tests.
// Purpose: Provide deterministic server startup and teardown for tests.
// Dependencies: bindery-api, bindery-config, tempfile, tokio
// ============================================================================

use std::path::Path;

use bindery_api::ApiServer;
use bindery_api::ApiServerError;
use bindery_config::AuditConfig;
use bindery_config::AuditSinkKind;
use bindery_config::Config;
use bindery_config::ServerConfig;
use bindery_config::StorageConfig;
use system_tests::config::SystemTestConfig;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use super::client::ApiClient;
use super::readiness::wait_for_server_ready;

/// Handle for a spawned bookstore server.
pub struct ServerHandle {
    base_url: String,
    join: JoinHandle<Result<(), ApiServerError>>,
    workspace: TempDir,
}

impl ServerHandle {
    /// Returns the API base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the server's workspace directory.
    pub fn workspace(&self) -> &Path {
        self.workspace.path()
    }

    /// Builds an HTTP client for the server with the env-resolved timeout.
    pub fn client(&self) -> Result<ApiClient, String> {
        let config = SystemTestConfig::load()?;
        ApiClient::new(self.base_url.clone(), config.request_timeout())
    }

    /// Shuts down the server task.
    pub async fn shutdown(self) {
        self.join.abort();
        let _ = self.join.await;
    }
}

/// Builds a server config rooted in the given workspace directory.
///
/// The audit mirror is off so test output stays quiet.
pub fn server_config(workspace: &Path) -> Config {
    Config {
        server: ServerConfig {
            bind_addr: "127.0.0.1:0".to_string(),
        },
        storage: StorageConfig {
            data_dir: workspace.join("data").display().to_string(),
            xslt_dir: workspace.join("xslt").display().to_string(),
            database_file: "bookstore.db".to_string(),
        },
        audit: AuditConfig {
            sink: AuditSinkKind::Off,
            path: None,
        },
    }
}

/// Spawns a server on an ephemeral loopback port with a fresh workspace.
pub async fn spawn_server() -> Result<ServerHandle, String> {
    let workspace = TempDir::new().map_err(|err| format!("create workspace: {err}"))?;
    let config = server_config(workspace.path());
    let server = tokio::task::spawn_blocking(move || ApiServer::from_config(&config))
        .await
        .map_err(|err| format!("server init join failed: {err}"))?
        .map_err(|err| format!("server init failed: {err}"))?;
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .map_err(|err| format!("bind loopback: {err}"))?;
    let addr = listener
        .local_addr()
        .map_err(|err| format!("read listener address: {err}"))?;
    let join = tokio::spawn(async move { server.serve_on(listener).await });
    Ok(ServerHandle {
        base_url: format!("http://{addr}/api"),
        join,
        workspace,
    })
}

/// Spawns a server and waits until it answers catalog requests.
pub async fn spawn_ready_server() -> Result<(ServerHandle, ApiClient), String> {
    let handle = spawn_server().await?;
    let client = handle.client()?;
    let ready = SystemTestConfig::load()?.ready_timeout();
    wait_for_server_ready(&client, ready).await?;
    Ok((handle, client))
}
