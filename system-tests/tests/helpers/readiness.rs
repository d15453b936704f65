// system-tests/tests/helpers/readiness.rs
// ============================================================================
// Module: Readiness Helpers
// Description: Readiness probes for spawned bookstore servers.
// Purpose: Ensure servers are ready without arbitrary sleeps.
// Dependencies: tokio
// ============================================================================

use std::time::Duration;
use std::time::Instant;

use tokio::time::sleep;

use super::client::ApiClient;

/// Polls the catalog listing until the server responds or the timeout expires.
pub async fn wait_for_server_ready(client: &ApiClient, timeout: Duration) -> Result<(), String> {
    let start = Instant::now();
    let mut attempts = 0u32;
    loop {
        attempts = attempts.saturating_add(1);
        match client.get_json("/catalog").await {
            Ok((200, _)) => return Ok(()),
            Ok((status, _)) => {
                if start.elapsed() > timeout {
                    return Err(format!(
                        "server readiness timeout after {attempts} attempts: last status {status}"
                    ));
                }
                sleep(Duration::from_millis(50)).await;
            }
            Err(err) => {
                if start.elapsed() > timeout {
                    return Err(format!(
                        "server readiness timeout after {attempts} attempts: {err}"
                    ));
                }
                sleep(Duration::from_millis(50)).await;
            }
        }
    }
}
