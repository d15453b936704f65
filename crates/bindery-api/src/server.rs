// crates/bindery-api/src/server.rs
// ============================================================================
// Module: API Server
// Description: Router assembly, shared state, and the serve loop.
// Purpose: Bind the configured address and expose the four routers.
// Dependencies: axum, tokio, bindery-config, bindery-xml, bindery-store-sqlite
// ============================================================================

//! ## Overview
//! [`ApiServer`] owns the shared state and the axum router. Construction
//! opens both XML document stores and the SQLite side store, builds the
//! configured mirror sink, and fans document audit events out to the change
//! log plus the mirror. The serve loop binds a TCP listener, announces the
//! bound address through the mirror, and serves with connect info wired so
//! failed requests are logged with their peer address.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::extract::ConnectInfo;
use axum::extract::Request;
use axum::extract::State;
use axum::middleware::Next;
use axum::middleware::from_fn_with_state;
use axum::response::Response;
use bindery_config::Config;
use bindery_core::AuditSink;
use bindery_store_sqlite::SqliteStore;
use bindery_xml::CatalogStore;
use bindery_xml::OrdersStore;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::audit::FanoutAuditSink;
use crate::audit::MirrorAuditSink;
use crate::audit::ServerEvent;
use crate::audit::build_mirror;
use crate::error::ApiError;
use crate::routes;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Server construction and transport failures.
#[derive(Debug, Error)]
pub enum ApiServerError {
    /// A store or sink could not be opened.
    #[error("api init error: {0}")]
    Init(String),
    /// Binding or serving the listener failed.
    #[error("api transport error: {0}")]
    Transport(String),
}

// ============================================================================
// SECTION: State
// ============================================================================

/// Shared state behind every handler.
pub struct ServerState {
    /// Catalog document store.
    pub catalog: CatalogStore,
    /// Orders document store.
    pub orders: OrdersStore,
    /// SQLite side store for users, sessions, and the change log.
    pub store: Arc<SqliteStore>,
    /// Document audit fanout: change log always, mirror alongside.
    pub audit: Arc<dyn AuditSink>,
    /// Operational mirror for server lifecycle events.
    pub mirror: Arc<dyn MirrorAuditSink>,
    /// Directory holding exported XSLT stylesheets.
    pub xslt_dir: PathBuf,
}

/// Runs blocking file or database work without starving the async runtime.
///
/// Falls through to a direct call on current-thread runtimes, where
/// `block_in_place` is unavailable.
pub(crate) fn run_blocking<T>(task: impl FnOnce() -> T) -> T {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == tokio::runtime::RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(task)
        }
        _ => task(),
    }
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// The bookstore HTTP server.
pub struct ApiServer {
    /// Shared handler state.
    state: Arc<ServerState>,
}

impl ApiServer {
    /// Opens every store named by the configuration and assembles the state.
    ///
    /// # Errors
    ///
    /// Returns [`ApiServerError::Init`] when a store or sink cannot be
    /// opened.
    pub fn from_config(config: &Config) -> Result<Self, ApiServerError> {
        let data_dir = config.data_dir();
        let catalog = CatalogStore::open(&data_dir)
            .map_err(|err| ApiServerError::Init(format!("catalog store: {err}")))?;
        let orders = OrdersStore::open(&data_dir)
            .map_err(|err| ApiServerError::Init(format!("orders store: {err}")))?;
        let store = Arc::new(
            SqliteStore::open(&config.database_path())
                .map_err(|err| ApiServerError::Init(format!("sqlite store: {err}")))?,
        );
        let mirror = build_mirror(&config.audit)?;
        let audit: Arc<dyn AuditSink> =
            Arc::new(FanoutAuditSink::new(Arc::clone(&store), Arc::clone(&mirror)));
        Ok(Self {
            state: Arc::new(ServerState {
                catalog,
                orders,
                store,
                audit,
                mirror,
                xslt_dir: config.xslt_dir(),
            }),
        })
    }

    /// Returns a handle to the shared state.
    #[must_use]
    pub fn state(&self) -> Arc<ServerState> {
        Arc::clone(&self.state)
    }

    /// Builds the full application router.
    #[must_use]
    pub fn router(&self) -> Router {
        build_router(Arc::clone(&self.state))
    }

    /// Binds the address and serves until the task is cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`ApiServerError::Transport`] when binding or serving fails.
    pub async fn serve(self, addr: SocketAddr) -> Result<(), ApiServerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|err| ApiServerError::Transport(format!("bind {addr}: {err}")))?;
        self.serve_on(listener).await
    }

    /// Serves on an already-bound listener.
    ///
    /// Announces the bound address through the mirror sink before accepting.
    ///
    /// # Errors
    ///
    /// Returns [`ApiServerError::Transport`] when the listener address cannot
    /// be read or the accept loop fails.
    pub async fn serve_on(self, listener: TcpListener) -> Result<(), ApiServerError> {
        let addr = listener
            .local_addr()
            .map_err(|err| ApiServerError::Transport(format!("local addr: {err}")))?;
        self.state.mirror.record_server(&ServerEvent::started(addr));
        let app = self.router();
        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .await
            .map_err(|err| ApiServerError::Transport(err.to_string()))
    }
}

// ============================================================================
// SECTION: Router Assembly
// ============================================================================

/// Mounts the four routers, the failure-logging layer, and the fallback.
fn build_router(state: Arc<ServerState>) -> Router {
    Router::new()
        .nest("/api/catalog", routes::catalog::router())
        .nest("/api/orders", routes::orders::router())
        .nest("/api/xml", routes::xml::router())
        .nest("/api/auth", routes::auth::router())
        .fallback(fallback)
        .layer(from_fn_with_state(Arc::clone(&state), record_failures))
        .with_state(state)
}

/// Unmatched routes answer with the shared error envelope.
async fn fallback() -> ApiError {
    ApiError::NotFound("Not found".to_string())
}

/// Mirrors every error response as a `request_failed` event.
async fn record_failures(
    State(state): State<Arc<ServerState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let response = next.run(request).await;
    let status = response.status();
    if status.is_client_error() || status.is_server_error() {
        state
            .mirror
            .record_server(&ServerEvent::request_failed(&method, &path, peer, status.as_u16()));
    }
    response
}

// ============================================================================
// SECTION: Tests
// ============================================================================
