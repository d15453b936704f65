// crates/bindery-api/src/routes/auth.rs
// ============================================================================
// Module: Auth Routes
// Description: Demo login surface for managers and store clients.
// Purpose: Check credentials against the SQLite store and hand out profiles.
// Dependencies: bindery-store-sqlite, axum
// ============================================================================

//! ## Overview
//! Two login flavors share this router. Managers authenticate with a username
//! and password against the seeded `users` table; clients identify themselves
//! by email only and get a session row created or refreshed. The test-users
//! endpoint lists the seeded demo credentials so a fresh install is usable
//! without any manual setup.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::routing::get;
use axum::routing::post;
use bindery_store_sqlite::SEED_CLIENTS;
use bindery_store_sqlite::SEED_MANAGER_PASSWORD;
use bindery_store_sqlite::SEED_MANAGER_USERNAME;
use serde::Deserialize;
use serde::Serialize;

use crate::error::ApiError;
use crate::routes::present;
use crate::server::ServerState;
use crate::server::run_blocking;

// ============================================================================
// SECTION: Router
// ============================================================================

/// Builds the auth router.
pub(crate) fn router() -> Router<Arc<ServerState>> {
    Router::new()
        .route("/login/manager", post(login_manager))
        .route("/login/client", post(login_client))
        .route("/test-users", get(test_users))
}

// ============================================================================
// SECTION: Wire Types
// ============================================================================

/// Manager login request body.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ManagerLogin {
    /// Login name.
    #[serde(default)]
    username: Option<String>,
    /// Plaintext password; compared as a digest, never stored.
    #[serde(default)]
    password: Option<String>,
}

/// Client login request body.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ClientLogin {
    /// Customer email, the session key.
    #[serde(default)]
    email: Option<String>,
}

/// Manager profile returned on a successful login.
#[derive(Debug, Serialize)]
pub(crate) struct ManagerProfile {
    /// Login name.
    pub(crate) username: String,
    /// Account role.
    pub(crate) role: String,
}

/// Client profile returned on a successful login.
#[derive(Debug, Serialize)]
pub(crate) struct ClientProfile {
    /// Customer email.
    pub(crate) email: String,
    /// Customer name; empty until a first order fills it in.
    pub(crate) name: String,
    /// Contact phone.
    pub(crate) phone: String,
    /// Delivery city.
    pub(crate) city: String,
    /// Delivery address.
    pub(crate) address: String,
    /// Always `client`.
    pub(crate) role: &'static str,
}

/// Manager login response.
#[derive(Debug, Serialize)]
pub(crate) struct ManagerLoginResponse {
    /// Always `true`.
    pub(crate) success: bool,
    /// Authenticated profile.
    pub(crate) user: ManagerProfile,
    /// Login outcome.
    pub(crate) message: &'static str,
}

/// Client login response.
#[derive(Debug, Serialize)]
pub(crate) struct ClientLoginResponse {
    /// Always `true`.
    pub(crate) success: bool,
    /// Session profile, possibly freshly created.
    pub(crate) user: ClientProfile,
    /// Login outcome.
    pub(crate) message: &'static str,
}

/// One seeded demo credential.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(crate) enum TestUser {
    /// The seeded manager account, password included.
    Manager {
        /// Account role.
        role: &'static str,
        /// Login name.
        username: &'static str,
        /// Demo password, printable because the whole listing is demo data.
        password: &'static str,
    },
    /// One seeded demo client.
    Client {
        /// Account role.
        role: &'static str,
        /// Customer email.
        email: &'static str,
        /// Customer name.
        name: &'static str,
    },
}

/// Test-users listing response.
#[derive(Debug, Serialize)]
pub(crate) struct TestUsersResponse {
    /// Always `true`.
    pub(crate) success: bool,
    /// Seeded demo credentials.
    #[serde(rename = "testUsers")]
    pub(crate) test_users: Vec<TestUser>,
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// `POST /login/manager`: checks a username/password pair.
pub(crate) async fn login_manager(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<ManagerLogin>,
) -> Result<Json<ManagerLoginResponse>, ApiError> {
    let (Some(username), Some(password)) = (
        present(payload.username.as_deref()),
        present(payload.password.as_deref()),
    ) else {
        return Err(ApiError::BadRequest(
            "Username and password are required".to_string(),
        ));
    };
    let user = run_blocking(|| state.store.authenticate(username, password))?
        .ok_or_else(|| ApiError::Unauthorized("Invalid username or password".to_string()))?;
    Ok(Json(ManagerLoginResponse {
        success: true,
        user: ManagerProfile {
            username: user.username,
            role: user.role,
        },
        message: "Login successful",
    }))
}

/// `POST /login/client`: creates or refreshes a session keyed by email.
pub(crate) async fn login_client(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<ClientLogin>,
) -> Result<Json<ClientLoginResponse>, ApiError> {
    let Some(email) = present(payload.email.as_deref()) else {
        return Err(ApiError::BadRequest("Email is required".to_string()));
    };
    if !email_format_ok(email) {
        return Err(ApiError::BadRequest("Invalid email format".to_string()));
    }
    let session = run_blocking(|| state.store.get_or_create_session(email))?;
    Ok(Json(ClientLoginResponse {
        success: true,
        user: ClientProfile {
            email: session.email,
            name: session.name,
            phone: session.phone,
            city: session.city,
            address: session.address,
            role: "client",
        },
        message: "Login successful",
    }))
}

/// `GET /test-users`: the seeded demo credentials.
pub(crate) async fn test_users() -> Json<TestUsersResponse> {
    let mut users = vec![TestUser::Manager {
        role: "manager",
        username: SEED_MANAGER_USERNAME,
        password: SEED_MANAGER_PASSWORD,
    }];
    users.extend(
        SEED_CLIENTS
            .iter()
            .map(|&(email, name, _, _, _)| TestUser::Client {
                role: "client",
                email,
                name,
            }),
    );
    Json(TestUsersResponse {
        success: true,
        test_users: users,
    })
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Light shape check: one `@`, non-empty sides, dotted domain.
fn email_format_ok(email: &str) -> bool {
    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    !local.is_empty() && !domain.is_empty() && domain.contains('.')
}
