//! Router assembly and shared application state.

use std::sync::Arc;

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, post},
};
use sha2::{Digest, Sha256};
use tower_http::trace::TraceLayer;

use crate::{
    handlers,
    identity::IdentityVerifier,
    middleware,
    store::EntitlementStore,
    token::TokenSigner,
};

/// Shared state handed to every handler via Axum's State extraction.
///
/// The store and identity verifier sit behind trait objects: the engine
/// consumes them as black-box capabilities, and tests substitute in-memory
/// implementations. Everything here is immutable after startup.
#[derive(Clone)]
pub struct AppState {
    /// Durable keys, sessions, and file registry
    pub store: Arc<dyn EntitlementStore>,

    /// External identity provider client
    pub identity: Arc<dyn IdentityVerifier>,

    /// Session credential codec under the process-wide shared secret
    pub signer: TokenSigner,

    /// SHA-256 digest of the configured admin bearer token
    pub admin_token_digest: [u8; 32],
}

impl AppState {
    pub fn new(
        store: Arc<dyn EntitlementStore>,
        identity: Arc<dyn IdentityVerifier>,
        signer: TokenSigner,
        admin_token: &str,
    ) -> Self {
        Self {
            store,
            identity,
            signer,
            admin_token_digest: Sha256::digest(admin_token.as_bytes()).into(),
        }
    }
}

/// Build the HTTP router.
///
/// # Routes
///
/// Public:
/// - `GET /health`
/// - `POST /api/authorize`
/// - `POST /api/verify_session`
/// - `POST /api/status`
///
/// Admin (bearer-token gated):
/// - `POST`/`GET /api/admin/keys`
/// - `POST /api/admin/revoke`
/// - `POST`/`GET /api/admin/files`, `DELETE /api/admin/files/{name}`
pub fn router(state: AppState) -> Router {
    // Admin routes (bearer-token authentication required)
    let admin_routes = Router::new()
        .route("/api/admin/keys", post(handlers::admin::create_key))
        .route("/api/admin/keys", get(handlers::admin::list_keys))
        .route("/api/admin/revoke", post(handlers::admin::revoke_session))
        .route("/api/admin/files", post(handlers::files::register_file))
        .route("/api/admin/files", get(handlers::files::list_files))
        .route("/api/admin/files/{name}", delete(handlers::files::delete_file))
        // Apply admin authentication middleware to all routes in this group
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::admin_auth_middleware,
        ));

    Router::new()
        // Public routes (no authentication beyond the request body itself)
        .route("/health", get(handlers::health::health_check))
        .route("/api/authorize", post(handlers::authorize::authorize))
        .route("/api/verify_session", post(handlers::verify::verify_session))
        .route("/api/status", post(handlers::status::entitlement_status))
        // Merge admin routes
        .merge(admin_routes)
        // Add distributed tracing middleware for observability
        .layer(TraceLayer::new_for_http())
        // Share application state with all handlers via State extraction
        .with_state(state)
}
