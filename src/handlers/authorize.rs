//! Authorization HTTP handler.
//!
//! This is the entry point of the entitlement lifecycle: clients present
//! an identity token (plus optionally a license key and a resource
//! selector) and receive either a denial or a session credential.

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{app::AppState, error::AppError, services::authorization};

/// Request body for `POST /api/authorize`.
///
/// ```json
/// {
///   "identity_token": "<provider bearer credential>",
///   "token_type": "id_token",
///   "license_key": "0123456789abcdef0123456789abcdef",
///   "resource": "analyzer-module"
/// }
/// ```
///
/// Only `identity_token` is required. Without a `license_key` the request
/// can still be granted through an active session; without a `resource` no
/// locator is resolved.
#[derive(Debug, Deserialize)]
pub struct AuthorizeRequest {
    /// Opaque bearer credential for the identity provider
    pub identity_token: Option<String>,

    /// Kind of identity credential (defaults to `id_token`)
    #[serde(default = "default_token_type")]
    pub token_type: String,

    /// Single-use license key to redeem if no session is active
    pub license_key: Option<String>,

    /// Name of the registered resource the client wants to fetch
    pub resource: Option<String>,
}

fn default_token_type() -> String {
    "id_token".to_string()
}

/// Response body for a successful authorization.
///
/// ```json
/// {
///   "authorized": true,
///   "account_id": "user@example.com",
///   "hours_remaining": 24.0,
///   "expires_at": "2026-08-07T10:15:30Z",
///   "resource_url": "https://downloads.example.com/analyzer.so",
///   "session_token": "user@example.com:2026-08-07T10:15:30.000000Z:9f86d081884c7d65"
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct AuthorizeResponse {
    /// Always `true` on this path; denials use the error envelope
    pub authorized: bool,

    /// Verified account identifier
    pub account_id: String,

    /// Fractional hours left in the entitlement window
    pub hours_remaining: f64,

    /// End of the entitlement window
    pub expires_at: DateTime<Utc>,

    /// Retrieval locator, present when a resource was requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_url: Option<String>,

    /// Self-contained credential for offline verification
    pub session_token: String,
}

/// Authorize handler.
///
/// # Endpoint
///
/// `POST /api/authorize`
///
/// # Responses
///
/// - **200 OK**: authorized, with a fresh session credential
/// - **400**: missing identity credential
/// - **401** `key_required`: no active session and no key supplied
/// - **403** `identity_verification_failed` / `invalid_key` /
///   `key_already_used`
/// - **404** `resource_not_found`
/// - **500/503**: store failure; no partial mutation occurred
pub async fn authorize(
    State(state): State<AppState>,
    Json(request): Json<AuthorizeRequest>,
) -> Result<Json<AuthorizeResponse>, AppError> {
    let identity_token = request
        .identity_token
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::InvalidRequest("identity_token is required".to_string()))?;

    let grant = authorization::authorize(
        &state,
        identity_token,
        &request.token_type,
        request.license_key.as_deref(),
        request.resource.as_deref(),
    )
    .await?;

    Ok(Json(AuthorizeResponse {
        authorized: true,
        account_id: grant.account_id,
        hours_remaining: grant.hours_remaining,
        expires_at: grant.expires_at,
        resource_url: grant.resource_url,
        session_token: grant.session_token,
    }))
}
