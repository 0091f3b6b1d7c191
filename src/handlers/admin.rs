//! Administrative HTTP handlers for license keys and sessions.
//!
//! All routes in this module sit behind the admin bearer-token middleware.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use crate::{
    app::AppState,
    error::AppError,
    models::license_key::{CreateKeyRequest, LicenseKey, RevokeSessionRequest},
    services::authorization,
};

/// Response body for session revocation.
#[derive(Debug, Serialize)]
pub struct RevokeSessionResponse {
    /// Whether a session row existed and was deleted
    pub revoked: bool,
}

/// Generate a new license key.
///
/// # Endpoint
///
/// `POST /api/admin/keys`
///
/// # Request Body
///
/// ```json
/// {
///   "duration_hours": 24
/// }
/// ```
///
/// # Responses
///
/// - **201 Created**: the generated key record; the key text is shown here
///   and handed to the customer out of band
/// - **400**: missing or non-positive duration
/// - **401**: invalid admin token
pub async fn create_key(
    State(state): State<AppState>,
    Json(request): Json<CreateKeyRequest>,
) -> Result<impl IntoResponse, AppError> {
    let duration_hours = request
        .duration_hours
        .ok_or_else(|| AppError::InvalidRequest("duration_hours is required".to_string()))?;

    let key = authorization::create_license_key(&state, duration_hours).await?;

    Ok((StatusCode::CREATED, Json(key)))
}

/// List all license keys, newest first.
///
/// # Endpoint
///
/// `GET /api/admin/keys`
///
/// # Responses
///
/// - **200 OK**: array of key records, including consumption state
/// - **401**: invalid admin token
pub async fn list_keys(State(state): State<AppState>) -> Result<Json<Vec<LicenseKey>>, AppError> {
    let keys = state.store.list_keys().await?;

    Ok(Json(keys))
}

/// Revoke an account's session.
///
/// # Endpoint
///
/// `POST /api/admin/revoke`
///
/// # Request Body
///
/// ```json
/// {
///   "account_id": "user@example.com"
/// }
/// ```
///
/// # Responses
///
/// - **200 OK**: `{"revoked": true}` if a row existed, `{"revoked": false}`
///   otherwise (idempotent)
/// - **400**: missing account id
/// - **401**: invalid admin token
///
/// Already-issued session credentials stay valid until their embedded
/// expiry; revocation only closes the renewal path.
pub async fn revoke_session(
    State(state): State<AppState>,
    Json(request): Json<RevokeSessionRequest>,
) -> Result<Json<RevokeSessionResponse>, AppError> {
    let account_id = request
        .account_id
        .as_deref()
        .filter(|a| !a.is_empty())
        .ok_or_else(|| AppError::InvalidRequest("account_id is required".to_string()))?;

    let revoked = authorization::revoke_session(&state, account_id).await?;

    Ok(Json(RevokeSessionResponse { revoked }))
}
