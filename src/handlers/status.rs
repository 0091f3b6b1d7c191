//! Entitlement status HTTP handler.

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{app::AppState, error::AppError, services::authorization};

/// Request body for `POST /api/status`.
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    /// Opaque bearer credential for the identity provider
    pub identity_token: Option<String>,

    /// Kind of identity credential (defaults to `id_token`)
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "id_token".to_string()
}

/// Response body for the status query.
///
/// ```json
/// {
///   "entitled": true,
///   "account_id": "user@example.com",
///   "expires_at": "2026-08-07T10:15:30Z",
///   "hours_remaining": 11.52
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Whether a live entitlement window exists
    pub entitled: bool,

    /// Verified account identifier
    pub account_id: String,

    /// End of the window, when entitled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    /// Fractional hours left, when entitled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hours_remaining: Option<f64>,
}

/// Status handler.
///
/// # Endpoint
///
/// `POST /api/status`
///
/// Reports the account's current entitlement without consuming anything:
/// no key redemption, no credential issuance, and no store mutation — an
/// expired session row is reported as no entitlement but left in place.
///
/// # Responses
///
/// - **200 OK**: entitlement report (entitled or not)
/// - **400**: missing identity credential
/// - **403**: identity verification failed
pub async fn entitlement_status(
    State(state): State<AppState>,
    Json(request): Json<StatusRequest>,
) -> Result<Json<StatusResponse>, AppError> {
    let identity_token = request
        .identity_token
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::InvalidRequest("identity_token is required".to_string()))?;

    let report =
        authorization::entitlement_status(&state, identity_token, &request.token_type).await?;

    Ok(Json(StatusResponse {
        entitled: report.entitled,
        account_id: report.account_id,
        expires_at: report.expires_at,
        hours_remaining: report.hours_remaining,
    }))
}
