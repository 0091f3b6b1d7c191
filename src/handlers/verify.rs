//! Session credential verification HTTP handler.
//!
//! Disconnected verifying parties (the distributed modules themselves)
//! call this to check a credential. The check is stateless: only the
//! credential codec is consulted, never the entitlement store, so the same
//! logic works for any holder of the shared secret without connectivity to
//! this server.

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{app::AppState, error::AppError};

/// Request body for `POST /api/verify_session`.
///
/// ```json
/// {
///   "session_token": "user@example.com:2026-08-07T10:15:30.000000Z:9f86d081884c7d65"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    /// Credential to check
    pub session_token: Option<String>,
}

/// Response body for a valid credential.
///
/// ```json
/// {
///   "valid": true,
///   "account_id": "user@example.com",
///   "expires_at": "2026-08-07T10:15:30Z"
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    /// Always `true` on this path; failures use the error envelope
    pub valid: bool,

    /// Authenticated account identifier
    pub account_id: String,

    /// Embedded expiry timestamp
    pub expires_at: DateTime<Utc>,
}

/// Verify-session handler.
///
/// # Endpoint
///
/// `POST /api/verify_session`
///
/// # Responses
///
/// - **200 OK**: credential is genuine and unexpired
/// - **400**: missing token
/// - **403** with kind `malformed_token` / `malformed_timestamp` /
///   `expired` / `bad_signature`
///
/// Revoking a session does not invalidate credentials issued before the
/// revocation; they remain accepted here until their embedded expiry.
pub async fn verify_session(
    State(state): State<AppState>,
    Json(request): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, AppError> {
    let token = request
        .session_token
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::InvalidRequest("session_token is required".to_string()))?;

    let verified = state.signer.verify(token)?;

    Ok(Json(VerifyResponse {
        valid: true,
        account_id: verified.account_id,
        expires_at: verified.expires_at,
    }))
}
