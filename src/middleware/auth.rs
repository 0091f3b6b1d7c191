//! Admin bearer-token authentication middleware.
//!
//! This middleware intercepts every admin request to:
//! 1. Extract the bearer token from the Authorization header
//! 2. Compare its SHA-256 digest against the configured admin token digest
//! 3. Reject unauthorized requests with HTTP 401

use crate::{app::AppState, error::AppError};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use sha2::{Digest, Sha256};

/// Admin authentication middleware function.
///
/// # Flow
///
/// 1. Extract `Authorization: Bearer <token>` header from request
/// 2. Hash the `<token>` using SHA-256
/// 3. Compare against the digest of the configured `ADMIN_TOKEN`
/// 4. If equal: call next handler
/// 5. Otherwise: return 401 Unauthorized error
///
/// Comparing fixed-length digests rather than the raw strings keeps the
/// comparison independent of where a mismatching byte sits.
///
/// # Headers
///
/// Expected header format:
/// ```text
/// Authorization: Bearer <admin token>
/// ```
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Step 1: Extract Authorization header
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::InvalidAdminToken)?;

    // Step 2: Extract Bearer token
    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AppError::InvalidAdminToken)?;

    // Step 3: Compare SHA-256 digests
    let presented: [u8; 32] = Sha256::digest(token.as_bytes()).into();
    if presented != state.admin_token_digest {
        return Err(AppError::InvalidAdminToken);
    }

    // Step 4: Call the next middleware/handler
    Ok(next.run(request).await)
}
