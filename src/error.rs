//! Error types and HTTP error response handling.
//!
//! This module defines the application-wide error taxonomy and how each
//! kind is converted into an HTTP response with an appropriate status code
//! and JSON body. Every failure is terminal for its request and returned
//! synchronously; nothing here retries — retry policy belongs to callers.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::identity::IdentityError;
use crate::store::StoreError;
use crate::token::TokenError;

/// Application-wide error type.
///
/// # Error Categories
///
/// - **Identity errors**: the external provider rejected the credential, or
///   could not be reached
/// - **Entitlement-state errors**: key missing, unknown, or already
///   consumed — user-correctable
/// - **Credential errors**: a presented session credential failed
///   verification — the caller must re-authorize
/// - **Data errors**: requested resource not registered
/// - **Infrastructure errors**: store unavailable or timed out — the whole
///   request is safe to retry, no partial mutation is left visible
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Request body or parameters are invalid or incomplete.
    ///
    /// Returns HTTP 400 Bad Request.
    #[error("Invalid request")]
    InvalidRequest(String),

    /// The identity provider did not attest a verified account for the
    /// presented credential.
    ///
    /// Returns HTTP 403 Forbidden.
    #[error("Identity verification failed: {0}")]
    IdentityVerificationFailed(String),

    /// The identity provider could not be reached.
    ///
    /// Returns HTTP 503 Service Unavailable.
    #[error("Identity provider unavailable")]
    IdentityProviderUnavailable,

    /// No active session and no license key supplied.
    ///
    /// Returns HTTP 401 Unauthorized, distinguishable so a caller knows to
    /// prompt for a key rather than treat this as a hard denial.
    #[error("License key required")]
    KeyRequired,

    /// Supplied license key does not exist.
    ///
    /// Returns HTTP 403 Forbidden.
    #[error("Invalid license key")]
    InvalidKey,

    /// Supplied license key was already consumed.
    ///
    /// Returns HTTP 403 Forbidden.
    #[error("License key already used")]
    KeyAlreadyUsed,

    /// Requested resource is not in the file registry.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("Resource not found")]
    ResourceNotFound,

    /// Admin token is missing or wrong.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("Invalid admin token")]
    InvalidAdminToken,

    /// A session credential failed to issue or verify.
    ///
    /// Returns HTTP 403 Forbidden (400 for issuance-side rejection of an
    /// unencodable account identifier), with the error kind as the code.
    #[error(transparent)]
    Credential(#[from] TokenError),

    /// The entitlement store failed or timed out.
    ///
    /// Returns HTTP 500 / 503; details are hidden from the client.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<IdentityError> for AppError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::Rejected(reason) => AppError::IdentityVerificationFailed(reason),
            IdentityError::Provider(source) => {
                tracing::error!("Identity provider request failed: {source}");
                AppError::IdentityProviderUnavailable
            }
        }
    }
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// All errors return JSON in this format:
/// ```json
/// {
///   "error": {
///     "code": "error_kind",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Map each error variant to (HTTP status, machine-readable code, message)
        let (status, code, message) = match self {
            AppError::InvalidRequest(ref msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", msg.clone())
            }
            AppError::IdentityVerificationFailed(_) => (
                StatusCode::FORBIDDEN,
                "identity_verification_failed",
                self.to_string(),
            ),
            AppError::IdentityProviderUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "identity_provider_unavailable",
                self.to_string(),
            ),
            AppError::KeyRequired => (StatusCode::UNAUTHORIZED, "key_required", self.to_string()),
            AppError::InvalidKey => (StatusCode::FORBIDDEN, "invalid_key", self.to_string()),
            AppError::KeyAlreadyUsed => {
                (StatusCode::FORBIDDEN, "key_already_used", self.to_string())
            }
            AppError::ResourceNotFound => {
                (StatusCode::NOT_FOUND, "resource_not_found", self.to_string())
            }
            AppError::InvalidAdminToken => (
                StatusCode::UNAUTHORIZED,
                "invalid_admin_token",
                self.to_string(),
            ),
            AppError::Credential(kind) => {
                let (status, code) = match kind {
                    TokenError::InvalidAccountId => (StatusCode::BAD_REQUEST, "invalid_account_id"),
                    TokenError::MalformedToken => (StatusCode::FORBIDDEN, "malformed_token"),
                    TokenError::MalformedTimestamp => {
                        (StatusCode::FORBIDDEN, "malformed_timestamp")
                    }
                    TokenError::Expired => (StatusCode::FORBIDDEN, "expired"),
                    TokenError::BadSignature => (StatusCode::FORBIDDEN, "bad_signature"),
                };
                (status, code, kind.to_string())
            }
            AppError::Store(StoreError::Unavailable(ref source)) => {
                tracing::error!("Store operation failed: {source}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "store_unavailable",
                    "The entitlement store is unavailable".to_string(),
                )
            }
            AppError::Store(StoreError::Timeout) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "store_timeout",
                "The entitlement store timed out; the request may be retried".to_string(),
            ),
        };

        // Build JSON response body
        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
