//! Authorization engine - core entitlement lifecycle logic.
//!
//! This service decides, for a given identity plus optional license key and
//! resource selector, whether access is granted, and mints the offline
//! session credential when it is. It also backs the read-only status query
//! and the admin key/session operations.
//!
//! # State Machine
//!
//! 1. Resolve the identity credential to a verified account
//! 2. Resolve the requested resource, if any
//! 3. Grant through a live session, or reclaim an expired one
//! 4. Otherwise require and atomically redeem a license key
//!
//! # Atomicity Guarantees
//!
//! The key flip and session upsert of a redemption execute as one store
//! transaction serialized on the key row; two concurrent redemptions of
//! the same key yield exactly one success. No credential is ever issued
//! for a mutation that did not commit.

use chrono::{DateTime, Duration, Utc};

use crate::{
    app::AppState,
    error::AppError,
    models::license_key::{LicenseKey, STATUS_UNUSED},
    store::RedeemOutcome,
};

/// A successful authorization: the account's current entitlement window
/// plus a freshly minted offline credential.
#[derive(Debug, Clone)]
pub struct AuthorizationGrant {
    /// Verified account identifier
    pub account_id: String,

    /// End of the entitlement window
    pub expires_at: DateTime<Utc>,

    /// Fractional hours left in the window
    pub hours_remaining: f64,

    /// Retrieval locator for the requested resource, when one was selected
    pub resource_url: Option<String>,

    /// Self-contained credential for offline verification
    pub session_token: String,
}

/// Current entitlement state, read without side effects.
#[derive(Debug, Clone)]
pub struct EntitlementReport {
    /// Verified account identifier
    pub account_id: String,

    /// Whether a live entitlement window exists
    pub entitled: bool,

    /// End of the window, when entitled
    pub expires_at: Option<DateTime<Utc>>,

    /// Fractional hours left, when entitled
    pub hours_remaining: Option<f64>,
}

/// Authorize a request and issue a session credential.
///
/// # Process
///
/// 1. Establish the account identity via the external provider
/// 2. Resolve the requested resource against the file registry
/// 3. Grant through a still-active session, issuing a credential for the
///    remaining validity; no store mutation on this path
/// 4. Delete an expired session row (lazy reclamation) and fall through
/// 5. Without a key, fail with `KeyRequired`
/// 6. Atomically redeem the key and grant for its full duration
///
/// # Errors
///
/// - `IdentityVerificationFailed` / `IdentityProviderUnavailable`
/// - `ResourceNotFound`: a specific resource was requested and is not
///   registered — checked before redemption so a bad selector never
///   consumes a key
/// - `KeyRequired`, `InvalidKey`, `KeyAlreadyUsed`
/// - `Store`: infrastructure failure; no partial mutation remains
pub async fn authorize(
    state: &AppState,
    identity_credential: &str,
    token_type: &str,
    license_key: Option<&str>,
    resource: Option<&str>,
) -> Result<AuthorizationGrant, AppError> {
    // Step 1: establish the account identity
    let account_id = state
        .identity
        .verify_identity(identity_credential, token_type)
        .await?;

    // Step 2: resolve the requested resource before any mutation
    let resource_url = match resource {
        Some(name) => Some(
            state
                .store
                .file_entry(name)
                .await?
                .ok_or(AppError::ResourceNotFound)?
                .locator,
        ),
        None => None,
    };

    let now = Utc::now();

    // Step 3: active-session check
    if let Some(session) = state.store.session(&account_id).await? {
        if session.is_active(now) {
            let remaining = session.remaining(now);
            let session_token = state.signer.issue(&account_id, remaining)?;

            return Ok(AuthorizationGrant {
                account_id,
                expires_at: session.expires_at,
                hours_remaining: fractional_hours(remaining),
                resource_url,
                session_token,
            });
        }

        // Expired: reclaim the stale row, then proceed as if absent
        state.store.delete_session(&account_id).await?;
        tracing::info!(account = %account_id, "Reclaimed expired session");
    }

    // Step 4: a license key is required from here on; blank counts as absent
    let key = license_key
        .filter(|k| !k.is_empty())
        .ok_or(AppError::KeyRequired)?;

    // Step 5: atomic redemption - key flip and session upsert land together
    match state.store.redeem_key(key, &account_id, now).await? {
        RedeemOutcome::UnknownKey => Err(AppError::InvalidKey),
        RedeemOutcome::AlreadyUsed => Err(AppError::KeyAlreadyUsed),
        RedeemOutcome::Redeemed(session) => {
            tracing::info!(account = %account_id, "License key redeemed");

            let remaining = session.remaining(now);
            let session_token = state.signer.issue(&account_id, remaining)?;

            Ok(AuthorizationGrant {
                account_id,
                expires_at: session.expires_at,
                hours_remaining: fractional_hours(remaining),
                resource_url,
                session_token,
            })
        }
    }
}

/// Report the account's current entitlement without consuming anything.
///
/// Mirrors the active-session check of [`authorize`] but mutates nothing:
/// an expired session row is reported as no entitlement and left in place
/// for the next Authorize call to reclaim.
pub async fn entitlement_status(
    state: &AppState,
    identity_credential: &str,
    token_type: &str,
) -> Result<EntitlementReport, AppError> {
    let account_id = state
        .identity
        .verify_identity(identity_credential, token_type)
        .await?;

    let now = Utc::now();

    match state.store.session(&account_id).await? {
        Some(session) if session.is_active(now) => Ok(EntitlementReport {
            account_id,
            entitled: true,
            expires_at: Some(session.expires_at),
            hours_remaining: Some(fractional_hours(session.remaining(now))),
        }),
        _ => Ok(EntitlementReport {
            account_id,
            entitled: false,
            expires_at: None,
            hours_remaining: None,
        }),
    }
}

/// Generate and store a fresh license key.
///
/// # Errors
///
/// Returns `InvalidRequest` unless `duration_hours` is positive.
pub async fn create_license_key(
    state: &AppState,
    duration_hours: i32,
) -> Result<LicenseKey, AppError> {
    if duration_hours <= 0 {
        return Err(AppError::InvalidRequest(
            "duration_hours must be positive".to_string(),
        ));
    }

    let key = LicenseKey {
        key: generate_key(),
        status: STATUS_UNUSED.to_string(),
        duration_hours,
        created_at: Utc::now(),
        used_at: None,
        used_by: None,
    };

    state.store.insert_key(&key).await?;
    tracing::info!(duration_hours, "License key created");

    Ok(key)
}

/// Delete an account's session row. Idempotent; reports whether a row
/// existed. Already-issued credentials stay valid until their embedded
/// expiry — revocation only closes the renewal path.
pub async fn revoke_session(state: &AppState, account_id: &str) -> Result<bool, AppError> {
    let existed = state.store.delete_session(account_id).await?;

    if existed {
        tracing::info!(account = %account_id, "Session revoked");
    }

    Ok(existed)
}

/// Fresh high-entropy key identifier: 16 random bytes, hex encoded.
fn generate_key() -> String {
    let bytes: [u8; 16] = rand::random();
    hex::encode(bytes)
}

/// Duration as fractional hours, millisecond precision.
fn fractional_hours(duration: Duration) -> f64 {
    duration.num_milliseconds() as f64 / 3_600_000.0
}
