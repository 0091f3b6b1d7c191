//! License key model and admin request types.
//!
//! A license key is a single-use activation credential. It is generated by
//! an administrator with a fixed granted duration, handed to a customer out
//! of band, and consumed exactly once to establish a session.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Status of a key that has never been redeemed.
pub const STATUS_UNUSED: &str = "unused";

/// Status of a key consumed by a successful redemption.
pub const STATUS_USED: &str = "used";

/// Represents a license key record from the store.
///
/// # Table
///
/// Maps to the `license_keys` table. The key text itself is the primary
/// key; keys are high-entropy server-generated identifiers, so there is
/// nothing else to look them up by.
///
/// # Lifecycle
///
/// Created `unused` by an administrative action, flipped to `used` at most
/// once by a successful redemption, never deleted in normal operation.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct LicenseKey {
    /// The opaque key identifier (16 random bytes, hex encoded)
    pub key: String,

    /// Consumption state, either [`STATUS_UNUSED`] or [`STATUS_USED`]
    pub status: String,

    /// Entitlement duration granted on redemption, in hours (positive)
    pub duration_hours: i32,

    /// Timestamp when the key was generated
    pub created_at: DateTime<Utc>,

    /// Timestamp of the redemption that consumed this key, if any
    pub used_at: Option<DateTime<Utc>>,

    /// Account that redeemed this key, if any
    pub used_by: Option<String>,
}

impl LicenseKey {
    /// Whether this key has already been consumed.
    pub fn is_used(&self) -> bool {
        self.status == STATUS_USED
    }

    /// The granted duration as a [`Duration`].
    pub fn duration(&self) -> Duration {
        Duration::hours(i64::from(self.duration_hours))
    }
}

/// Request body for the admin key-creation endpoint.
///
/// ```json
/// {
///   "duration_hours": 24
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct CreateKeyRequest {
    /// Entitlement duration the new key will grant, in hours
    pub duration_hours: Option<i32>,
}

/// Request body for the admin session-revocation endpoint.
///
/// ```json
/// {
///   "account_id": "user@example.com"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct RevokeSessionRequest {
    /// Account whose session row should be deleted
    pub account_id: Option<String>,
}
