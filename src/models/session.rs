//! Session model.
//!
//! A session is the server-side record of an account's current entitlement
//! window. It is distinct from the session credential handed to clients:
//! the credential is self-contained and never persisted, while this row is
//! what Authorize consults and what an administrator can revoke.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Represents a session record from the store.
///
/// # Table
///
/// Maps to the `sessions` table, keyed by account identifier: at most one
/// row per account, with a newer entitlement replacing an older one through
/// an atomic upsert.
///
/// # Expiry
///
/// Rows are not actively expired. A stale row is deleted lazily the next
/// time Authorize encounters it, or explicitly by admin revocation.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Session {
    /// Verified account identifier this entitlement belongs to
    pub account_id: String,

    /// End of the entitlement window
    pub expires_at: DateTime<Utc>,

    /// Timestamp when the account first established a session
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Whether the entitlement window still covers `now`.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }

    /// Time left in the entitlement window (negative once expired).
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        self.expires_at - now
    }
}
