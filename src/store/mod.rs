//! Entitlement store abstraction.
//!
//! The authorization engine consumes durable state purely through the
//! [`EntitlementStore`] trait: license keys, session rows, and the file
//! registry. The store handle is constructed once at startup and threaded
//! explicitly into the application state; nothing in the engine reaches for
//! an ambient connection.
//!
//! Two implementations exist: [`postgres::PgStore`] backs the running
//! service, and an in-memory store backs the engine and router tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{file_entry::FileEntry, license_key::LicenseKey, session::Session};

#[cfg(test)]
pub mod memory;
pub mod postgres;

/// Store-level failures.
///
/// Both variants are infrastructure errors: the whole request is safe to
/// retry because no partial mutation is ever left visible — every
/// multi-step sequence runs inside a single store transaction.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store rejected or failed the operation.
    #[error("Store unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),

    /// The operation exceeded the configured store timeout.
    #[error("Store operation timed out")]
    Timeout,
}

/// Outcome of an atomic redemption attempt.
#[derive(Debug, Clone)]
pub enum RedeemOutcome {
    /// Key consumed; the account's session row now carries this expiry.
    Redeemed(Session),

    /// No such key exists.
    UnknownKey,

    /// The key was consumed by an earlier redemption.
    AlreadyUsed,
}

/// Durable state operations consumed by the engine and the admin surface.
#[async_trait]
pub trait EntitlementStore: Send + Sync {
    /// Connectivity probe for health reporting.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Insert a freshly generated license key.
    async fn insert_key(&self, key: &LicenseKey) -> Result<(), StoreError>;

    /// All license keys, newest first.
    async fn list_keys(&self) -> Result<Vec<LicenseKey>, StoreError>;

    /// Atomically consume `key` for `account_id`.
    ///
    /// On success the key is flipped `unused -> used` (stamped with `now`
    /// and the redeeming account) and the account's session row is upserted
    /// to `now + duration` — both inside one transaction serialized on the
    /// key row, so concurrent redemptions of the same key cannot both
    /// observe it unused.
    async fn redeem_key(
        &self,
        key: &str,
        account_id: &str,
        now: DateTime<Utc>,
    ) -> Result<RedeemOutcome, StoreError>;

    /// The session row for an account, expired or not.
    async fn session(&self, account_id: &str) -> Result<Option<Session>, StoreError>;

    /// Delete a session row; reports whether one existed.
    async fn delete_session(&self, account_id: &str) -> Result<bool, StoreError>;

    /// Look up a file registry entry by resource name.
    async fn file_entry(&self, name: &str) -> Result<Option<FileEntry>, StoreError>;

    /// Register or replace a file registry entry.
    async fn upsert_file_entry(&self, name: &str, locator: &str) -> Result<FileEntry, StoreError>;

    /// All file registry entries, by name.
    async fn list_file_entries(&self) -> Result<Vec<FileEntry>, StoreError>;

    /// Delete a file registry entry; reports whether one existed.
    async fn delete_file_entry(&self, name: &str) -> Result<bool, StoreError>;
}
