//! PostgreSQL-backed entitlement store.
//!
//! All multi-step mutations run inside database transactions with
//! `SELECT ... FOR UPDATE` row locks, so the database ensures
//! all-or-nothing execution and serializes contended redemptions.
//!
//! Every operation is wrapped in a bounded timeout. A timeout abandons the
//! in-flight future; an abandoned transaction is rolled back when its
//! handle drops, so no partial mutation outlives a timed-out call.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::db::DbPool;
use crate::models::{
    file_entry::FileEntry,
    license_key::{LicenseKey, STATUS_USED},
    session::Session,
};

use super::{EntitlementStore, RedeemOutcome, StoreError};

/// Entitlement store backed by a PostgreSQL connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
    timeout: Duration,
}

impl PgStore {
    pub fn new(pool: DbPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// Run a store operation under the configured timeout.
    async fn bounded<T>(
        &self,
        operation: impl Future<Output = Result<T, StoreError>> + Send,
    ) -> Result<T, StoreError> {
        tokio::time::timeout(self.timeout, operation)
            .await
            .map_err(|_| StoreError::Timeout)?
    }
}

#[async_trait]
impl EntitlementStore for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.bounded(async {
            sqlx::query("SELECT 1").execute(&self.pool).await?;
            Ok(())
        })
        .await
    }

    async fn insert_key(&self, key: &LicenseKey) -> Result<(), StoreError> {
        self.bounded(async {
            sqlx::query(
                r#"
                INSERT INTO license_keys (key, status, duration_hours, created_at)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(&key.key)
            .bind(&key.status)
            .bind(key.duration_hours)
            .bind(key.created_at)
            .execute(&self.pool)
            .await?;

            Ok(())
        })
        .await
    }

    async fn list_keys(&self) -> Result<Vec<LicenseKey>, StoreError> {
        self.bounded(async {
            let keys = sqlx::query_as::<_, LicenseKey>(
                r#"
                SELECT key, status, duration_hours, created_at, used_at, used_by
                FROM license_keys
                ORDER BY created_at DESC
                "#,
            )
            .fetch_all(&self.pool)
            .await?;

            Ok(keys)
        })
        .await
    }

    async fn redeem_key(
        &self,
        key: &str,
        account_id: &str,
        now: DateTime<Utc>,
    ) -> Result<RedeemOutcome, StoreError> {
        self.bounded(async {
            let mut tx = self.pool.begin().await?;

            // FOR UPDATE locks the key row: a concurrent redemption of the
            // same key blocks here until this transaction resolves, then
            // observes the committed status.
            let license = sqlx::query_as::<_, LicenseKey>(
                r#"
                SELECT key, status, duration_hours, created_at, used_at, used_by
                FROM license_keys
                WHERE key = $1
                FOR UPDATE
                "#,
            )
            .bind(key)
            .fetch_optional(&mut *tx)
            .await?;

            let Some(license) = license else {
                tx.rollback().await?;
                return Ok(RedeemOutcome::UnknownKey);
            };

            if license.is_used() {
                tx.rollback().await?;
                return Ok(RedeemOutcome::AlreadyUsed);
            }

            sqlx::query(
                r#"
                UPDATE license_keys
                SET status = $2, used_at = $3, used_by = $4
                WHERE key = $1
                "#,
            )
            .bind(key)
            .bind(STATUS_USED)
            .bind(now)
            .bind(account_id)
            .execute(&mut *tx)
            .await?;

            let expires_at = now + license.duration();

            // Atomic replace: a newer entitlement overwrites the expiry of
            // an older session row for the same account.
            let session = sqlx::query_as::<_, Session>(
                r#"
                INSERT INTO sessions (account_id, expires_at)
                VALUES ($1, $2)
                ON CONFLICT (account_id) DO UPDATE SET expires_at = EXCLUDED.expires_at
                RETURNING account_id, expires_at, created_at
                "#,
            )
            .bind(account_id)
            .bind(expires_at)
            .fetch_one(&mut *tx)
            .await?;

            // Key flip and session upsert land together or not at all.
            tx.commit().await?;

            Ok(RedeemOutcome::Redeemed(session))
        })
        .await
    }

    async fn session(&self, account_id: &str) -> Result<Option<Session>, StoreError> {
        self.bounded(async {
            let session = sqlx::query_as::<_, Session>(
                r#"
                SELECT account_id, expires_at, created_at
                FROM sessions
                WHERE account_id = $1
                "#,
            )
            .bind(account_id)
            .fetch_optional(&self.pool)
            .await?;

            Ok(session)
        })
        .await
    }

    async fn delete_session(&self, account_id: &str) -> Result<bool, StoreError> {
        self.bounded(async {
            let result = sqlx::query("DELETE FROM sessions WHERE account_id = $1")
                .bind(account_id)
                .execute(&self.pool)
                .await?;

            Ok(result.rows_affected() > 0)
        })
        .await
    }

    async fn file_entry(&self, name: &str) -> Result<Option<FileEntry>, StoreError> {
        self.bounded(async {
            let entry = sqlx::query_as::<_, FileEntry>(
                r#"
                SELECT name, locator, updated_at
                FROM file_registry
                WHERE name = $1
                "#,
            )
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

            Ok(entry)
        })
        .await
    }

    async fn upsert_file_entry(&self, name: &str, locator: &str) -> Result<FileEntry, StoreError> {
        self.bounded(async {
            let entry = sqlx::query_as::<_, FileEntry>(
                r#"
                INSERT INTO file_registry (name, locator)
                VALUES ($1, $2)
                ON CONFLICT (name) DO UPDATE SET locator = EXCLUDED.locator, updated_at = NOW()
                RETURNING name, locator, updated_at
                "#,
            )
            .bind(name)
            .bind(locator)
            .fetch_one(&self.pool)
            .await?;

            Ok(entry)
        })
        .await
    }

    async fn list_file_entries(&self) -> Result<Vec<FileEntry>, StoreError> {
        self.bounded(async {
            let entries = sqlx::query_as::<_, FileEntry>(
                r#"
                SELECT name, locator, updated_at
                FROM file_registry
                ORDER BY name
                "#,
            )
            .fetch_all(&self.pool)
            .await?;

            Ok(entries)
        })
        .await
    }

    async fn delete_file_entry(&self, name: &str) -> Result<bool, StoreError> {
        self.bounded(async {
            let result = sqlx::query("DELETE FROM file_registry WHERE name = $1")
                .bind(name)
                .execute(&self.pool)
                .await?;

            Ok(result.rows_affected() > 0)
        })
        .await
    }
}
