//! In-memory entitlement store used by the engine and router tests.
//!
//! Mirrors the transactional semantics of the Postgres store: every
//! operation runs under a single mutex, so a redemption's key check, key
//! flip, and session upsert are observed as one atomic step.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{
    file_entry::FileEntry,
    license_key::{LicenseKey, STATUS_USED},
    session::Session,
};

use super::{EntitlementStore, RedeemOutcome, StoreError};

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    keys: HashMap<String, LicenseKey>,
    sessions: HashMap<String, Session>,
    files: HashMap<String, FileEntry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a session row directly, bypassing redemption. Lets tests set up
    /// expired sessions, which no engine path can create.
    pub fn put_session(&self, session: Session) {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        inner.sessions.insert(session.account_id.clone(), session);
    }

    /// Fetch a key without going through the trait, for assertions.
    pub fn get_key(&self, key: &str) -> Option<LicenseKey> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        inner.keys.get(key).cloned()
    }
}

#[async_trait]
impl EntitlementStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn insert_key(&self, key: &LicenseKey) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        inner.keys.insert(key.key.clone(), key.clone());
        Ok(())
    }

    async fn list_keys(&self) -> Result<Vec<LicenseKey>, StoreError> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        Ok(inner.keys.values().cloned().collect())
    }

    async fn redeem_key(
        &self,
        key: &str,
        account_id: &str,
        now: DateTime<Utc>,
    ) -> Result<RedeemOutcome, StoreError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");

        let Some(license) = inner.keys.get_mut(key) else {
            return Ok(RedeemOutcome::UnknownKey);
        };

        if license.is_used() {
            return Ok(RedeemOutcome::AlreadyUsed);
        }

        license.status = STATUS_USED.to_string();
        license.used_at = Some(now);
        license.used_by = Some(account_id.to_string());
        let expires_at = now + license.duration();

        // Upsert preserving the original creation time, like the Postgres
        // ON CONFLICT clause.
        let created_at = inner
            .sessions
            .get(account_id)
            .map(|existing| existing.created_at)
            .unwrap_or(now);
        let session = Session {
            account_id: account_id.to_string(),
            expires_at,
            created_at,
        };
        inner.sessions.insert(account_id.to_string(), session.clone());

        Ok(RedeemOutcome::Redeemed(session))
    }

    async fn session(&self, account_id: &str) -> Result<Option<Session>, StoreError> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        Ok(inner.sessions.get(account_id).cloned())
    }

    async fn delete_session(&self, account_id: &str) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        Ok(inner.sessions.remove(account_id).is_some())
    }

    async fn file_entry(&self, name: &str) -> Result<Option<FileEntry>, StoreError> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        Ok(inner.files.get(name).cloned())
    }

    async fn upsert_file_entry(&self, name: &str, locator: &str) -> Result<FileEntry, StoreError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        let entry = FileEntry {
            name: name.to_string(),
            locator: locator.to_string(),
            updated_at: Utc::now(),
        };
        inner.files.insert(name.to_string(), entry.clone());
        Ok(entry)
    }

    async fn list_file_entries(&self) -> Result<Vec<FileEntry>, StoreError> {
        let inner = self.inner.lock().expect("store mutex poisoned");
        let mut entries: Vec<FileEntry> = inner.files.values().cloned().collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn delete_file_entry(&self, name: &str) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().expect("store mutex poisoned");
        Ok(inner.files.remove(name).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::license_key::STATUS_UNUSED;

    fn unused_key(key: &str, duration_hours: i32) -> LicenseKey {
        LicenseKey {
            key: key.to_string(),
            status: STATUS_UNUSED.to_string(),
            duration_hours,
            created_at: Utc::now(),
            used_at: None,
            used_by: None,
        }
    }

    #[tokio::test]
    async fn redeem_flips_key_and_creates_session() {
        let store = MemoryStore::new();
        store.insert_key(&unused_key("k1", 24)).await.unwrap();

        let now = Utc::now();
        let outcome = store.redeem_key("k1", "user@example.com", now).await.unwrap();

        match outcome {
            RedeemOutcome::Redeemed(session) => {
                assert_eq!(session.account_id, "user@example.com");
                assert_eq!(session.expires_at, now + chrono::Duration::hours(24));
            }
            other => panic!("expected redemption, got {other:?}"),
        }

        let key = store.get_key("k1").unwrap();
        assert!(key.is_used());
        assert_eq!(key.used_by.as_deref(), Some("user@example.com"));
    }

    #[tokio::test]
    async fn second_redemption_sees_used_key() {
        let store = MemoryStore::new();
        store.insert_key(&unused_key("k1", 24)).await.unwrap();

        let now = Utc::now();
        store.redeem_key("k1", "first@example.com", now).await.unwrap();
        let outcome = store.redeem_key("k1", "second@example.com", now).await.unwrap();

        assert!(matches!(outcome, RedeemOutcome::AlreadyUsed));
        // The losing redemption must not touch the winner's session.
        assert!(store.session("second@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unknown_key_is_reported() {
        let store = MemoryStore::new();
        let outcome = store
            .redeem_key("missing", "user@example.com", Utc::now())
            .await
            .unwrap();
        assert!(matches!(outcome, RedeemOutcome::UnknownKey));
    }
}
