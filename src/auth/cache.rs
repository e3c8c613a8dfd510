//! Write-through, per-phone session cache
//!
//! An in-memory accelerator in front of the [`SessionStore`]: reads populate
//! the map from the store once per process run (absence included), writes go
//! to the store first and only then to the map, so the cache never holds a
//! session the store has not accepted.
//!
//! Each phone number has its own async mutex slot. Holding the slot across a
//! whole renewal sequence gives the at-most-one-in-flight guarantee; callers
//! for different phone numbers never contend.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::error::Result;
use crate::providers::SessionStore;

use super::session::Session;

#[derive(Default)]
struct Slot {
    loaded: bool,
    session: Option<Session>,
}

/// Write-through cache of sessions keyed by phone number.
///
/// One slot per phone for the process lifetime; no eviction.
pub struct SessionCache {
    store: Arc<dyn SessionStore>,
    slots: Mutex<HashMap<String, Arc<Mutex<Slot>>>>,
}

impl SessionCache {
    /// Create a cache backed by `store`
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            store,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Lock the slot for `phone`, serializing against every other access to
    /// the same phone. The guard spans the caller's whole read/renew/write
    /// sequence.
    pub(crate) async fn entry(&self, phone: &str) -> SessionEntry {
        let slot = {
            let mut slots = self.slots.lock().await;
            Arc::clone(slots.entry(phone.to_string()).or_default())
        };
        SessionEntry {
            phone: phone.to_string(),
            store: Arc::clone(&self.store),
            slot: slot.lock_owned().await,
        }
    }

    /// Get the cached session for `phone`, loading from the store on the
    /// first access.
    ///
    /// # Errors
    /// Propagates a store load failure; nothing is cached in that case.
    pub async fn get(&self, phone: &str) -> Result<Option<Session>> {
        self.entry(phone).await.get().await
    }

    /// Replace the session for `phone`, writing through to the store.
    ///
    /// # Errors
    /// Propagates a store persist failure; the in-memory value then stays on
    /// its prior state.
    pub async fn update(&self, phone: &str, session: Session) -> Result<()> {
        self.entry(phone).await.set(session).await
    }

    /// Remove the session for `phone` from the store and the cache.
    ///
    /// # Errors
    /// Propagates a store persist failure; the cached session is kept in
    /// that case.
    pub async fn invalidate(&self, phone: &str) -> Result<()> {
        self.entry(phone).await.clear().await
    }
}

/// Exclusive handle on one phone's cache slot
pub(crate) struct SessionEntry {
    phone: String,
    store: Arc<dyn SessionStore>,
    slot: OwnedMutexGuard<Slot>,
}

impl SessionEntry {
    /// Cached session, loading from the store on first access.
    ///
    /// Absence is cached too, so a phone with no stored session does not
    /// hit the store on every call.
    pub(crate) async fn get(&mut self) -> Result<Option<Session>> {
        if !self.slot.loaded {
            self.slot.session = self.store.load(&self.phone).await?;
            self.slot.loaded = true;
            tracing::debug!(
                phone = %self.phone,
                found = self.slot.session.is_some(),
                "loaded session from store"
            );
        }
        Ok(self.slot.session.clone())
    }

    /// Write `session` through to the store, then into the slot.
    ///
    /// On persist failure the slot keeps its prior value: consistency with
    /// durable storage wins over availability.
    pub(crate) async fn set(&mut self, session: Session) -> Result<()> {
        self.store.persist(&self.phone, Some(&session)).await?;
        self.slot.session = Some(session);
        self.slot.loaded = true;
        tracing::debug!(phone = %self.phone, "session written through");
        Ok(())
    }

    /// Persist removal to the store, then drop the cached value
    pub(crate) async fn clear(&mut self) -> Result<()> {
        self.store.persist(&self.phone, None).await?;
        self.slot.session = None;
        self.slot.loaded = true;
        tracing::debug!(phone = %self.phone, "session invalidated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{TimeDelta, Utc};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use crate::error::LkdrError;
    use crate::types::DateTimeTz;

    fn session(token: &str) -> Session {
        Session {
            access_token: token.into(),
            access_token_expires_at: DateTimeTz(Utc::now() + TimeDelta::hours(1)),
            refresh_token: "rt".into(),
            refresh_token_expires_at: None,
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        sessions: std::sync::Mutex<HashMap<String, Session>>,
        loads: AtomicUsize,
        fail_persist: AtomicBool,
    }

    #[async_trait]
    impl SessionStore for MemoryStore {
        async fn load(&self, phone: &str) -> Result<Option<Session>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(self.sessions.lock().unwrap().get(phone).cloned())
        }

        async fn persist(&self, phone: &str, session: Option<&Session>) -> Result<()> {
            if self.fail_persist.load(Ordering::SeqCst) {
                return Err(LkdrError::storage("persist failed"));
            }
            let mut sessions = self.sessions.lock().unwrap();
            match session {
                Some(session) => sessions.insert(phone.to_string(), session.clone()),
                None => sessions.remove(phone),
            };
            Ok(())
        }
    }

    #[tokio::test]
    async fn absence_is_cached() {
        let store = Arc::new(MemoryStore::default());
        let cache = SessionCache::new(store.clone());

        assert!(cache.get("+7999").await.unwrap().is_none());
        assert!(cache.get("+7999").await.unwrap().is_none());
        assert_eq!(store.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn update_writes_through() {
        let store = Arc::new(MemoryStore::default());
        let cache = SessionCache::new(store.clone());

        cache.update("+7999", session("at-1")).await.unwrap();
        assert_eq!(
            store.sessions.lock().unwrap()["+7999"].access_token,
            "at-1"
        );
        // Served from memory, no store load needed after a write
        let cached = cache.get("+7999").await.unwrap().unwrap();
        assert_eq!(cached.access_token, "at-1");
        assert_eq!(store.loads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn failed_persist_leaves_memory_on_prior_state() {
        let store = Arc::new(MemoryStore::default());
        let cache = SessionCache::new(store.clone());
        cache.update("+7999", session("old")).await.unwrap();

        store.fail_persist.store(true, Ordering::SeqCst);
        let err = cache.update("+7999", session("new")).await.unwrap_err();
        assert!(matches!(err, LkdrError::Storage(_)));

        let cached = cache.get("+7999").await.unwrap().unwrap();
        assert_eq!(cached.access_token, "old");
    }

    #[tokio::test]
    async fn invalidate_clears_store_and_cache() {
        let store = Arc::new(MemoryStore::default());
        let cache = SessionCache::new(store.clone());
        cache.update("+7999", session("at")).await.unwrap();

        cache.invalidate("+7999").await.unwrap();
        assert!(store.sessions.lock().unwrap().is_empty());
        assert!(cache.get("+7999").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn entries_for_distinct_phones_do_not_block() {
        let store = Arc::new(MemoryStore::default());
        let cache = SessionCache::new(store);

        let first = cache.entry("+7001").await;
        // Must not deadlock while the first entry is held
        let mut second = cache.entry("+7002").await;
        assert!(second.get().await.unwrap().is_none());
        drop(first);
    }
}
