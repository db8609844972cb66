// SPDX-FileCopyrightText: 2026 Zapbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Two-tier cache of chat → remote conversation ids.
//!
//! Lookups hit process memory first, then the persistent store. On a miss in
//! both tiers the caller-supplied creator runs under a per-chat lock, so
//! concurrent first contacts for one chat create exactly one remote
//! conversation. Entries never expire.

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use zapbridge_core::{BridgeError, BridgeStore, ConversationMapping, TenantId};

pub struct ConversationCache {
    store: Arc<dyn BridgeStore>,
    memory: DashMap<String, i64>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl ConversationCache {
    pub fn new(store: Arc<dyn BridgeStore>) -> Self {
        Self {
            store,
            memory: DashMap::new(),
            locks: DashMap::new(),
        }
    }

    fn key(tenant: &TenantId, chat_address: &str) -> String {
        format!("{tenant}:{chat_address}")
    }

    /// Memory-tier lookup only.
    pub fn cached(&self, tenant: &TenantId, chat_address: &str) -> Option<i64> {
        self.memory
            .get(&Self::key(tenant, chat_address))
            .map(|id| *id)
    }

    /// Returns the conversation for `chat_address`, creating it with
    /// `create` when neither tier knows it.
    ///
    /// A failure to persist a freshly created mapping is logged and the id
    /// is still returned and cached in memory.
    pub async fn ensure_with<F, Fut>(
        &self,
        tenant: &TenantId,
        chat_address: &str,
        contact_id: i64,
        inbox_id: i64,
        create: F,
    ) -> Result<i64, BridgeError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<i64, BridgeError>>,
    {
        let key = Self::key(tenant, chat_address);
        if let Some(id) = self.memory.get(&key).map(|id| *id) {
            debug!(key = %key, conversation_id = id, "conversation found in memory cache");
            return Ok(id);
        }

        let lock = self
            .locks
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let held = lock.lock().await;
        let result = self
            .resolve(&key, tenant, chat_address, contact_id, inbox_id, create)
            .await;
        drop(held);

        // Only the map and this call still hold the lock: nobody is waiting.
        self.locks.remove_if(&key, |_, l| Arc::strong_count(l) <= 2);
        result
    }

    async fn resolve<F, Fut>(
        &self,
        key: &str,
        tenant: &TenantId,
        chat_address: &str,
        contact_id: i64,
        inbox_id: i64,
        create: F,
    ) -> Result<i64, BridgeError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<i64, BridgeError>>,
    {
        if let Some(id) = self.memory.get(key).map(|id| *id) {
            return Ok(id);
        }

        if let Some(mapping) = self.store.get_conversation(tenant, chat_address).await? {
            debug!(
                key = %key,
                conversation_id = mapping.conversation_id,
                "conversation found in store"
            );
            self.memory.insert(key.to_string(), mapping.conversation_id);
            return Ok(mapping.conversation_id);
        }

        let conversation_id = create().await?;
        info!(
            tenant = %tenant,
            chat = chat_address,
            conversation_id,
            contact_id,
            "created remote conversation"
        );

        let mapping = ConversationMapping {
            tenant_id: tenant.clone(),
            chat_address: chat_address.to_string(),
            conversation_id,
            contact_id,
            inbox_id,
        };
        if let Err(e) = self.store.upsert_conversation(&mapping).await {
            warn!(
                tenant = %tenant,
                chat = chat_address,
                conversation_id,
                error = %e,
                "failed to persist conversation mapping; a restart may create a duplicate"
            );
        }

        self.memory.insert(key.to_string(), conversation_id);
        Ok(conversation_id)
    }

    /// Persists and caches a mapping learned from the remote side.
    pub async fn remember(&self, mapping: &ConversationMapping) -> Result<(), BridgeError> {
        self.store.upsert_conversation(mapping).await?;
        self.memory.insert(
            Self::key(&mapping.tenant_id, &mapping.chat_address),
            mapping.conversation_id,
        );
        Ok(())
    }

    /// Drops the memory tier, as after a restart.
    pub fn clear_memory(&self) {
        self.memory.clear();
    }

    pub fn len(&self) -> usize {
        self.memory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use zapbridge_test_utils::InMemoryStore;

    const CHAT: &str = "5511999999999@s.whatsapp.net";

    fn tenant() -> TenantId {
        TenantId::from("t1")
    }

    #[tokio::test]
    async fn sequential_ensures_create_once() {
        let store = Arc::new(InMemoryStore::new());
        let cache = ConversationCache::new(store.clone());
        let creates = AtomicUsize::new(0);

        for _ in 0..5 {
            let id = cache
                .ensure_with(&tenant(), CHAT, 1, 7, || async {
                    creates.fetch_add(1, Ordering::SeqCst);
                    Ok(42)
                })
                .await
                .unwrap();
            assert_eq!(id, 42);
        }

        assert_eq!(creates.load(Ordering::SeqCst), 1);
        // One store lookup on the first miss; the rest are memory hits.
        assert_eq!(store.conversation_lookups(), 1);
        assert_eq!(store.conversations().await.len(), 1);
    }

    #[tokio::test]
    async fn store_tier_serves_after_memory_is_cleared() {
        let store = Arc::new(InMemoryStore::new());
        let cache = ConversationCache::new(store.clone());
        cache
            .ensure_with(&tenant(), CHAT, 1, 7, || async { Ok(42) })
            .await
            .unwrap();

        cache.clear_memory();
        let id = cache
            .ensure_with(&tenant(), CHAT, 1, 7, || async {
                Err(BridgeError::Internal("created twice".into()))
            })
            .await
            .unwrap();
        assert_eq!(id, 42);
        assert_eq!(cache.cached(&tenant(), CHAT), Some(42));
    }

    #[tokio::test]
    async fn persistence_failure_still_returns_and_caches() {
        let store = Arc::new(InMemoryStore::new());
        store.fail_conversation_writes();
        let cache = ConversationCache::new(store.clone());

        let id = cache
            .ensure_with(&tenant(), CHAT, 1, 7, || async { Ok(99) })
            .await
            .unwrap();
        assert_eq!(id, 99);
        assert_eq!(cache.cached(&tenant(), CHAT), Some(99));
        assert!(store.conversations().await.is_empty());
    }

    #[tokio::test]
    async fn create_failure_caches_nothing() {
        let cache = ConversationCache::new(Arc::new(InMemoryStore::new()));
        let result = cache
            .ensure_with(&tenant(), CHAT, 1, 7, || async {
                Err(BridgeError::remote(Some(500), "boom"))
            })
            .await;
        assert!(result.is_err());
        assert!(cache.is_empty());
        assert!(cache.locks.is_empty());
    }

    #[tokio::test]
    async fn per_chat_locks_are_released() {
        let cache = ConversationCache::new(Arc::new(InMemoryStore::new()));
        cache
            .ensure_with(&tenant(), CHAT, 1, 7, || async { Ok(42) })
            .await
            .unwrap();
        assert!(cache.locks.is_empty());

        let other = "5511888888888@s.whatsapp.net";
        for _ in 0..3 {
            let _ = cache
                .ensure_with(&tenant(), other, 1, 7, || async {
                    Err(BridgeError::remote(Some(502), "bad gateway"))
                })
                .await;
        }
        assert!(cache.locks.is_empty());
        assert_eq!(cache.cached(&tenant(), other), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_contact_creates_once() {
        let store = Arc::new(InMemoryStore::new());
        let cache = Arc::new(ConversationCache::new(store.clone()));
        let creates = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            let creates = Arc::clone(&creates);
            handles.push(tokio::spawn(async move {
                cache
                    .ensure_with(&TenantId::from("t1"), CHAT, 1, 7, || async move {
                        creates.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                        Ok(5)
                    })
                    .await
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap().unwrap(), 5);
        }
        assert_eq!(creates.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn remember_writes_both_tiers() {
        let store = Arc::new(InMemoryStore::new());
        let cache = ConversationCache::new(store.clone());
        let mapping = ConversationMapping {
            tenant_id: tenant(),
            chat_address: CHAT.into(),
            conversation_id: 11,
            contact_id: 3,
            inbox_id: 7,
        };
        cache.remember(&mapping).await.unwrap();
        assert_eq!(cache.cached(&tenant(), CHAT), Some(11));
        assert_eq!(store.conversations().await, vec![mapping]);
    }
}
