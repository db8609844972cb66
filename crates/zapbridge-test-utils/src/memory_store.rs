// SPDX-FileCopyrightText: 2026 Zapbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory `BridgeStore` for tests that do not need SQLite.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use zapbridge_core::{
    BridgeError, BridgeStore, ConversationMapping, MessageMapping, Tenant, TenantBridgeConfig,
    TenantId,
};

/// Map-backed store with the same uniqueness rules as the SQLite schema.
#[derive(Default)]
pub struct InMemoryStore {
    tenants: Mutex<HashMap<TenantId, Tenant>>,
    configs: Mutex<HashMap<TenantId, TenantBridgeConfig>>,
    conversations: Mutex<HashMap<(TenantId, String), ConversationMapping>>,
    messages: Mutex<HashMap<(TenantId, String), MessageMapping>>,
    conversation_lookups: AtomicUsize,
    fail_conversation_writes: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_tenant(&self, tenant: Tenant) {
        self.tenants.lock().await.insert(tenant.id.clone(), tenant);
    }

    pub async fn put_config(&self, config: TenantBridgeConfig) {
        self.configs
            .lock()
            .await
            .insert(config.tenant_id.clone(), config);
    }

    /// Makes `upsert_conversation` fail until further notice.
    pub fn fail_conversation_writes(&self) {
        self.fail_conversation_writes.store(true, Ordering::SeqCst);
    }

    pub async fn conversations(&self) -> Vec<ConversationMapping> {
        self.conversations.lock().await.values().cloned().collect()
    }

    pub async fn messages(&self) -> Vec<MessageMapping> {
        self.messages.lock().await.values().cloned().collect()
    }

    /// Number of `get_conversation` calls served.
    pub fn conversation_lookups(&self) -> usize {
        self.conversation_lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BridgeStore for InMemoryStore {
    async fn tenant_by_token(&self, token: &str) -> Result<Option<Tenant>, BridgeError> {
        Ok(self
            .tenants
            .lock()
            .await
            .values()
            .find(|t| t.token == token)
            .cloned())
    }

    async fn get_tenant(&self, id: &TenantId) -> Result<Option<Tenant>, BridgeError> {
        Ok(self.tenants.lock().await.get(id).cloned())
    }

    async fn get_bridge_config(
        &self,
        tenant: &TenantId,
    ) -> Result<Option<TenantBridgeConfig>, BridgeError> {
        Ok(self.configs.lock().await.get(tenant).cloned())
    }

    async fn save_bridge_config(&self, config: &TenantBridgeConfig) -> Result<(), BridgeError> {
        let mut configs = self.configs.lock().await;
        let mut next = config.clone();
        if let Some(existing) = configs.get(&config.tenant_id) {
            next.created_at = existing.created_at.clone();
        }
        configs.insert(config.tenant_id.clone(), next);
        Ok(())
    }

    async fn delete_bridge_config(&self, tenant: &TenantId) -> Result<bool, BridgeError> {
        Ok(self.configs.lock().await.remove(tenant).is_some())
    }

    async fn get_conversation(
        &self,
        tenant: &TenantId,
        chat_address: &str,
    ) -> Result<Option<ConversationMapping>, BridgeError> {
        self.conversation_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .conversations
            .lock()
            .await
            .get(&(tenant.clone(), chat_address.to_string()))
            .cloned())
    }

    async fn upsert_conversation(&self, mapping: &ConversationMapping) -> Result<(), BridgeError> {
        if self.fail_conversation_writes.load(Ordering::SeqCst) {
            return Err(BridgeError::storage("conversation writes disabled"));
        }
        self.conversations.lock().await.insert(
            (mapping.tenant_id.clone(), mapping.chat_address.clone()),
            mapping.clone(),
        );
        Ok(())
    }

    async fn record_message(&self, mapping: &MessageMapping) -> Result<(), BridgeError> {
        self.messages
            .lock()
            .await
            .entry((mapping.tenant_id.clone(), mapping.message_id.clone()))
            .or_insert_with(|| mapping.clone());
        Ok(())
    }
}
