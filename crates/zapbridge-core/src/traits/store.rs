// SPDX-FileCopyrightText: 2026 Zapbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence operations the bridge depends on.

use async_trait::async_trait;

use crate::error::BridgeError;
use crate::types::{ConversationMapping, MessageMapping, Tenant, TenantBridgeConfig, TenantId};

/// Relational store for tenants, bridge configuration, and id mappings.
#[async_trait]
pub trait BridgeStore: Send + Sync {
    /// Resolves the tenant owning an opaque webhook/API token.
    async fn tenant_by_token(&self, token: &str) -> Result<Option<Tenant>, BridgeError>;

    async fn get_tenant(&self, id: &TenantId) -> Result<Option<Tenant>, BridgeError>;

    async fn get_bridge_config(
        &self,
        tenant: &TenantId,
    ) -> Result<Option<TenantBridgeConfig>, BridgeError>;

    /// Inserts or replaces the bridge configuration of a tenant.
    async fn save_bridge_config(&self, config: &TenantBridgeConfig) -> Result<(), BridgeError>;

    /// Deletes the bridge configuration; returns whether one existed.
    async fn delete_bridge_config(&self, tenant: &TenantId) -> Result<bool, BridgeError>;

    async fn get_conversation(
        &self,
        tenant: &TenantId,
        chat_address: &str,
    ) -> Result<Option<ConversationMapping>, BridgeError>;

    /// Inserts or updates the mapping keyed by (tenant, chat address).
    async fn upsert_conversation(&self, mapping: &ConversationMapping) -> Result<(), BridgeError>;

    /// Records a bridged message. Duplicates are ignored.
    async fn record_message(&self, mapping: &MessageMapping) -> Result<(), BridgeError>;
}
