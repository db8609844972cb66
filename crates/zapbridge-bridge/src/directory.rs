// SPDX-FileCopyrightText: 2026 Zapbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process registry of live WhatsApp sessions.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::info;
use zapbridge_core::{ClientDirectory, TenantId, WhatsAppClient};

/// Sessions keyed by tenant. The protocol layer registers a client once it
/// has paired and removes it on logout.
#[derive(Default)]
pub struct ClientRegistry {
    clients: DashMap<TenantId, Arc<dyn WhatsAppClient>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, tenant: TenantId, client: Arc<dyn WhatsAppClient>) {
        info!(tenant = %tenant, "whatsapp client registered");
        self.clients.insert(tenant, client);
    }

    pub fn remove(&self, tenant: &TenantId) -> bool {
        self.clients.remove(tenant).is_some()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

impl ClientDirectory for ClientRegistry {
    fn client_for(&self, tenant: &TenantId) -> Option<Arc<dyn WhatsAppClient>> {
        self.clients.get(tenant).map(|c| Arc::clone(c.value()))
    }
}
