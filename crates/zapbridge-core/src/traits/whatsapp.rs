// SPDX-FileCopyrightText: 2026 Zapbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The WhatsApp protocol client capability.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::BridgeError;
use crate::types::{ChatAddress, MediaAttachment, OutgoingContent, TenantId};

/// A logged-in WhatsApp session for one tenant.
///
/// The protocol implementation lives outside this workspace; the bridge only
/// needs session state, sending, and media download.
#[async_trait]
pub trait WhatsAppClient: Send + Sync {
    /// Whether the session has completed pairing/login.
    fn is_logged_in(&self) -> bool;

    /// Whether the underlying socket is currently connected.
    fn is_connected(&self) -> bool;

    /// Sends content to a chat, returning the WhatsApp message id.
    async fn send_message(
        &self,
        to: &ChatAddress,
        content: OutgoingContent,
    ) -> Result<String, BridgeError>;

    /// Downloads and decrypts a media payload.
    async fn download(&self, media: &MediaAttachment) -> Result<Vec<u8>, BridgeError>;
}

/// Looks up the live WhatsApp client for a tenant.
pub trait ClientDirectory: Send + Sync {
    fn client_for(&self, tenant: &TenantId) -> Option<Arc<dyn WhatsAppClient>>;
}
