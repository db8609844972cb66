// SPDX-FileCopyrightText: 2026 Zapbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation bridge between WhatsApp and the Chatwoot helpdesk.
//!
//! Inbound, every WhatsApp message becomes a message in a helpdesk
//! conversation (one conversation per chat). Outbound, agent replies
//! delivered by the helpdesk webhook are sent back to WhatsApp. A shared
//! [`DedupGuard`] keeps the two directions from echoing each other.

pub mod cache;
pub mod dedup;
pub mod directory;
pub mod phone;
pub mod service;
pub mod settings;

pub use cache::ConversationCache;
pub use dedup::DedupGuard;
pub use directory::ClientRegistry;
pub use service::{BridgeService, InboundOutcome, WebhookAck};
pub use settings::{BridgeSettingsRequest, BridgeSettingsView, webhook_url};
