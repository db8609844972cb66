// SPDX-FileCopyrightText: 2026 Zapbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the zapbridge WhatsApp/helpdesk bridge.
//!
//! This crate provides the error taxonomy, the domain types shared by the
//! bridge and the delivery engine, and the narrow traits through which they
//! consume external collaborators (the WhatsApp protocol client, the
//! relational store, and the durable queue).

pub mod error;
pub mod traits;
pub mod types;

pub use error::BridgeError;
pub use types::{
    ChatAddress, ConversationMapping, DedupKey, MediaAttachment, MediaKind, MessageBody,
    MessageEvent, MessageInfo, MessageMapping, OutgoingContent, Tenant, TenantBridgeConfig,
    TenantId, mask_token,
};

pub use traits::{BridgeStore, ClientDirectory, QueuePublisher, WhatsAppClient};
