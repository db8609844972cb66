// SPDX-FileCopyrightText: 2026 Zapbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chatwoot helpdesk integration.
//!
//! [`ChatwootClient`] wraps the account-scoped REST API used by the bridge
//! (inboxes, contacts, conversations, messages). [`webhook`] holds the
//! payload Chatwoot posts back when an agent replies.

pub mod client;
pub mod types;
pub mod webhook;

pub use client::{ChatwootClient, NewContact};
pub use webhook::WebhookPayload;

/// Source-id prefix marking messages the bridge created from WhatsApp.
pub const WHATSAPP_SOURCE_PREFIX: &str = "WAID:";

/// Source id tagging a remote message created from a WhatsApp message.
pub fn message_source_id(whatsapp_message_id: &str) -> String {
    format!("{WHATSAPP_SOURCE_PREFIX}{whatsapp_message_id}")
}

/// Deterministic source id for the conversation of a WhatsApp chat.
pub fn conversation_source_id(chat_address: &str) -> String {
    format!("wa:{chat_address}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_ids() {
        assert_eq!(message_source_id("3EB0"), "WAID:3EB0");
        assert_eq!(
            conversation_source_id("5511@s.whatsapp.net"),
            "wa:5511@s.whatsapp.net"
        );
    }
}
