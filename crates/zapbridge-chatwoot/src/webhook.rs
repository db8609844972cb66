// SPDX-FileCopyrightText: 2026 Zapbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The `message_created` webhook Chatwoot posts when a message is added.

use serde::Deserialize;

use crate::WHATSAPP_SOURCE_PREFIX;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub message_type: String,
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub conversation: WebhookConversation,
    #[serde(default)]
    pub inbox: WebhookInbox,
    #[serde(default)]
    pub sender: WebhookSender,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookConversation {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub meta: ConversationMeta,
    #[serde(default)]
    pub messages: Vec<ConversationMessage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConversationMeta {
    #[serde(default)]
    pub sender: MetaSender,
}

/// The contact side of the conversation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetaSender {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub identifier: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConversationMessage {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub source_id: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Attachment {
    #[serde(default)]
    pub data_url: String,
    #[serde(default)]
    pub file_type: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookInbox {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

/// The agent who wrote the message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookSender {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub available_name: Option<String>,
}

impl WebhookPayload {
    /// Reason to ignore this payload, or `None` when it should be forwarded.
    ///
    /// Only public outgoing `message_created` events are forwarded, and
    /// never echoes of messages the bridge created itself.
    pub fn ignore_reason(&self) -> Option<&'static str> {
        if self.event != "message_created" {
            return Some("not message_created");
        }
        if self.message_type != "outgoing" {
            return Some("not outgoing");
        }
        if self.private {
            return Some("private note");
        }
        if self.is_echo() {
            return Some("loop prevention");
        }
        None
    }

    /// True when the lead message of the snapshot is this event and carries
    /// the bridge's source-id prefix.
    pub fn is_echo(&self) -> bool {
        self.conversation.messages.first().is_some_and(|first| {
            first.id == self.id
                && first
                    .source_id
                    .as_deref()
                    .is_some_and(|s| s.starts_with(WHATSAPP_SOURCE_PREFIX))
        })
    }

    /// Local part of the destination WhatsApp address.
    ///
    /// Prefers the contact identifier (taking the part before `@`), then the
    /// phone number without its leading `+`.
    pub fn destination(&self) -> Option<String> {
        let sender = &self.conversation.meta.sender;
        let local = match sender.identifier.as_deref().filter(|s| !s.is_empty()) {
            Some(identifier) => identifier.split('@').next().unwrap_or_default(),
            None => sender
                .phone_number
                .as_deref()
                .unwrap_or_default()
                .trim_start_matches('+'),
        };
        (!local.is_empty()).then(|| local.to_string())
    }

    /// Attachments of the triggering message.
    pub fn attachments(&self) -> &[Attachment] {
        self.conversation
            .messages
            .iter()
            .find(|m| m.id == self.id)
            .map(|m| m.attachments.as_slice())
            .unwrap_or_default()
    }

    pub fn content(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }

    /// Display name of the replying agent.
    pub fn agent_name(&self) -> Option<&str> {
        self.sender
            .available_name
            .as_deref()
            .or(self.sender.name.as_deref())
            .filter(|n| !n.is_empty())
    }
}
