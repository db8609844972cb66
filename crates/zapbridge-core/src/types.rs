// SPDX-FileCopyrightText: 2026 Zapbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared by the bridge, the delivery engine, and storage.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Server part of one-to-one WhatsApp addresses.
pub const USER_SERVER: &str = "s.whatsapp.net";

/// Server part of group WhatsApp addresses.
pub const GROUP_SERVER: &str = "g.us";

/// Identifier of a tenant (one configured WhatsApp account/instance).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(pub String);

impl TenantId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TenantId {
    fn from(value: &str) -> Self {
        TenantId(value.to_string())
    }
}

/// A WhatsApp address of the form `<user>@<server>`.
///
/// A bare value without `@` is treated as a user on [`USER_SERVER`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub struct ChatAddress {
    user: String,
    server: String,
}

impl ChatAddress {
    /// Build an address from its parts.
    pub fn new(user: impl Into<String>, server: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            server: server.into(),
        }
    }

    /// Address of a one-to-one chat with the given phone number (digits only).
    pub fn user(phone: impl Into<String>) -> Self {
        Self::new(phone, USER_SERVER)
    }

    /// Parse `user@server`; the server defaults to [`USER_SERVER`].
    pub fn parse(raw: &str) -> Self {
        match raw.split_once('@') {
            Some((user, server)) => Self::new(user, server),
            None => Self::user(raw),
        }
    }

    /// The local part (phone number for users, group id for groups).
    pub fn local_part(&self) -> &str {
        &self.user
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn is_group(&self) -> bool {
        self.server == GROUP_SERVER
    }
}

impl fmt::Display for ChatAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.user, self.server)
    }
}

impl From<String> for ChatAddress {
    fn from(value: String) -> Self {
        ChatAddress::parse(&value)
    }
}

impl From<ChatAddress> for String {
    fn from(value: ChatAddress) -> Self {
        value.to_string()
    }
}

/// Media kinds the bridge knows how to forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    Document,
    Sticker,
}

/// A downloadable media payload carried by a WhatsApp message.
///
/// `handle` is opaque to the bridge; only the WhatsApp client interprets it
/// when downloading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaAttachment {
    pub kind: MediaKind,
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
    pub handle: String,
}

impl MediaAttachment {
    /// File name used when uploading this media to the ticketing platform.
    pub fn upload_file_name(&self, message_id: &str) -> String {
        match self.kind {
            MediaKind::Image if self.mime_type == "image/png" => format!("{message_id}.png"),
            MediaKind::Image => format!("{message_id}.jpg"),
            MediaKind::Video => format!("{message_id}.mp4"),
            MediaKind::Audio if self.mime_type == "audio/mpeg" => format!("{message_id}.mp3"),
            MediaKind::Audio => format!("{message_id}.ogg"),
            MediaKind::Sticker => format!("{message_id}.webp"),
            MediaKind::Document => match self.file_name.as_deref() {
                Some(name) if !name.is_empty() => name.to_string(),
                _ => format!("{message_id}.pdf"),
            },
        }
    }

    /// Caption, if any. Audio and sticker messages never carry one.
    pub fn caption(&self) -> Option<&str> {
        match self.kind {
            MediaKind::Audio | MediaKind::Sticker => None,
            _ => self.caption.as_deref().filter(|c| !c.is_empty()),
        }
    }
}

/// The payload of a WhatsApp message event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum MessageBody {
    /// Plain or extended text.
    Text(String),
    /// Image, video, audio, document, or sticker.
    Media(MediaAttachment),
    /// Protocol control message (revokes, ephemeral settings, key shares).
    Protocol,
    Reaction,
    PollCreation,
    PollUpdate,
    /// "Keep in chat" marker.
    KeepInChat,
    /// Anything the bridge does not understand.
    Unsupported,
}

impl MessageBody {
    /// True when the message carries no user-visible payload.
    pub fn is_noise(&self) -> bool {
        match self {
            MessageBody::Text(text) => text.is_empty(),
            MessageBody::Media(_) => false,
            MessageBody::Protocol
            | MessageBody::Reaction
            | MessageBody::PollCreation
            | MessageBody::PollUpdate
            | MessageBody::KeepInChat
            | MessageBody::Unsupported => true,
        }
    }
}

/// Envelope metadata of a WhatsApp message event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageInfo {
    pub id: String,
    pub chat: ChatAddress,
    pub sender: ChatAddress,
    #[serde(default)]
    pub is_group: bool,
    #[serde(default)]
    pub is_from_me: bool,
    #[serde(default)]
    pub push_name: String,
}

/// A WhatsApp message event as delivered by the protocol client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEvent {
    pub info: MessageInfo,
    pub body: MessageBody,
}

/// Content handed to the WhatsApp client for sending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutgoingContent {
    Text { text: String },
    /// Media referenced by URL; the WhatsApp client fetches and uploads it.
    Media {
        url: String,
        file_type: String,
        caption: String,
    },
}

/// Key under which a message id is recorded in the dedup guard.
pub type DedupKey = String;

/// A tenant as seen by the bridge and the delivery engine.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    /// Opaque per-tenant token used in webhook paths and API auth.
    pub token: String,
    /// Target URL for outbound event webhooks.
    pub webhook_url: Option<String>,
    /// Vault-sealed HMAC signing key (nonce || ciphertext).
    pub hmac_key: Option<Vec<u8>>,
    pub created_at: String,
}

impl fmt::Debug for Tenant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tenant")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("token", &"[redacted]")
            .field("webhook_url", &self.webhook_url)
            .field("hmac_key", &self.hmac_key.as_ref().map(|_| "[sealed]"))
            .finish()
    }
}

/// Per-tenant configuration of the ticketing-platform bridge.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantBridgeConfig {
    pub tenant_id: TenantId,
    pub account_id: String,
    pub api_token: String,
    pub base_url: String,
    pub inbox_id: Option<i64>,
    pub inbox_name: String,
    pub enabled: bool,
    pub auto_create_inbox: bool,
    pub sign_messages: bool,
    pub sign_delimiter: String,
    pub reopen_conversations: bool,
    pub conversations_pending: bool,
    pub merge_national_contacts: bool,
    pub organization: String,
    pub logo: String,
    pub created_at: String,
    pub updated_at: String,
}

impl TenantBridgeConfig {
    /// The API token as [`mask_token`] shows it.
    pub fn masked_token(&self) -> String {
        mask_token(&self.api_token)
    }
}

impl fmt::Debug for TenantBridgeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TenantBridgeConfig")
            .field("tenant_id", &self.tenant_id)
            .field("account_id", &self.account_id)
            .field("api_token", &self.masked_token())
            .field("base_url", &self.base_url)
            .field("inbox_id", &self.inbox_id)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

/// Below this many characters a secret is masked without any tail.
const MASK_TAIL_MIN_LEN: usize = 8;

/// Masks a secret for display: `****` plus the last four characters.
///
/// Secrets shorter than eight characters become `****`.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() < MASK_TAIL_MIN_LEN {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{tail}")
}

/// Mapping of a WhatsApp chat onto a remote conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMapping {
    pub tenant_id: TenantId,
    pub chat_address: String,
    pub conversation_id: i64,
    pub contact_id: i64,
    pub inbox_id: i64,
}

/// Mapping of a bridged WhatsApp message onto the remote message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageMapping {
    pub tenant_id: TenantId,
    pub message_id: String,
    pub remote_message_id: i64,
    pub remote_conversation_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_address_parses_user_and_group() {
        let user = ChatAddress::parse("5511999999999@s.whatsapp.net");
        assert_eq!(user.local_part(), "5511999999999");
        assert!(!user.is_group());

        let group = ChatAddress::parse("120363025@g.us");
        assert!(group.is_group());
        assert_eq!(group.to_string(), "120363025@g.us");
    }

    #[test]
    fn bare_number_defaults_to_user_server() {
        let addr = ChatAddress::parse("5511999999999");
        assert_eq!(addr.to_string(), "5511999999999@s.whatsapp.net");
    }

    #[test]
    fn chat_address_serializes_as_string() {
        let addr = ChatAddress::user("5511999999999");
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, "\"5511999999999@s.whatsapp.net\"");
        let back: ChatAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }

    #[test]
    fn noise_classification() {
        assert!(MessageBody::Protocol.is_noise());
        assert!(MessageBody::Reaction.is_noise());
        assert!(MessageBody::PollCreation.is_noise());
        assert!(MessageBody::PollUpdate.is_noise());
        assert!(MessageBody::KeepInChat.is_noise());
        assert!(MessageBody::Unsupported.is_noise());
        assert!(MessageBody::Text(String::new()).is_noise());
        assert!(!MessageBody::Text("Hello".into()).is_noise());
    }

    #[test]
    fn upload_file_names_follow_media_kind() {
        let mut media = MediaAttachment {
            kind: MediaKind::Image,
            mime_type: "image/png".into(),
            caption: None,
            file_name: None,
            handle: "h".into(),
        };
        assert_eq!(media.upload_file_name("ABC"), "ABC.png");
        media.mime_type = "image/jpeg".into();
        assert_eq!(media.upload_file_name("ABC"), "ABC.jpg");
        media.kind = MediaKind::Audio;
        assert_eq!(media.upload_file_name("ABC"), "ABC.ogg");
        media.kind = MediaKind::Document;
        assert_eq!(media.upload_file_name("ABC"), "ABC.pdf");
        media.file_name = Some("invoice.xlsx".into());
        assert_eq!(media.upload_file_name("ABC"), "invoice.xlsx");
    }

    #[test]
    fn audio_never_has_caption() {
        let media = MediaAttachment {
            kind: MediaKind::Audio,
            mime_type: "audio/ogg".into(),
            caption: Some("ignored".into()),
            file_name: None,
            handle: "h".into(),
        };
        assert_eq!(media.caption(), None);
    }

    #[test]
    fn token_masking() {
        assert_eq!(mask_token("abcdefgh1234"), "****1234");
        assert_eq!(mask_token("12345678"), "****5678");
    }

    #[test]
    fn short_tokens_are_never_echoed() {
        for token in ["", "a", "xyz", "abcd", "abcde", "1234567"] {
            assert_eq!(mask_token(token), "****", "token {token:?}");
        }
    }

    #[test]
    fn bridge_config_debug_hides_short_token() {
        let config = TenantBridgeConfig {
            tenant_id: TenantId::from("t1"),
            account_id: "1".into(),
            api_token: "abcd".into(),
            base_url: "http://cw".into(),
            inbox_id: None,
            inbox_name: "WhatsApp Inbox".into(),
            enabled: true,
            auto_create_inbox: false,
            sign_messages: false,
            sign_delimiter: "\\n".into(),
            reopen_conversations: false,
            conversations_pending: false,
            merge_national_contacts: false,
            organization: String::new(),
            logo: String::new(),
            created_at: String::new(),
            updated_at: String::new(),
        };
        let shown = format!("{config:?}");
        assert!(shown.contains("****"));
        assert!(!shown.contains("abcd"));
    }

    #[test]
    fn message_event_deserializes_from_json() {
        let json = r#"{
            "info": {
                "id": "3EB0ABC",
                "chat": "5511999999999@s.whatsapp.net",
                "sender": "5511999999999@s.whatsapp.net",
                "push_name": "Maria"
            },
            "body": {"type": "text", "data": "Hello"}
        }"#;
        let event: MessageEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.info.id, "3EB0ABC");
        assert!(!event.info.is_from_me);
        assert_eq!(event.body, MessageBody::Text("Hello".into()));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let tenant = Tenant {
            id: "t1".into(),
            name: "acme".into(),
            token: "super-secret-token".into(),
            webhook_url: None,
            hmac_key: Some(vec![1, 2, 3]),
            created_at: String::new(),
        };
        let debug = format!("{tenant:?}");
        assert!(!debug.contains("super-secret-token"));
        assert!(debug.contains("[sealed]"));
    }
}
