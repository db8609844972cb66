// SPDX-FileCopyrightText: 2026 Zapbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ready-made domain values for tests.

use zapbridge_core::types::GROUP_SERVER;
use zapbridge_core::{
    ChatAddress, MediaAttachment, MediaKind, MessageBody, MessageEvent, MessageInfo, Tenant,
    TenantBridgeConfig, TenantId,
};

/// Tenant `id` with token `token-<id>` and no webhook or signing key.
pub fn tenant(id: &str) -> Tenant {
    Tenant {
        id: TenantId::from(id),
        name: format!("Tenant {id}"),
        token: format!("token-{id}"),
        webhook_url: None,
        hmac_key: None,
        created_at: chrono::Utc::now().to_rfc3339(),
    }
}

/// Enabled bridge config for `tenant` pointing at `base_url`, inbox 7.
pub fn bridge_config(tenant: &str, base_url: &str) -> TenantBridgeConfig {
    let now = chrono::Utc::now().to_rfc3339();
    TenantBridgeConfig {
        tenant_id: TenantId::from(tenant),
        account_id: "1".into(),
        api_token: "cw-api-token-1234".into(),
        base_url: base_url.into(),
        inbox_id: Some(7),
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
        created_at: now.clone(),
        updated_at: now,
    }
}

/// Direct-chat event from `phone` carrying `body`.
pub fn direct_event(id: &str, phone: &str, body: MessageBody) -> MessageEvent {
    let address = ChatAddress::user(phone);
    MessageEvent {
        info: MessageInfo {
            id: id.into(),
            chat: address.clone(),
            sender: address,
            is_group: false,
            is_from_me: false,
            push_name: "Maria".into(),
        },
        body,
    }
}

pub fn text_event(id: &str, phone: &str, text: &str) -> MessageEvent {
    direct_event(id, phone, MessageBody::Text(text.into()))
}

/// Group event in `group` sent by participant `phone`.
pub fn group_event(id: &str, group: &str, phone: &str, text: &str) -> MessageEvent {
    MessageEvent {
        info: MessageInfo {
            id: id.into(),
            chat: ChatAddress::new(group, GROUP_SERVER),
            sender: ChatAddress::user(phone),
            is_group: true,
            is_from_me: false,
            push_name: "Joao".into(),
        },
        body: MessageBody::Text(text.into()),
    }
}

pub fn image(handle: &str, caption: Option<&str>) -> MediaAttachment {
    MediaAttachment {
        kind: MediaKind::Image,
        mime_type: "image/jpeg".into(),
        caption: caption.map(str::to_string),
        file_name: None,
        handle: handle.into(),
    }
}
