// SPDX-FileCopyrightText: 2026 Zapbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The bridge service: WhatsApp events into helpdesk conversations and
//! helpdesk agent replies back into WhatsApp.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use secrecy::SecretString;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use zapbridge_chatwoot::{
    ChatwootClient, NewContact, WebhookPayload, conversation_source_id, message_source_id,
};
use zapbridge_config::model::BridgeConfig;
use zapbridge_core::{
    BridgeError, BridgeStore, ChatAddress, ClientDirectory, ConversationMapping, MessageBody,
    MessageEvent, MessageMapping, OutgoingContent, Tenant, TenantBridgeConfig, TenantId,
    WhatsAppClient,
};

use crate::cache::ConversationCache;
use crate::dedup::DedupGuard;
use crate::phone::{brazil_alternate, to_e164};

/// Result of feeding one WhatsApp event through the inbound path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundOutcome {
    /// The message id was already processed within the dedup window.
    Duplicate,
    /// The event carries nothing a human would read.
    Noise,
    /// The tenant has no bridge configured, or it is disabled.
    Inactive,
    Bridged {
        conversation_id: i64,
        message_id: i64,
    },
}

/// Result of a helpdesk webhook call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookAck {
    Ignored(&'static str),
    /// Sent to WhatsApp; carries the WhatsApp ids of every message sent.
    Delivered { message_ids: Vec<String> },
}

struct CachedClient {
    fingerprint: String,
    client: ChatwootClient,
}

/// Owns the dedup guard, the conversation cache, and one helpdesk client per
/// tenant. The dedup sweeper lives as long as the service.
pub struct BridgeService {
    pub(crate) store: Arc<dyn BridgeStore>,
    directory: Arc<dyn ClientDirectory>,
    dedup: Arc<DedupGuard>,
    conversations: ConversationCache,
    clients: DashMap<TenantId, CachedClient>,
    pub(crate) settings: BridgeConfig,
    shutdown: CancellationToken,
}

impl BridgeService {
    /// Builds the service and starts the dedup sweeper. Must be called from
    /// within a Tokio runtime.
    pub fn new(
        store: Arc<dyn BridgeStore>,
        directory: Arc<dyn ClientDirectory>,
        settings: BridgeConfig,
    ) -> Self {
        let dedup = Arc::new(DedupGuard::new(Duration::from_secs(
            settings.dedup_window_secs,
        )));
        let shutdown = CancellationToken::new();
        dedup.spawn_sweeper(
            Duration::from_secs(settings.dedup_sweep_interval_secs),
            shutdown.child_token(),
        );

        Self {
            conversations: ConversationCache::new(Arc::clone(&store)),
            store,
            directory,
            dedup,
            clients: DashMap::new(),
            settings,
            shutdown,
        }
    }

    pub fn dedup(&self) -> &DedupGuard {
        &self.dedup
    }

    pub fn conversations(&self) -> &ConversationCache {
        &self.conversations
    }

    /// Stops background work. Idempotent.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Helpdesk client for a tenant's current configuration.
    pub(crate) fn remote_client(
        &self,
        config: &TenantBridgeConfig,
    ) -> Result<ChatwootClient, BridgeError> {
        let fingerprint = format!(
            "{}\n{}\n{}",
            config.base_url, config.account_id, config.api_token
        );
        if let Some(cached) = self.clients.get(&config.tenant_id) {
            if cached.fingerprint == fingerprint {
                return Ok(cached.client.clone());
            }
        }

        let client = ChatwootClient::new(
            &config.base_url,
            &config.account_id,
            &SecretString::from(config.api_token.clone()),
            Duration::from_secs(self.settings.remote_timeout_secs),
        )?;
        self.clients.insert(
            config.tenant_id.clone(),
            CachedClient {
                fingerprint,
                client: client.clone(),
            },
        );
        Ok(client)
    }

    pub(crate) fn forget_client(&self, tenant: &TenantId) {
        self.clients.remove(tenant);
    }

    /// Resolves the tenant owning `token`.
    pub async fn authenticate(&self, token: &str) -> Result<Tenant, BridgeError> {
        self.store
            .tenant_by_token(token)
            .await?
            .ok_or_else(|| BridgeError::Unauthorized("invalid token".into()))
    }

    /// Mirrors one WhatsApp message into the tenant's helpdesk inbox.
    ///
    /// Each message id is processed at most once per dedup window: the id is
    /// committed before any remote call, so a failure is not retried.
    pub async fn handle_incoming_message(
        &self,
        tenant: &TenantId,
        event: &MessageEvent,
        client: &dyn WhatsAppClient,
        cancel: &CancellationToken,
    ) -> Result<InboundOutcome, BridgeError> {
        let info = &event.info;
        if !self
            .dedup
            .check_and_insert(DedupGuard::key(tenant, &info.id))
        {
            debug!(tenant = %tenant, message_id = %info.id, "message already processed");
            return Ok(InboundOutcome::Duplicate);
        }

        if event.body.is_noise() {
            debug!(tenant = %tenant, message_id = %info.id, "skipping noise message");
            return Ok(InboundOutcome::Noise);
        }

        let config = match self.store.get_bridge_config(tenant).await? {
            Some(config) if config.enabled => config,
            _ => return Ok(InboundOutcome::Inactive),
        };
        let remote = self.remote_client(&config)?;

        let contact_address = if info.is_group || info.chat.is_group() {
            &info.sender
        } else {
            &info.chat
        };
        let message_type = if info.is_from_me {
            "outgoing"
        } else {
            "incoming"
        };
        let name = if info.push_name.is_empty() {
            contact_address.local_part()
        } else {
            info.push_name.as_str()
        };
        let chat = info.chat.to_string();

        checkpoint(cancel)?;
        let contact_id = self
            .ensure_contact(&remote, &config, contact_address, name, cancel)
            .await?;
        let inbox_id = config.inbox_id.unwrap_or_default();

        checkpoint(cancel)?;
        let source_id = conversation_source_id(&chat);
        let pending = config.conversations_pending;
        let conversation_id = self
            .conversations
            .ensure_with(tenant, &chat, contact_id, inbox_id, || async {
                if config.inbox_id.is_none() {
                    return Err(BridgeError::Config("inbox_id not configured".into()));
                }
                checkpoint(cancel)?;
                remote
                    .create_conversation(contact_id, inbox_id, &source_id, pending)
                    .await
            })
            .await?;

        let source_id = message_source_id(&info.id);
        let remote_message_id = match &event.body {
            MessageBody::Media(media) => {
                checkpoint(cancel)?;
                let data = client.download(media).await?;
                debug!(
                    tenant = %tenant,
                    message_id = %info.id,
                    kind = %media.kind,
                    size = data.len(),
                    "media downloaded"
                );
                checkpoint(cancel)?;
                remote
                    .send_attachment(
                        conversation_id,
                        message_type,
                        data,
                        &media.upload_file_name(&info.id),
                        &media.mime_type,
                        media.caption(),
                        &source_id,
                    )
                    .await?
            }
            MessageBody::Text(text) => {
                checkpoint(cancel)?;
                remote
                    .create_message(conversation_id, message_type, text, false, &source_id)
                    .await?
            }
            _ => return Ok(InboundOutcome::Noise),
        };

        let mapping = MessageMapping {
            tenant_id: tenant.clone(),
            message_id: info.id.clone(),
            remote_message_id,
            remote_conversation_id: conversation_id,
        };
        if let Err(e) = self.store.record_message(&mapping).await {
            warn!(tenant = %tenant, message_id = %info.id, error = %e, "failed to record message mapping");
        }

        info!(
            tenant = %tenant,
            chat = %chat,
            message_id = %info.id,
            conversation_id,
            remote_message_id,
            "message bridged"
        );
        Ok(InboundOutcome::Bridged {
            conversation_id,
            message_id: remote_message_id,
        })
    }

    async fn ensure_contact(
        &self,
        remote: &ChatwootClient,
        config: &TenantBridgeConfig,
        address: &ChatAddress,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<i64, BridgeError> {
        let phone = to_e164(address.local_part());
        if let Some(id) = remote.search_contact(&phone).await? {
            return Ok(id);
        }

        if let Some(alternate) = brazil_alternate(&phone).filter(|_| config.merge_national_contacts) {
            checkpoint(cancel)?;
            if let Some(id) = remote.search_contact(&alternate).await? {
                debug!(phone = %phone, alternate = %alternate, contact_id = id, "matched national alternate");
                return Ok(id);
            }
        }

        let inbox_id = config
            .inbox_id
            .ok_or_else(|| BridgeError::Config("inbox_id not configured".into()))?;
        checkpoint(cancel)?;
        let identifier = address.to_string();
        remote
            .create_contact(NewContact {
                inbox_id,
                name,
                phone: Some(&phone),
                identifier: Some(&identifier),
                avatar_url: None,
            })
            .await
    }

    /// Sends an agent reply from the helpdesk to WhatsApp.
    ///
    /// Returns only after WhatsApp accepted every message, so a send failure
    /// reaches the helpdesk as a non-2xx response.
    pub async fn handle_outgoing_webhook(
        &self,
        token: &str,
        body: &[u8],
    ) -> Result<WebhookAck, BridgeError> {
        let tenant = self.authenticate(token).await?;

        let payload: WebhookPayload = serde_json::from_slice(body)
            .map_err(|e| BridgeError::Validation(format!("invalid payload: {e}")))?;
        debug!(
            tenant = %tenant.id,
            event = %payload.event,
            message_type = %payload.message_type,
            conversation_id = payload.conversation.id,
            "helpdesk webhook received"
        );

        if let Some(reason) = payload.ignore_reason() {
            debug!(tenant = %tenant.id, reason, "ignoring helpdesk webhook");
            return Ok(WebhookAck::Ignored(reason));
        }

        let destination = payload
            .destination()
            .ok_or_else(|| BridgeError::Validation("no destination".into()))?;
        let recipient = ChatAddress::user(destination);

        if payload.conversation.id > 0 {
            let mapping = ConversationMapping {
                tenant_id: tenant.id.clone(),
                chat_address: recipient.to_string(),
                conversation_id: payload.conversation.id,
                contact_id: payload.conversation.meta.sender.id,
                inbox_id: payload.inbox.id,
            };
            if let Err(e) = self.conversations.remember(&mapping).await {
                warn!(tenant = %tenant.id, chat = %recipient, error = %e, "failed to store conversation from webhook");
            }
        }

        let client = self
            .directory
            .client_for(&tenant.id)
            .ok_or_else(|| BridgeError::Unavailable("whatsapp client not ready".into()))?;
        if !client.is_logged_in() {
            return Err(BridgeError::Unavailable("whatsapp not logged in".into()));
        }
        if !client.is_connected() {
            return Err(BridgeError::Unavailable("whatsapp disconnected".into()));
        }

        let config = self.store.get_bridge_config(&tenant.id).await?;
        let mut message_ids = Vec::new();

        let attachments = payload.attachments();
        if !attachments.is_empty() {
            for attachment in attachments {
                let caption = if payload.content().is_empty() {
                    attachment.data_url.clone()
                } else {
                    payload.content().to_string()
                };
                let id = client
                    .send_message(
                        &recipient,
                        OutgoingContent::Media {
                            url: attachment.data_url.clone(),
                            file_type: attachment.file_type.clone(),
                            caption,
                        },
                    )
                    .await?;
                self.dedup.mark(DedupGuard::key(&tenant.id, &id));
                message_ids.push(id);
            }
        } else if !payload.content().is_empty() {
            let text = sign_text(config.as_ref(), payload.agent_name(), payload.content());
            let id = client
                .send_message(&recipient, OutgoingContent::Text { text })
                .await?;
            self.dedup.mark(DedupGuard::key(&tenant.id, &id));
            message_ids.push(id);
        }

        info!(
            tenant = %tenant.id,
            recipient = %recipient,
            remote_message_id = payload.id,
            sent = message_ids.len(),
            "helpdesk reply sent to whatsapp"
        );
        Ok(WebhookAck::Delivered { message_ids })
    }
}

impl Drop for BridgeService {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

fn checkpoint(cancel: &CancellationToken) -> Result<(), BridgeError> {
    if cancel.is_cancelled() {
        Err(BridgeError::Cancelled)
    } else {
        Ok(())
    }
}

/// Prefixes `*agent*<delimiter>` when the tenant signs messages. A literal
/// `\n` delimiter stands for a newline.
pub fn sign_text(config: Option<&TenantBridgeConfig>, agent: Option<&str>, text: &str) -> String {
    match (config, agent) {
        (Some(config), Some(agent)) if config.sign_messages => {
            let delimiter = config.sign_delimiter.replace("\\n", "\n");
            format!("*{agent}*{delimiter}{text}")
        }
        _ => text.to_string(),
    }
}
