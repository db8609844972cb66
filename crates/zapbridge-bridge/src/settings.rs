// SPDX-FileCopyrightText: 2026 Zapbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tenant-facing bridge configuration: read, save (with optional inbox
//! provisioning), and delete.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use zapbridge_chatwoot::{ChatwootClient, NewContact};
use zapbridge_core::{BridgeError, Tenant, TenantBridgeConfig, TenantId};

use crate::service::BridgeService;

/// Identifier of the bot contact created alongside a provisioned inbox.
pub const BOT_CONTACT_IDENTIFIER: &str = "123456";

const DEFAULT_SIGN_DELIMITER: &str = "\\n";

/// Body of a configuration save.
#[derive(Clone, Default, Deserialize)]
pub struct BridgeSettingsRequest {
    #[serde(default)]
    pub account_id: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub name_inbox: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub auto_create: bool,
    #[serde(default)]
    pub sign_msg: bool,
    #[serde(default)]
    pub sign_delimiter: String,
    #[serde(default)]
    pub reopen_conversation: bool,
    #[serde(default)]
    pub conversation_pending: bool,
    #[serde(default)]
    pub merge_brazil_contacts: bool,
    #[serde(default)]
    pub organization: String,
    #[serde(default)]
    pub logo: String,
}

/// Externally visible configuration. The API token is always masked.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BridgeSettingsView {
    pub tenant_id: TenantId,
    pub account_id: String,
    pub token: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inbox_id: Option<i64>,
    pub name_inbox: String,
    pub enabled: bool,
    pub auto_create: bool,
    pub sign_msg: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub sign_delimiter: String,
    pub reopen_conversation: bool,
    pub conversation_pending: bool,
    pub merge_brazil_contacts: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub organization: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub logo: String,
    pub webhook_url: String,
    pub created_at: String,
    pub updated_at: String,
}

impl BridgeSettingsView {
    fn new(config: TenantBridgeConfig, webhook_url: String) -> Self {
        Self {
            token: config.masked_token(),
            tenant_id: config.tenant_id,
            account_id: config.account_id,
            url: config.base_url,
            inbox_id: config.inbox_id,
            name_inbox: config.inbox_name,
            enabled: config.enabled,
            auto_create: config.auto_create_inbox,
            sign_msg: config.sign_messages,
            sign_delimiter: config.sign_delimiter,
            reopen_conversation: config.reopen_conversations,
            conversation_pending: config.conversations_pending,
            merge_brazil_contacts: config.merge_national_contacts,
            organization: config.organization,
            logo: config.logo,
            webhook_url,
            created_at: config.created_at,
            updated_at: config.updated_at,
        }
    }
}

/// URL the helpdesk must call for a tenant's agent replies.
pub fn webhook_url(base_url: &str, tenant_token: &str) -> String {
    format!(
        "{}/chatwoot/webhook/{tenant_token}",
        base_url.trim_end_matches('/')
    )
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl BridgeService {
    pub async fn get_settings(
        &self,
        tenant: &Tenant,
        base_url: &str,
    ) -> Result<Option<BridgeSettingsView>, BridgeError> {
        Ok(self
            .store
            .get_bridge_config(&tenant.id)
            .await?
            .map(|config| BridgeSettingsView::new(config, webhook_url(base_url, &tenant.token))))
    }

    /// Creates or updates the tenant's configuration in place, provisioning
    /// an inbox first when asked to and none is stored yet. Returns the
    /// inbox id in effect.
    pub async fn save_settings(
        &self,
        tenant: &Tenant,
        request: BridgeSettingsRequest,
        base_url: &str,
    ) -> Result<Option<i64>, BridgeError> {
        if request.account_id.is_empty() || request.token.is_empty() || request.url.is_empty() {
            return Err(BridgeError::Validation(
                "account_id, token, and url are required".into(),
            ));
        }

        let existing = self.store.get_bridge_config(&tenant.id).await?;
        let timestamp = now();
        let mut config = TenantBridgeConfig {
            tenant_id: tenant.id.clone(),
            account_id: request.account_id,
            api_token: request.token,
            base_url: request.url,
            inbox_id: existing.as_ref().and_then(|c| c.inbox_id),
            inbox_name: if request.name_inbox.is_empty() {
                self.settings.default_inbox_name.clone()
            } else {
                request.name_inbox
            },
            enabled: request.enabled,
            auto_create_inbox: request.auto_create,
            sign_messages: request.sign_msg,
            sign_delimiter: if request.sign_delimiter.is_empty() {
                DEFAULT_SIGN_DELIMITER.to_string()
            } else {
                request.sign_delimiter
            },
            reopen_conversations: request.reopen_conversation,
            conversations_pending: request.conversation_pending,
            merge_national_contacts: request.merge_brazil_contacts,
            organization: request.organization,
            logo: request.logo,
            created_at: existing
                .as_ref()
                .map(|c| c.created_at.clone())
                .unwrap_or_else(|| timestamp.clone()),
            updated_at: timestamp,
        };

        info!(
            tenant = %tenant.id,
            account_id = %config.account_id,
            url = %config.base_url,
            auto_create = config.auto_create_inbox,
            "saving bridge configuration"
        );

        if config.auto_create_inbox && config.inbox_id.is_none() {
            let inbox_id = self
                .provision_inbox(&config, &webhook_url(base_url, &tenant.token))
                .await?;
            config.inbox_id = Some(inbox_id);
        }

        self.store.save_bridge_config(&config).await?;
        self.forget_client(&tenant.id);
        Ok(config.inbox_id)
    }

    /// Returns whether a configuration existed.
    pub async fn delete_settings(&self, tenant: &TenantId) -> Result<bool, BridgeError> {
        let deleted = self.store.delete_bridge_config(tenant).await?;
        self.forget_client(tenant);
        if deleted {
            info!(tenant = %tenant, "bridge configuration deleted");
        }
        Ok(deleted)
    }

    /// Creates an API inbox pointing at `webhook_url`, then the bot contact.
    /// A failure to create the bot contact is only logged.
    pub async fn provision_inbox(
        &self,
        config: &TenantBridgeConfig,
        webhook_url: &str,
    ) -> Result<i64, BridgeError> {
        let remote: ChatwootClient = self.remote_client(config)?;
        let inbox_id = remote.create_inbox(&config.inbox_name, webhook_url).await?;

        let organization = if config.organization.is_empty() {
            self.settings.default_organization.as_str()
        } else {
            config.organization.as_str()
        };
        let logo = if config.logo.is_empty() {
            self.settings.default_logo.as_str()
        } else {
            config.logo.as_str()
        };

        match remote
            .create_contact(NewContact {
                inbox_id,
                name: organization,
                phone: None,
                identifier: Some(BOT_CONTACT_IDENTIFIER),
                avatar_url: Some(logo),
            })
            .await
        {
            Ok(contact_id) => info!(tenant = %config.tenant_id, contact_id, "bot contact created"),
            Err(e) => {
                warn!(tenant = %config.tenant_id, error = %e, "failed to create bot contact (may already exist)")
            }
        }

        Ok(inbox_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn webhook_url_trims_trailing_slash() {
        assert_eq!(
            webhook_url("https://bridge.example/", "tok"),
            "https://bridge.example/chatwoot/webhook/tok"
        );
    }

    #[test]
    fn request_defaults_missing_fields() {
        let req: BridgeSettingsRequest =
            serde_json::from_str(r#"{"account_id":"1","token":"t","url":"http://cw"}"#).unwrap();
        assert!(!req.enabled);
        assert!(req.name_inbox.is_empty());
        assert!(req.sign_delimiter.is_empty());
    }
}
