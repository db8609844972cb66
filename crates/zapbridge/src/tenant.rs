// SPDX-FileCopyrightText: 2026 Zapbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `zapbridge tenant` command implementations.

use std::io::IsTerminal;

use colored::Colorize;
use rand::RngCore;
use serde::Serialize;
use zapbridge_config::ZapbridgeConfig;
use zapbridge_core::{BridgeError, Tenant, TenantId};
use zapbridge_storage::{NewTenant, SqliteStorage};
use zapbridge_vault::CredentialVault;

/// Fields of `zapbridge tenant add`.
#[derive(Debug, Clone)]
pub struct TenantArgs {
    pub id: String,
    pub name: String,
    pub token: Option<String>,
    pub webhook_url: Option<String>,
    pub hmac_key: Option<String>,
}

/// One row of `zapbridge tenant list --json`. Secrets only appear masked.
#[derive(Debug, Serialize)]
pub struct TenantSummary {
    pub id: String,
    pub name: String,
    pub webhook_url: Option<String>,
    pub signing: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hmac_preview: Option<String>,
    pub created_at: String,
}

impl TenantSummary {
    /// Builds a row; the HMAC preview needs a vault able to open the key.
    pub fn new(tenant: &Tenant, vault: Option<&CredentialVault>) -> Self {
        let hmac_preview = match (vault, tenant.hmac_key.as_deref()) {
            (Some(vault), Some(sealed)) => vault.preview(sealed).ok(),
            _ => None,
        };
        Self {
            id: tenant.id.to_string(),
            name: tenant.name.clone(),
            webhook_url: tenant.webhook_url.clone(),
            signing: tenant.hmac_key.is_some(),
            hmac_preview,
            created_at: tenant.created_at.clone(),
        }
    }
}

async fn open_storage(config: &ZapbridgeConfig) -> Result<SqliteStorage, BridgeError> {
    let storage = SqliteStorage::new(config.storage.clone());
    storage.initialize().await?;
    Ok(storage)
}

/// 32 hex characters from the OS RNG.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Seals a plaintext signing key; a vault key must be configured.
pub fn seal_hmac_key(config: &ZapbridgeConfig, key: &str) -> Result<Vec<u8>, BridgeError> {
    if key.is_empty() {
        return Err(BridgeError::Validation("HMAC key must not be empty".into()));
    }
    let vault = CredentialVault::from_config(&config.vault)?.ok_or_else(|| {
        BridgeError::Config("vault.encryption_key must be set to store HMAC keys".into())
    })?;
    vault.seal(key.as_bytes())
}

/// Builds the row to insert, generating a token when none was given.
pub fn new_tenant(config: &ZapbridgeConfig, args: TenantArgs) -> Result<NewTenant, BridgeError> {
    if args.id.trim().is_empty() || args.name.trim().is_empty() {
        return Err(BridgeError::Validation("tenant id and name are required".into()));
    }
    let hmac_key = args
        .hmac_key
        .as_deref()
        .map(|key| seal_hmac_key(config, key))
        .transpose()?;

    Ok(NewTenant {
        id: args.id,
        name: args.name,
        token: args
            .token
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(generate_token),
        webhook_url: args.webhook_url.filter(|u| !u.trim().is_empty()),
        hmac_key,
    })
}

pub async fn run_add(config: &ZapbridgeConfig, args: TenantArgs) -> Result<(), BridgeError> {
    let tenant = new_tenant(config, args)?;
    let storage = open_storage(config).await?;
    storage.create_tenant(&tenant).await?;
    storage.close().await?;

    println!("tenant {} created", tenant.id);
    println!("token: {}", tenant.token);
    if tenant.hmac_key.is_some() {
        println!("webhooks will be signed ({})", zapbridge_delivery::SIGNATURE_HEADER);
    }
    Ok(())
}

pub async fn run_rotate_hmac(
    config: &ZapbridgeConfig,
    id: &str,
    key: Option<&str>,
) -> Result<(), BridgeError> {
    let sealed = key.map(|k| seal_hmac_key(config, k)).transpose()?;
    let cleared = sealed.is_none();

    let storage = open_storage(config).await?;
    let updated = storage
        .set_tenant_hmac_key(&TenantId::from(id), sealed)
        .await?;
    storage.close().await?;

    if !updated {
        return Err(BridgeError::Validation(format!("no tenant with id {id}")));
    }
    if cleared {
        println!("tenant {id}: HMAC key cleared, webhooks are unsigned");
    } else {
        println!("tenant {id}: HMAC key rotated");
    }
    Ok(())
}

pub async fn run_list(config: &ZapbridgeConfig, json: bool) -> Result<(), BridgeError> {
    let storage = open_storage(config).await?;
    let tenants = storage.list_tenants().await?;
    storage.close().await?;

    let vault = CredentialVault::from_config(&config.vault)?;
    let summaries: Vec<TenantSummary> = tenants
        .iter()
        .map(|tenant| TenantSummary::new(tenant, vault.as_ref()))
        .collect();
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&summaries).unwrap_or_else(|_| "[]".to_string())
        );
        return Ok(());
    }

    if summaries.is_empty() {
        println!("no tenants");
        return Ok(());
    }
    let use_color = std::io::stdout().is_terminal();
    for t in &summaries {
        let signing = match (&t.hmac_preview, t.signing) {
            (Some(preview), _) => format!("signed ({preview})"),
            (None, true) => "signed".to_string(),
            (None, false) => "unsigned".to_string(),
        };
        let id = if use_color {
            t.id.bold().to_string()
        } else {
            t.id.clone()
        };
        println!(
            "{id}  {}  {}  {signing}",
            t.name,
            t.webhook_url.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

pub async fn run_remove(config: &ZapbridgeConfig, id: &str) -> Result<(), BridgeError> {
    let storage = open_storage(config).await?;
    let deleted = storage.delete_tenant(&TenantId::from(id)).await?;
    storage.close().await?;

    if deleted {
        println!("tenant {id} removed");
        Ok(())
    } else {
        Err(BridgeError::Validation(format!("no tenant with id {id}")))
    }
}
