// SPDX-FileCopyrightText: 2026 Zapbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-tenant helpdesk bridge configuration.

use rusqlite::{OptionalExtension, params};
use zapbridge_core::{BridgeError, TenantBridgeConfig, TenantId};

use crate::database::Database;

pub async fn get_config(
    db: &Database,
    tenant: &TenantId,
) -> Result<Option<TenantBridgeConfig>, BridgeError> {
    let tenant = tenant.0.clone();
    db.connection()
        .call(move |conn| -> Result<Option<TenantBridgeConfig>, rusqlite::Error> {
            conn.query_row(
                "SELECT tenant_id, account_id, api_token, base_url, inbox_id, inbox_name,
                        enabled, auto_create_inbox, sign_messages, sign_delimiter,
                        reopen_conversations, conversations_pending, merge_national_contacts,
                        organization, logo, created_at, updated_at
                 FROM bridge_configs WHERE tenant_id = ?1",
                params![tenant],
                |row| {
                    Ok(TenantBridgeConfig {
                        tenant_id: TenantId(row.get(0)?),
                        account_id: row.get(1)?,
                        api_token: row.get(2)?,
                        base_url: row.get(3)?,
                        inbox_id: row.get(4)?,
                        inbox_name: row.get(5)?,
                        enabled: row.get(6)?,
                        auto_create_inbox: row.get(7)?,
                        sign_messages: row.get(8)?,
                        sign_delimiter: row.get(9)?,
                        reopen_conversations: row.get(10)?,
                        conversations_pending: row.get(11)?,
                        merge_national_contacts: row.get(12)?,
                        organization: row.get(13)?,
                        logo: row.get(14)?,
                        created_at: row.get(15)?,
                        updated_at: row.get(16)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Inserts or updates in place. `created_at` is preserved on update.
pub async fn upsert_config(db: &Database, config: &TenantBridgeConfig) -> Result<(), BridgeError> {
    let c = config.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO bridge_configs (
                    tenant_id, account_id, api_token, base_url, inbox_id, inbox_name,
                    enabled, auto_create_inbox, sign_messages, sign_delimiter,
                    reopen_conversations, conversations_pending, merge_national_contacts,
                    organization, logo)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
                 ON CONFLICT (tenant_id) DO UPDATE SET
                    account_id = excluded.account_id,
                    api_token = excluded.api_token,
                    base_url = excluded.base_url,
                    inbox_id = excluded.inbox_id,
                    inbox_name = excluded.inbox_name,
                    enabled = excluded.enabled,
                    auto_create_inbox = excluded.auto_create_inbox,
                    sign_messages = excluded.sign_messages,
                    sign_delimiter = excluded.sign_delimiter,
                    reopen_conversations = excluded.reopen_conversations,
                    conversations_pending = excluded.conversations_pending,
                    merge_national_contacts = excluded.merge_national_contacts,
                    organization = excluded.organization,
                    logo = excluded.logo,
                    updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![
                    c.tenant_id.0,
                    c.account_id,
                    c.api_token,
                    c.base_url,
                    c.inbox_id,
                    c.inbox_name,
                    c.enabled,
                    c.auto_create_inbox,
                    c.sign_messages,
                    c.sign_delimiter,
                    c.reopen_conversations,
                    c.conversations_pending,
                    c.merge_national_contacts,
                    c.organization,
                    c.logo,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn delete_config(db: &Database, tenant: &TenantId) -> Result<bool, BridgeError> {
    let tenant = tenant.0.clone();
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            Ok(conn.execute(
                "DELETE FROM bridge_configs WHERE tenant_id = ?1",
                params![tenant],
            )? > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::setup_with_tenant;

    fn sample(tenant: &str) -> TenantBridgeConfig {
        TenantBridgeConfig {
            tenant_id: tenant.into(),
            account_id: "1".into(),
            api_token: "cw-token-abcdef".into(),
            base_url: "https://chat.example.com".into(),
            inbox_id: None,
            inbox_name: "WhatsApp Inbox".into(),
            enabled: true,
            auto_create_inbox: true,
            sign_messages: false,
            sign_delimiter: "\\n".into(),
            reopen_conversations: true,
            conversations_pending: false,
            merge_national_contacts: false,
            organization: String::new(),
            logo: String::new(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[tokio::test]
    async fn upsert_inserts_then_updates_in_place() {
        let (db, _dir) = setup_with_tenant("t1").await;
        upsert_config(&db, &sample("t1")).await.unwrap();

        let stored = get_config(&db, &"t1".into()).await.unwrap().unwrap();
        assert_eq!(stored.account_id, "1");
        assert!(stored.inbox_id.is_none());
        assert!(!stored.created_at.is_empty());

        let mut updated = stored.clone();
        updated.inbox_id = Some(42);
        updated.sign_messages = true;
        upsert_config(&db, &updated).await.unwrap();

        let stored2 = get_config(&db, &"t1".into()).await.unwrap().unwrap();
        assert_eq!(stored2.inbox_id, Some(42));
        assert!(stored2.sign_messages);
        assert_eq!(stored2.created_at, stored.created_at);
    }

    #[tokio::test]
    async fn missing_config_is_none() {
        let (db, _dir) = setup_with_tenant("t1").await;
        assert!(get_config(&db, &"t1".into()).await.unwrap().is_none());
        assert!(!delete_config(&db, &"t1".into()).await.unwrap());
    }

    #[tokio::test]
    async fn config_requires_existing_tenant() {
        let (db, _dir) = setup_with_tenant("t1").await;
        assert!(upsert_config(&db, &sample("ghost")).await.is_err());
    }

    #[tokio::test]
    async fn deleting_tenant_cascades() {
        let (db, _dir) = setup_with_tenant("t1").await;
        upsert_config(&db, &sample("t1")).await.unwrap();
        crate::queries::tenants::delete_tenant(&db, &"t1".into())
            .await
            .unwrap();
        assert!(get_config(&db, &"t1".into()).await.unwrap().is_none());
    }
}
