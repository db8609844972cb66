// SPDX-FileCopyrightText: 2026 Zapbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistent tier of the conversation cache.

use rusqlite::{OptionalExtension, params};
use zapbridge_core::{BridgeError, ConversationMapping, TenantId};

use crate::database::Database;

pub async fn get_mapping(
    db: &Database,
    tenant: &TenantId,
    chat_address: &str,
) -> Result<Option<ConversationMapping>, BridgeError> {
    let tenant = tenant.0.clone();
    let chat_address = chat_address.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<ConversationMapping>, rusqlite::Error> {
            conn.query_row(
                "SELECT tenant_id, chat_address, conversation_id, contact_id, inbox_id
                 FROM conversation_mappings WHERE tenant_id = ?1 AND chat_address = ?2",
                params![tenant, chat_address],
                |row| {
                    Ok(ConversationMapping {
                        tenant_id: TenantId(row.get(0)?),
                        chat_address: row.get(1)?,
                        conversation_id: row.get(2)?,
                        contact_id: row.get(3)?,
                        inbox_id: row.get(4)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Inserts or refreshes the mapping for (tenant, chat address).
pub async fn upsert_mapping(db: &Database, mapping: &ConversationMapping) -> Result<(), BridgeError> {
    let m = mapping.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO conversation_mappings
                    (tenant_id, chat_address, conversation_id, contact_id, inbox_id)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT (tenant_id, chat_address) DO UPDATE SET
                    conversation_id = excluded.conversation_id,
                    contact_id = excluded.contact_id,
                    inbox_id = excluded.inbox_id,
                    updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![
                    m.tenant_id.0,
                    m.chat_address,
                    m.conversation_id,
                    m.contact_id,
                    m.inbox_id
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}
