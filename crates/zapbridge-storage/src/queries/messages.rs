// SPDX-FileCopyrightText: 2026 Zapbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp message id to remote message id cross-reference.

use rusqlite::{OptionalExtension, params};
use zapbridge_core::{BridgeError, MessageMapping, TenantId};

use crate::database::Database;

/// Records a mapping. A second record for the same message id is ignored.
pub async fn insert_mapping(db: &Database, mapping: &MessageMapping) -> Result<(), BridgeError> {
    let m = mapping.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT OR IGNORE INTO message_mappings
                    (tenant_id, message_id, remote_message_id, remote_conversation_id)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    m.tenant_id.0,
                    m.message_id,
                    m.remote_message_id,
                    m.remote_conversation_id
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn get_mapping(
    db: &Database,
    tenant: &TenantId,
    message_id: &str,
) -> Result<Option<MessageMapping>, BridgeError> {
    let tenant = tenant.0.clone();
    let message_id = message_id.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<MessageMapping>, rusqlite::Error> {
            conn.query_row(
                "SELECT tenant_id, message_id, remote_message_id, remote_conversation_id
                 FROM message_mappings WHERE tenant_id = ?1 AND message_id = ?2",
                params![tenant, message_id],
                |row| {
                    Ok(MessageMapping {
                        tenant_id: TenantId(row.get(0)?),
                        message_id: row.get(1)?,
                        remote_message_id: row.get(2)?,
                        remote_conversation_id: row.get(3)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}
