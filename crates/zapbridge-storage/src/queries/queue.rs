// SPDX-FileCopyrightText: 2026 Zapbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable named queues backing the event stream and dead letters.

use rusqlite::{Row, params};
use zapbridge_core::BridgeError;

use crate::database::Database;
use crate::models::QueueEntry;

const ENTRY_COLUMNS: &str = "id, queue_name, payload, status, attempts, max_attempts,
                             created_at, updated_at, locked_until";

fn row_to_entry(row: &Row<'_>) -> Result<QueueEntry, rusqlite::Error> {
    Ok(QueueEntry {
        id: row.get(0)?,
        queue_name: row.get(1)?,
        payload: row.get(2)?,
        status: row.get(3)?,
        attempts: row.get(4)?,
        max_attempts: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
        locked_until: row.get(8)?,
    })
}

/// Enqueue a new item. Returns the queue entry id.
pub async fn enqueue(db: &Database, queue_name: &str, payload: &str) -> Result<i64, BridgeError> {
    let queue_name = queue_name.to_string();
    let payload = payload.to_string();
    db.connection()
        .call(move |conn| -> Result<i64, rusqlite::Error> {
            conn.execute(
                "INSERT INTO queue (queue_name, payload) VALUES (?1, ?2)",
                params![queue_name, payload],
            )?;
            Ok(conn.last_insert_rowid())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Claims the oldest pending entry of a queue.
///
/// The entry moves to `processing` with a five-minute lock.
pub async fn dequeue(db: &Database, queue_name: &str) -> Result<Option<QueueEntry>, BridgeError> {
    let queue_name = queue_name.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<QueueEntry>, rusqlite::Error> {
            let tx = conn.transaction()?;

            let result = tx.query_row(
                &format!(
                    "SELECT {ENTRY_COLUMNS} FROM queue
                     WHERE queue_name = ?1 AND status = 'pending'
                     ORDER BY id ASC LIMIT 1"
                ),
                params![queue_name],
                row_to_entry,
            );

            match result {
                Ok(entry) => {
                    tx.execute(
                        "UPDATE queue SET status = 'processing',
                         locked_until = strftime('%Y-%m-%dT%H:%M:%fZ', 'now', '+5 minutes'),
                         updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                         WHERE id = ?1",
                        params![entry.id],
                    )?;
                    tx.commit()?;
                    Ok(Some(QueueEntry {
                        status: "processing".to_string(),
                        ..entry
                    }))
                }
                Err(rusqlite::Error::QueryReturnedNoRows) => {
                    tx.commit()?;
                    Ok(None)
                }
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Marks an entry `completed`.
pub async fn ack(db: &Database, id: i64) -> Result<(), BridgeError> {
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "UPDATE queue SET status = 'completed', locked_until = NULL,
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1",
                params![id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Records a failed processing attempt.
///
/// The entry returns to `pending` until `max_attempts` is reached, then
/// becomes `failed`.
pub async fn fail(db: &Database, id: i64) -> Result<(), BridgeError> {
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "UPDATE queue SET
                    attempts = attempts + 1,
                    status = CASE WHEN attempts + 1 >= max_attempts THEN 'failed' ELSE 'pending' END,
                    locked_until = NULL,
                    updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
                 WHERE id = ?1",
                params![id],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Lists the most recent entries of a queue, newest first.
pub async fn list_entries(
    db: &Database,
    queue_name: &str,
    status: Option<&str>,
    limit: i64,
) -> Result<Vec<QueueEntry>, BridgeError> {
    let queue_name = queue_name.to_string();
    let status = status.map(str::to_string);
    db.connection()
        .call(move |conn| -> Result<Vec<QueueEntry>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ENTRY_COLUMNS} FROM queue
                 WHERE queue_name = ?1 AND (?2 IS NULL OR status = ?2)
                 ORDER BY id DESC LIMIT ?3"
            ))?;
            let rows = stmt.query_map(params![queue_name, status, limit], row_to_entry)?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}
