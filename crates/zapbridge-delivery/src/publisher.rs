// SPDX-FileCopyrightText: 2026 Zapbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `QueuePublisher` implementations.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use zapbridge_core::{BridgeError, QueuePublisher};
use zapbridge_storage::SqliteStorage;

/// Publishes onto the SQLite `queue` table.
pub struct SqliteQueuePublisher {
    storage: Arc<SqliteStorage>,
}

impl SqliteQueuePublisher {
    pub fn new(storage: Arc<SqliteStorage>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl QueuePublisher for SqliteQueuePublisher {
    async fn publish(&self, queue: &str, payload: Vec<u8>) -> Result<(), BridgeError> {
        let payload = String::from_utf8(payload)
            .map_err(|e| BridgeError::Validation(format!("queue payload is not UTF-8: {e}")))?;
        let id = self.storage.enqueue(queue, &payload).await?;
        debug!(queue, id, "published to queue");
        Ok(())
    }
}

/// Used when no queue is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopQueuePublisher;

#[async_trait]
impl QueuePublisher for NoopQueuePublisher {
    fn is_enabled(&self) -> bool {
        false
    }

    async fn publish(&self, _queue: &str, _payload: Vec<u8>) -> Result<(), BridgeError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zapbridge_config::model::StorageConfig;

    #[tokio::test]
    async fn sqlite_publisher_enqueues_pending_entries() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(SqliteStorage::new(StorageConfig {
            database_path: dir.path().join("q.db").to_string_lossy().into_owned(),
            wal_mode: true,
        }));
        storage.initialize().await.unwrap();

        let publisher = SqliteQueuePublisher::new(storage.clone());
        assert!(publisher.is_enabled());
        publisher
            .publish("webhook_errors", br#"{"url":"x"}"#.to_vec())
            .await
            .unwrap();

        let entries = storage
            .list_queue("webhook_errors", Some("pending"), 10)
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].payload, r#"{"url":"x"}"#);
    }

    #[tokio::test]
    async fn noop_publisher_is_disabled() {
        let publisher = NoopQueuePublisher;
        assert!(!publisher.is_enabled());
        publisher.publish("q", vec![1]).await.unwrap();
    }
}
