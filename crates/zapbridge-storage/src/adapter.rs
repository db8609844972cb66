// SPDX-FileCopyrightText: 2026 Zapbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of [`BridgeStore`] plus tenant and queue administration.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use zapbridge_config::model::StorageConfig;
use zapbridge_core::{
    BridgeError, BridgeStore, ConversationMapping, MessageMapping, Tenant, TenantBridgeConfig,
    TenantId,
};

use crate::database::Database;
use crate::models::{NewTenant, QueueEntry};
use crate::queries;

/// SQLite-backed storage.
///
/// The database is opened lazily by [`SqliteStorage::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage; nothing is opened until `initialize`.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Opens the database and runs migrations. Fails if called twice.
    pub async fn initialize(&self) -> Result<(), BridgeError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db
            .set(db)
            .map_err(|_| BridgeError::storage("storage already initialized"))?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    /// Checkpoints the WAL. The connection closes when the storage is dropped.
    pub async fn close(&self) -> Result<(), BridgeError> {
        self.db()?
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    /// Liveness probe for the health endpoint.
    pub async fn health_check(&self) -> Result<(), BridgeError> {
        self.db()?
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)
    }

    fn db(&self) -> Result<&Database, BridgeError> {
        self.db
            .get()
            .ok_or_else(|| BridgeError::storage("storage not initialized -- call initialize() first"))
    }

    // --- Tenant registry ---

    pub async fn create_tenant(&self, tenant: &NewTenant) -> Result<(), BridgeError> {
        queries::tenants::insert_tenant(self.db()?, tenant).await
    }

    pub async fn list_tenants(&self) -> Result<Vec<Tenant>, BridgeError> {
        queries::tenants::list_tenants(self.db()?).await
    }

    pub async fn set_tenant_hmac_key(
        &self,
        id: &TenantId,
        sealed: Option<Vec<u8>>,
    ) -> Result<bool, BridgeError> {
        queries::tenants::set_hmac_key(self.db()?, id, sealed).await
    }

    pub async fn delete_tenant(&self, id: &TenantId) -> Result<bool, BridgeError> {
        queries::tenants::delete_tenant(self.db()?, id).await
    }

    // --- Queue ---

    pub async fn enqueue(&self, queue_name: &str, payload: &str) -> Result<i64, BridgeError> {
        queries::queue::enqueue(self.db()?, queue_name, payload).await
    }

    pub async fn dequeue(&self, queue_name: &str) -> Result<Option<QueueEntry>, BridgeError> {
        queries::queue::dequeue(self.db()?, queue_name).await
    }

    pub async fn ack(&self, id: i64) -> Result<(), BridgeError> {
        queries::queue::ack(self.db()?, id).await
    }

    pub async fn fail(&self, id: i64) -> Result<(), BridgeError> {
        queries::queue::fail(self.db()?, id).await
    }

    pub async fn list_queue(
        &self,
        queue_name: &str,
        status: Option<&str>,
        limit: i64,
    ) -> Result<Vec<QueueEntry>, BridgeError> {
        queries::queue::list_entries(self.db()?, queue_name, status, limit).await
    }
}

#[async_trait]
impl BridgeStore for SqliteStorage {
    async fn tenant_by_token(&self, token: &str) -> Result<Option<Tenant>, BridgeError> {
        queries::tenants::get_tenant_by_token(self.db()?, token).await
    }

    async fn get_tenant(&self, id: &TenantId) -> Result<Option<Tenant>, BridgeError> {
        queries::tenants::get_tenant(self.db()?, id).await
    }

    async fn get_bridge_config(
        &self,
        tenant: &TenantId,
    ) -> Result<Option<TenantBridgeConfig>, BridgeError> {
        queries::bridge_configs::get_config(self.db()?, tenant).await
    }

    async fn save_bridge_config(&self, config: &TenantBridgeConfig) -> Result<(), BridgeError> {
        queries::bridge_configs::upsert_config(self.db()?, config).await
    }

    async fn delete_bridge_config(&self, tenant: &TenantId) -> Result<bool, BridgeError> {
        queries::bridge_configs::delete_config(self.db()?, tenant).await
    }

    async fn get_conversation(
        &self,
        tenant: &TenantId,
        chat_address: &str,
    ) -> Result<Option<ConversationMapping>, BridgeError> {
        queries::conversations::get_mapping(self.db()?, tenant, chat_address).await
    }

    async fn upsert_conversation(&self, mapping: &ConversationMapping) -> Result<(), BridgeError> {
        queries::conversations::upsert_mapping(self.db()?, mapping).await
    }

    async fn record_message(&self, mapping: &MessageMapping) -> Result<(), BridgeError> {
        queries::messages::insert_mapping(self.db()?, mapping).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn make_config(path: &str) -> StorageConfig {
        StorageConfig {
            database_path: path.to_string(),
            wal_mode: true,
        }
    }

    #[tokio::test]
    async fn initialize_opens_database_at_configured_path() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("init.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));
        storage.initialize().await.unwrap();
        assert!(db_path.exists());
        storage.health_check().await.unwrap();
    }

    #[tokio::test]
    async fn initialize_twice_returns_error() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("double.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));
        storage.initialize().await.unwrap();
        assert!(storage.initialize().await.is_err());
    }

    #[tokio::test]
    async fn calls_before_initialize_fail() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("none.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));
        assert!(storage.health_check().await.is_err());
        assert!(storage.tenant_by_token("x").await.is_err());
    }

    #[tokio::test]
    async fn bridge_store_roundtrip_through_trait_object() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("store.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));
        storage.initialize().await.unwrap();
        storage
            .create_tenant(&NewTenant {
                id: "t1".into(),
                name: "Tenant".into(),
                token: "tok".into(),
                webhook_url: None,
                hmac_key: None,
            })
            .await
            .unwrap();

        let store: &dyn BridgeStore = &storage;
        let tenant = store.tenant_by_token("tok").await.unwrap().unwrap();
        assert_eq!(tenant.id, TenantId::from("t1"));

        let mapping = ConversationMapping {
            tenant_id: tenant.id.clone(),
            chat_address: "5511@s.whatsapp.net".into(),
            conversation_id: 1,
            contact_id: 2,
            inbox_id: 3,
        };
        store.upsert_conversation(&mapping).await.unwrap();
        assert_eq!(
            store
                .get_conversation(&tenant.id, "5511@s.whatsapp.net")
                .await
                .unwrap(),
            Some(mapping)
        );

        store
            .record_message(&MessageMapping {
                tenant_id: tenant.id.clone(),
                message_id: "m1".into(),
                remote_message_id: 10,
                remote_conversation_id: 1,
            })
            .await
            .unwrap();

        storage.close().await.unwrap();
    }

    #[tokio::test]
    async fn dead_letters_can_be_drained() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("dlq.db");
        let storage = SqliteStorage::new(make_config(db_path.to_str().unwrap()));
        storage.initialize().await.unwrap();

        let ok = storage.enqueue("webhook_errors", r#"{"url":"a"}"#).await.unwrap();
        let bad = storage.enqueue("webhook_errors", r#"{"url":"b"}"#).await.unwrap();

        let first = storage.dequeue("webhook_errors").await.unwrap().unwrap();
        assert_eq!(first.id, ok);
        storage.ack(first.id).await.unwrap();

        let second = storage.dequeue("webhook_errors").await.unwrap().unwrap();
        assert_eq!(second.id, bad);
        storage.fail(second.id).await.unwrap();

        let pending = storage
            .list_queue("webhook_errors", Some("pending"), 10)
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].attempts, 1);
        let completed = storage
            .list_queue("webhook_errors", Some("completed"), 10)
            .await
            .unwrap();
        assert_eq!(completed[0].id, ok);

        storage.close().await.unwrap();
    }
}
