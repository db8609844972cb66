// SPDX-FileCopyrightText: 2026 Zapbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules, one per table.

pub mod bridge_configs;
pub mod conversations;
pub mod messages;
pub mod queue;
pub mod tenants;

#[cfg(test)]
pub(crate) mod test_support {
    use tempfile::{TempDir, tempdir};

    use crate::database::Database;
    use crate::models::NewTenant;

    pub(crate) async fn setup_db() -> (Database, TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    pub(crate) async fn setup_with_tenant(id: &str) -> (Database, TempDir) {
        let (db, dir) = setup_db().await;
        super::tenants::insert_tenant(
            &db,
            &NewTenant {
                id: id.to_string(),
                name: format!("{id} name"),
                token: format!("{id}-token"),
                webhook_url: None,
                hmac_key: None,
            },
        )
        .await
        .unwrap();
        (db, dir)
    }
}
