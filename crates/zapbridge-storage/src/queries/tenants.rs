// SPDX-FileCopyrightText: 2026 Zapbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tenant registry.

use rusqlite::{OptionalExtension, Row, params};
use zapbridge_core::{BridgeError, Tenant, TenantId};

use crate::database::Database;
use crate::models::NewTenant;

const TENANT_COLUMNS: &str = "id, name, token, webhook_url, hmac_key, created_at";

fn row_to_tenant(row: &Row<'_>) -> Result<Tenant, rusqlite::Error> {
    Ok(Tenant {
        id: TenantId(row.get(0)?),
        name: row.get(1)?,
        token: row.get(2)?,
        webhook_url: row.get(3)?,
        hmac_key: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// Registers a tenant. Fails if the id or token is already taken.
pub async fn insert_tenant(db: &Database, tenant: &NewTenant) -> Result<(), BridgeError> {
    let tenant = tenant.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO tenants (id, name, token, webhook_url, hmac_key)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    tenant.id,
                    tenant.name,
                    tenant.token,
                    tenant.webhook_url,
                    tenant.hmac_key
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn get_tenant(db: &Database, id: &TenantId) -> Result<Option<Tenant>, BridgeError> {
    let id = id.0.clone();
    db.connection()
        .call(move |conn| -> Result<Option<Tenant>, rusqlite::Error> {
            conn.query_row(
                &format!("SELECT {TENANT_COLUMNS} FROM tenants WHERE id = ?1"),
                params![id],
                row_to_tenant,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn get_tenant_by_token(db: &Database, token: &str) -> Result<Option<Tenant>, BridgeError> {
    let token = token.to_string();
    db.connection()
        .call(move |conn| -> Result<Option<Tenant>, rusqlite::Error> {
            conn.query_row(
                &format!("SELECT {TENANT_COLUMNS} FROM tenants WHERE token = ?1"),
                params![token],
                row_to_tenant,
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn list_tenants(db: &Database) -> Result<Vec<Tenant>, BridgeError> {
    db.connection()
        .call(|conn| -> Result<Vec<Tenant>, rusqlite::Error> {
            let mut stmt =
                conn.prepare(&format!("SELECT {TENANT_COLUMNS} FROM tenants ORDER BY id"))?;
            let rows = stmt.query_map([], row_to_tenant)?;
            rows.collect()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Replaces the sealed HMAC key. Returns false when the tenant does not exist.
pub async fn set_hmac_key(
    db: &Database,
    id: &TenantId,
    sealed: Option<Vec<u8>>,
) -> Result<bool, BridgeError> {
    let id = id.0.clone();
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            let changed = conn.execute(
                "UPDATE tenants SET hmac_key = ?1 WHERE id = ?2",
                params![sealed, id],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Deletes a tenant; bridge config and mappings cascade.
pub async fn delete_tenant(db: &Database, id: &TenantId) -> Result<bool, BridgeError> {
    let id = id.0.clone();
    db.connection()
        .call(move |conn| -> Result<bool, rusqlite::Error> {
            Ok(conn.execute("DELETE FROM tenants WHERE id = ?1", params![id])? > 0)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::setup_db;

    fn acme() -> NewTenant {
        NewTenant {
            id: "acme".into(),
            name: "Acme".into(),
            token: "tok-acme".into(),
            webhook_url: Some("https://hooks.acme.test/wa".into()),
            hmac_key: Some(vec![1, 2, 3]),
        }
    }

    #[tokio::test]
    async fn insert_and_lookup_by_id_and_token() {
        let (db, _dir) = setup_db().await;
        insert_tenant(&db, &acme()).await.unwrap();

        let by_id = get_tenant(&db, &"acme".into()).await.unwrap().unwrap();
        assert_eq!(by_id.token, "tok-acme");
        assert_eq!(by_id.hmac_key, Some(vec![1, 2, 3]));
        assert!(!by_id.created_at.is_empty());

        let by_token = get_tenant_by_token(&db, "tok-acme").await.unwrap().unwrap();
        assert_eq!(by_token.id, TenantId::from("acme"));

        assert!(get_tenant_by_token(&db, "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_token_is_rejected() {
        let (db, _dir) = setup_db().await;
        insert_tenant(&db, &acme()).await.unwrap();
        let mut other = acme();
        other.id = "other".into();
        assert!(insert_tenant(&db, &other).await.is_err());
    }

    #[tokio::test]
    async fn rotate_and_clear_hmac_key() {
        let (db, _dir) = setup_db().await;
        insert_tenant(&db, &acme()).await.unwrap();

        assert!(set_hmac_key(&db, &"acme".into(), Some(vec![9])).await.unwrap());
        let tenant = get_tenant(&db, &"acme".into()).await.unwrap().unwrap();
        assert_eq!(tenant.hmac_key, Some(vec![9]));

        assert!(set_hmac_key(&db, &"acme".into(), None).await.unwrap());
        let tenant = get_tenant(&db, &"acme".into()).await.unwrap().unwrap();
        assert!(tenant.hmac_key.is_none());

        assert!(!set_hmac_key(&db, &"ghost".into(), None).await.unwrap());
    }

    #[tokio::test]
    async fn list_and_delete() {
        let (db, _dir) = setup_db().await;
        insert_tenant(&db, &acme()).await.unwrap();
        assert_eq!(list_tenants(&db).await.unwrap().len(), 1);
        assert!(delete_tenant(&db, &"acme".into()).await.unwrap());
        assert!(list_tenants(&db).await.unwrap().is_empty());
    }
}
