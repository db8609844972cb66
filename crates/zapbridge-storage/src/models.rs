// SPDX-FileCopyrightText: 2026 Zapbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage-only row types. Shared domain types live in `zapbridge-core`.

use serde::{Deserialize, Serialize};

/// A row of the durable `queue` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub id: i64,
    pub queue_name: String,
    pub payload: String,
    /// One of `pending`, `processing`, `completed`, `failed`.
    pub status: String,
    pub attempts: i32,
    pub max_attempts: i32,
    pub created_at: String,
    pub updated_at: String,
    pub locked_until: Option<String>,
}

/// Fields required to register a tenant.
#[derive(Debug, Clone)]
pub struct NewTenant {
    pub id: String,
    pub name: String,
    pub token: String,
    pub webhook_url: Option<String>,
    /// Already sealed by the credential vault.
    pub hmac_key: Option<Vec<u8>>,
}
