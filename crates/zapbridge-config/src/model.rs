// SPDX-FileCopyrightText: 2026 Zapbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so typos in config files
//! are rejected at startup.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Top-level zapbridge configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ZapbridgeConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// SQLite storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Credential vault settings.
    #[serde(default)]
    pub vault: VaultConfig,

    /// Outbound webhook delivery settings.
    #[serde(default)]
    pub delivery: DeliveryConfig,

    /// Durable queue (events and dead letters) settings.
    #[serde(default)]
    pub queue: QueueConfig,

    /// Helpdesk bridge settings.
    #[serde(default)]
    pub bridge: BridgeConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Externally reachable base URL used to build per-tenant webhook URLs.
    /// When unset, the base is derived from request headers.
    #[serde(default)]
    pub public_url: Option<String>,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: None,
            log_level: default_log_level(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    #[serde(default = "default_true")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: true,
        }
    }
}

fn default_database_path() -> String {
    dirs::data_local_dir()
        .map(|d| d.join("zapbridge").join("zapbridge.db"))
        .unwrap_or_else(|| "zapbridge.db".into())
        .display()
        .to_string()
}

fn default_true() -> bool {
    true
}

/// Credential vault configuration.
#[derive(Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct VaultConfig {
    /// AES-256 master key: 32 raw bytes or 64 hex characters.
    /// Without it, HMAC keys can be neither stored nor used.
    #[serde(default)]
    pub encryption_key: Option<String>,
}

impl VaultConfig {
    /// Decodes the configured key into 32 bytes.
    ///
    /// Returns `Ok(None)` when no key is configured.
    pub fn key_bytes(&self) -> Result<Option<[u8; 32]>, String> {
        let Some(raw) = self.encryption_key.as_deref() else {
            return Ok(None);
        };
        let bytes = if raw.len() == 64 && raw.chars().all(|c| c.is_ascii_hexdigit()) {
            hex::decode(raw).map_err(|e| format!("invalid hex key: {e}"))?
        } else {
            raw.as_bytes().to_vec()
        };
        let key: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
            format!(
                "vault.encryption_key must be 32 bytes or 64 hex characters, got {} bytes",
                b.len()
            )
        })?;
        Ok(Some(key))
    }
}

impl fmt::Debug for VaultConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaultConfig")
            .field(
                "encryption_key",
                &self.encryption_key.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}

/// Body encoding for outbound event webhooks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookFormat {
    /// `application/x-www-form-urlencoded`.
    #[default]
    Form,
    /// Raw JSON with `userID`/`instanceName` merged in.
    Json,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DeliveryConfig {
    /// When false, each delivery makes exactly one attempt.
    #[serde(default)]
    pub retry_enabled: bool,

    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Base of the exponential backoff between attempts.
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    #[serde(default)]
    pub format: WebhookFormat,

    /// Per-request timeout for webhook targets.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            retry_enabled: false,
            retry_count: default_retry_count(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            format: WebhookFormat::default(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    1000
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QueueConfig {
    /// Publish events and dead letters to the durable queue.
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_events_queue")]
    pub events_queue: String,

    #[serde(default = "default_errors_queue")]
    pub errors_queue: String,

    #[serde(default = "default_publish_timeout_ms")]
    pub publish_timeout_ms: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            events_queue: default_events_queue(),
            errors_queue: default_errors_queue(),
            publish_timeout_ms: default_publish_timeout_ms(),
        }
    }
}

fn default_events_queue() -> String {
    "whatsapp_events".to_string()
}

fn default_errors_queue() -> String {
    "webhook_errors".to_string()
}

fn default_publish_timeout_ms() -> u64 {
    5000
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfig {
    /// How long a processed message id suppresses reprocessing.
    #[serde(default = "default_dedup_window_secs")]
    pub dedup_window_secs: u64,

    #[serde(default = "default_dedup_sweep_interval_secs")]
    pub dedup_sweep_interval_secs: u64,

    /// Per-request timeout for the helpdesk API.
    #[serde(default = "default_remote_timeout_secs")]
    pub remote_timeout_secs: u64,

    #[serde(default = "default_inbox_name")]
    pub default_inbox_name: String,

    /// Organization name given to the auto-provisioned bot contact.
    #[serde(default = "default_organization")]
    pub default_organization: String,

    /// Avatar URL given to the auto-provisioned bot contact.
    #[serde(default = "default_logo")]
    pub default_logo: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            dedup_window_secs: default_dedup_window_secs(),
            dedup_sweep_interval_secs: default_dedup_sweep_interval_secs(),
            remote_timeout_secs: default_remote_timeout_secs(),
            default_inbox_name: default_inbox_name(),
            default_organization: default_organization(),
            default_logo: default_logo(),
        }
    }
}

fn default_dedup_window_secs() -> u64 {
    30 * 60
}

fn default_dedup_sweep_interval_secs() -> u64 {
    10 * 60
}

fn default_remote_timeout_secs() -> u64 {
    30
}

fn default_inbox_name() -> String {
    "WhatsApp Inbox".to_string()
}

fn default_organization() -> String {
    "Zapbridge".to_string()
}

fn default_logo() -> String {
    "https://avatars.githubusercontent.com/u/0?s=200&v=4".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ZapbridgeConfig::default();
        assert_eq!(config.server.port, 8080);
        assert!(!config.delivery.retry_enabled);
        assert_eq!(config.delivery.retry_count, 3);
        assert_eq!(config.delivery.format, WebhookFormat::Form);
        assert_eq!(config.queue.events_queue, "whatsapp_events");
        assert_eq!(config.bridge.dedup_window_secs, 1800);
        assert_eq!(config.bridge.dedup_sweep_interval_secs, 600);
    }

    #[test]
    fn vault_key_accepts_hex_and_raw() {
        let hex_key = VaultConfig {
            encryption_key: Some("ab".repeat(32)),
        };
        assert_eq!(hex_key.key_bytes().unwrap(), Some([0xab; 32]));

        let raw_key = VaultConfig {
            encryption_key: Some("0123456789abcdef0123456789ABCDEF".into()),
        };
        assert!(raw_key.key_bytes().unwrap().is_some());

        let short = VaultConfig {
            encryption_key: Some("short".into()),
        };
        assert!(short.key_bytes().is_err());

        assert_eq!(VaultConfig::default().key_bytes().unwrap(), None);
    }

    #[test]
    fn vault_debug_redacts_key() {
        let config = VaultConfig {
            encryption_key: Some("top-secret-key-material-000000000".into()),
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("top-secret"));
    }
}
