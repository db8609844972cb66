// SPDX-FileCopyrightText: 2026 Zapbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation.
//!
//! Collects every problem rather than failing on the first.

use crate::diagnostic::ConfigError;
use crate::model::ZapbridgeConfig;

/// Validate a deserialized configuration for semantic correctness.
pub fn validate_config(config: &ZapbridgeConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |key: &str, message: String| {
        errors.push(ConfigError::Validation {
            key: key.to_string(),
            message,
        })
    };

    let host = config.server.host.trim();
    if host.is_empty() {
        fail("server.host", "server.host must not be empty".to_string());
    } else if host.parse::<std::net::IpAddr>().is_err()
        && !host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        fail(
            "server.host",
            format!("server.host `{host}` is not a valid IP address or hostname"),
        );
    }

    if let Some(url) = config.server.public_url.as_deref() {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            fail(
                "server.public_url",
                format!("server.public_url `{url}` must start with http:// or https://"),
            );
        }
    }

    if config.storage.database_path.trim().is_empty() {
        fail(
            "storage.database_path",
            "storage.database_path must not be empty".to_string(),
        );
    }

    if let Err(message) = config.vault.key_bytes() {
        fail("vault.encryption_key", message);
    }

    if config.delivery.retry_count < 1 {
        fail(
            "delivery.retry_count",
            "delivery.retry_count must be at least 1".to_string(),
        );
    }

    if config.delivery.timeout_secs == 0 {
        fail(
            "delivery.timeout_secs",
            "delivery.timeout_secs must be greater than 0".to_string(),
        );
    }

    if config.queue.enabled {
        for (key, name) in [
            ("queue.events_queue", &config.queue.events_queue),
            ("queue.errors_queue", &config.queue.errors_queue),
        ] {
            if name.trim().is_empty() {
                fail(key, format!("{key} must not be empty when the queue is enabled"));
            }
        }
    }

    for (key, value) in [
        ("bridge.dedup_window_secs", config.bridge.dedup_window_secs),
        (
            "bridge.dedup_sweep_interval_secs",
            config.bridge.dedup_sweep_interval_secs,
        ),
        ("bridge.remote_timeout_secs", config.bridge.remote_timeout_secs),
    ] {
        if value == 0 {
            fail(key, format!("{key} must be greater than 0"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&ZapbridgeConfig::default()).is_ok());
    }

    #[test]
    fn all_errors_are_collected() {
        let mut config = ZapbridgeConfig::default();
        config.server.host = String::new();
        config.delivery.retry_count = 0;
        config.bridge.dedup_window_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn empty_queue_names_only_matter_when_enabled() {
        let mut config = ZapbridgeConfig::default();
        config.queue.events_queue = String::new();
        assert!(validate_config(&config).is_ok());

        config.queue.enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].to_string().contains("queue.events_queue"));
    }

    #[test]
    fn bad_vault_key_is_rejected() {
        let mut config = ZapbridgeConfig::default();
        config.vault.encryption_key = Some("too-short".into());
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].to_string().contains("vault.encryption_key"));
    }

    #[test]
    fn public_url_needs_scheme() {
        let mut config = ZapbridgeConfig::default();
        config.server.public_url = Some("bridge.example.com".into());
        assert!(validate_config(&config).is_err());
    }
}
