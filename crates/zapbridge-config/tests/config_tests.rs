// SPDX-FileCopyrightText: 2026 Zapbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the zapbridge configuration system.

use zapbridge_config::diagnostic::ConfigError;
use zapbridge_config::{WebhookFormat, load_and_validate_str, load_config_from_str};

#[test]
fn full_toml_deserializes() {
    let toml = r#"
[server]
host = "0.0.0.0"
port = 9090
public_url = "https://bridge.example.com"
log_level = "debug"

[storage]
database_path = "/tmp/zapbridge-test.db"
wal_mode = false

[vault]
encryption_key = "0000000000000000000000000000000000000000000000000000000000000000"

[delivery]
retry_enabled = true
retry_count = 5
retry_base_delay_ms = 250
format = "json"
timeout_secs = 10

[queue]
enabled = true
events_queue = "events"
errors_queue = "dead"
publish_timeout_ms = 1000

[bridge]
dedup_window_secs = 60
dedup_sweep_interval_secs = 30
remote_timeout_secs = 5
default_inbox_name = "Support"
default_organization = "Acme"
default_logo = "https://acme.example/logo.png"
"#;

    let config = load_and_validate_str(toml).expect("valid config");
    assert_eq!(config.server.port, 9090);
    assert_eq!(
        config.server.public_url.as_deref(),
        Some("https://bridge.example.com")
    );
    assert!(!config.storage.wal_mode);
    assert_eq!(config.vault.key_bytes().unwrap(), Some([0u8; 32]));
    assert!(config.delivery.retry_enabled);
    assert_eq!(config.delivery.retry_count, 5);
    assert_eq!(config.delivery.format, WebhookFormat::Json);
    assert!(config.queue.enabled);
    assert_eq!(config.queue.errors_queue, "dead");
    assert_eq!(config.bridge.default_inbox_name, "Support");
}

#[test]
fn empty_toml_yields_defaults() {
    let config = load_config_from_str("").expect("empty config");
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.delivery.retry_base_delay_ms, 1000);
    assert_eq!(config.bridge.default_inbox_name, "WhatsApp Inbox");
}

#[test]
fn unknown_key_produces_suggestion() {
    let toml = r#"
[delivery]
retry_cont = 3
"#;

    let errors = load_and_validate_str(toml).expect_err("unknown key");
    match &errors[0] {
        ConfigError::UnknownKey {
            key, suggestion, ..
        } => {
            assert_eq!(key, "retry_cont");
            assert_eq!(suggestion.as_deref(), Some("retry_count"));
        }
        other => panic!("expected UnknownKey, got {other:?}"),
    }
}

#[test]
fn unknown_format_is_rejected() {
    let toml = r#"
[delivery]
format = "xml"
"#;
    assert!(load_config_from_str(toml).is_err());
}

#[test]
fn wrong_type_is_reported() {
    let toml = r#"
[server]
port = "eighty"
"#;

    let errors = load_and_validate_str(toml).expect_err("bad type");
    assert!(matches!(errors[0], ConfigError::InvalidType { .. }));
}

#[test]
fn validation_errors_surface_after_parsing() {
    let toml = r#"
[delivery]
retry_count = 0
"#;

    let errors = load_and_validate_str(toml).expect_err("invalid value");
    assert!(matches!(errors[0], ConfigError::Validation { .. }));
}
