// SPDX-FileCopyrightText: 2026 Zapbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Merge order (later overrides earlier):
//! 1. Compiled defaults
//! 2. `/etc/zapbridge/zapbridge.toml`
//! 3. `~/.config/zapbridge/zapbridge.toml`
//! 4. `./zapbridge.toml`
//! 5. `ZAPBRIDGE_*` environment variables

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::ZapbridgeConfig;

pub const SYSTEM_CONFIG_PATH: &str = "/etc/zapbridge/zapbridge.toml";

/// Sections whose env keys are mapped `section_key` -> `section.key`.
const SECTIONS: &[&str] = &["server", "storage", "vault", "delivery", "queue", "bridge"];

/// Load configuration from the XDG hierarchy with env var overrides.
pub fn load_config() -> Result<ZapbridgeConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<ZapbridgeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ZapbridgeConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ZapbridgeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ZapbridgeConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The full layered Figment, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(ZapbridgeConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("zapbridge/zapbridge.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("zapbridge.toml"))
        .merge(env_provider())
}

/// Environment provider with explicit section mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` so that
/// `ZAPBRIDGE_DELIVERY_RETRY_COUNT` maps to `delivery.retry_count`.
pub(crate) fn env_provider() -> Env {
    Env::prefixed("ZAPBRIDGE_").map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
