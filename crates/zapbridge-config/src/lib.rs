// SPDX-FileCopyrightText: 2026 Zapbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for zapbridge.
//!
//! Settings come from `zapbridge.toml` files (system, user, then working
//! directory) with `ZAPBRIDGE_*` environment variables applied last. Every
//! table rejects unknown keys. Loading problems and semantic validation
//! failures are both reported as [`ConfigError`] diagnostics.
//!
//! ```no_run
//! let config = zapbridge_config::load_and_validate().unwrap_or_default();
//! println!("listening on {}:{}", config.server.host, config.server.port);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::{Path, PathBuf};

pub use diagnostic::{ConfigError, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{WebhookFormat, ZapbridgeConfig};

/// Load from the standard file hierarchy and validate.
pub fn load_and_validate() -> Result<ZapbridgeConfig, Vec<ConfigError>> {
    checked(loader::load_config(), || {
        candidate_files()
            .into_iter()
            .filter_map(|path| read_source(&path))
            .collect()
    })
}

/// Load from one explicit file, plus env overrides, and validate.
pub fn load_and_validate_path(path: &Path) -> Result<ZapbridgeConfig, Vec<ConfigError>> {
    checked(loader::load_config_from_path(path), || {
        read_source(path).into_iter().collect()
    })
}

/// Load from TOML text and validate.
pub fn load_and_validate_str(toml_content: &str) -> Result<ZapbridgeConfig, Vec<ConfigError>> {
    checked(loader::load_config_from_str(toml_content), || {
        vec![("<inline>".to_string(), toml_content.to_string())]
    })
}

/// Validate a parsed config, or turn the parse failure into diagnostics.
///
/// Sources are only read when there is an error to annotate.
fn checked(
    loaded: Result<ZapbridgeConfig, figment::Error>,
    sources: impl FnOnce() -> Vec<(String, String)>,
) -> Result<ZapbridgeConfig, Vec<ConfigError>> {
    let config = loaded.map_err(|err| diagnostic::figment_to_config_errors(err, &sources()))?;
    validation::validate_config(&config)?;
    Ok(config)
}

fn candidate_files() -> Vec<PathBuf> {
    let mut files = vec![PathBuf::from(loader::SYSTEM_CONFIG_PATH)];
    if let Some(dir) = dirs::config_dir() {
        files.push(dir.join("zapbridge").join("zapbridge.toml"));
    }
    let local = Path::new("zapbridge.toml");
    files.push(std::env::current_dir().map_or_else(|_| local.to_path_buf(), |cwd| cwd.join(local)));
    files
}

fn read_source(path: &Path) -> Option<(String, String)> {
    let content = std::fs::read_to_string(path).ok()?;
    Some((path.display().to_string(), content))
}
