// SPDX-FileCopyrightText: 2026 Zapbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The process-wide credential vault.

use secrecy::{ExposeSecret, SecretSlice};
use tracing::debug;
use zapbridge_config::model::VaultConfig;
use zapbridge_core::{BridgeError, mask_token};
use zeroize::Zeroizing;

use crate::crypto;

/// Seals and opens per-tenant signing secrets.
///
/// Read-only after construction; share it behind an `Arc`.
pub struct CredentialVault {
    key: Zeroizing<[u8; 32]>,
}

impl std::fmt::Debug for CredentialVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialVault")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl CredentialVault {
    pub fn new(key: [u8; 32]) -> Self {
        Self {
            key: Zeroizing::new(key),
        }
    }

    /// Builds the vault from `[vault]` config; `None` when no key is set.
    pub fn from_config(config: &VaultConfig) -> Result<Option<Self>, BridgeError> {
        let key = config.key_bytes().map_err(BridgeError::Config)?;
        if key.is_none() {
            debug!("no vault key configured, signing keys are unavailable");
        }
        Ok(key.map(Self::new))
    }

    /// Seals a secret for storage.
    pub fn seal(&self, secret: &[u8]) -> Result<Vec<u8>, BridgeError> {
        crypto::seal(&self.key, secret)
    }

    /// Opens a sealed secret. The plaintext is zeroized on drop.
    pub fn open(&self, sealed: &[u8]) -> Result<SecretSlice<u8>, BridgeError> {
        crypto::open(&self.key, sealed).map(SecretSlice::from)
    }

    /// Opens a sealed secret and returns the masked preview of it.
    pub fn preview(&self, sealed: &[u8]) -> Result<String, BridgeError> {
        let secret = self.open(sealed)?;
        Ok(mask_token(&String::from_utf8_lossy(secret.expose_secret())))
    }
}
