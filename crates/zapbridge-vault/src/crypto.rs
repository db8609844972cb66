// SPDX-FileCopyrightText: 2026 Zapbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Low-level AES-256-GCM seal/open.
//!
//! Sealed values are laid out as `nonce (12 bytes) || ciphertext || tag (16 bytes)`.
//! Every call to [`seal`] draws a fresh random nonce from the system CSPRNG.

use ring::aead::{AES_256_GCM, Aad, LessSafeKey, NONCE_LEN, Nonce, UnboundKey};
use ring::rand::{SecureRandom, SystemRandom};
use zapbridge_core::BridgeError;

fn cipher(key: &[u8; 32]) -> Result<LessSafeKey, BridgeError> {
    let unbound = UnboundKey::new(&AES_256_GCM, key)
        .map_err(|_| BridgeError::Vault("failed to create AES-256-GCM key".to_string()))?;
    Ok(LessSafeKey::new(unbound))
}

/// Encrypt `plaintext`, returning `nonce || ciphertext_with_tag`.
pub fn seal(key: &[u8; 32], plaintext: &[u8]) -> Result<Vec<u8>, BridgeError> {
    let cipher = cipher(key)?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    SystemRandom::new()
        .fill(&mut nonce_bytes)
        .map_err(|_| BridgeError::Vault("failed to generate random nonce".to_string()))?;

    let mut in_out = plaintext.to_vec();
    cipher
        .seal_in_place_append_tag(
            Nonce::assume_unique_for_key(nonce_bytes),
            Aad::empty(),
            &mut in_out,
        )
        .map_err(|_| BridgeError::Vault("AES-256-GCM encryption failed".to_string()))?;

    let mut sealed = Vec::with_capacity(NONCE_LEN + in_out.len());
    sealed.extend_from_slice(&nonce_bytes);
    sealed.extend_from_slice(&in_out);
    Ok(sealed)
}

/// Decrypt a value produced by [`seal`].
///
/// Fails on a wrong key, tampering, or input shorter than a nonce.
pub fn open(key: &[u8; 32], sealed: &[u8]) -> Result<Vec<u8>, BridgeError> {
    if sealed.len() < NONCE_LEN {
        return Err(BridgeError::Vault(
            "sealed value is shorter than the nonce".to_string(),
        ));
    }
    let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
    let nonce = Nonce::try_assume_unique_for_key(nonce_bytes)
        .map_err(|_| BridgeError::Vault("invalid nonce".to_string()))?;

    let mut in_out = ciphertext.to_vec();
    let plaintext = cipher(key)?
        .open_in_place(nonce, Aad::empty(), &mut in_out)
        .map_err(|_| {
            BridgeError::Vault(
                "AES-256-GCM decryption failed -- wrong key or corrupted data".to_string(),
            )
        })?;

    Ok(plaintext.to_vec())
}

/// Generate a random 32-byte key suitable for AES-256-GCM.
pub fn generate_random_key() -> Result<[u8; 32], BridgeError> {
    let mut key = [0u8; 32];
    SystemRandom::new()
        .fill(&mut key)
        .map_err(|_| BridgeError::Vault("failed to generate random key".to_string()))?;
    Ok(key)
}
