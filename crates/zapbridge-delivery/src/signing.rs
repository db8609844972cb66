// SPDX-FileCopyrightText: 2026 Zapbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HMAC-SHA256 request signing.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use zapbridge_core::BridgeError;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the hex signature. Absent when the tenant has no key.
pub const SIGNATURE_HEADER: &str = "x-hmac-signature";

/// Hex-encoded HMAC-SHA256 of `payload` under `key`.
pub fn sign_payload(key: &[u8], payload: &[u8]) -> Result<String, BridgeError> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| BridgeError::Vault(format!("HMAC initialization failed: {e}")))?;
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_is_deterministic() {
        let a = sign_payload(b"secret", br#"{"a":1}"#).unwrap();
        let b = sign_payload(b"secret", br#"{"a":1}"#).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn one_byte_changes_the_signature() {
        let a = sign_payload(b"secret", br#"{"a":1}"#).unwrap();
        let b = sign_payload(b"secret", br#"{"a":2}"#).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn known_vector() {
        // RFC 4231 test case 2.
        let sig = sign_payload(b"Jefe", b"what do ya want for nothing?").unwrap();
        assert_eq!(
            sig,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }
}
