// SPDX-FileCopyrightText: 2026 Zapbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the zapbridge workspace.

use thiserror::Error;

/// The primary error type used across the bridge, the delivery engine, and
/// their collaborator traits.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Configuration errors (invalid TOML, missing inbox, bad vault key).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The ticketing platform rejected a call or could not be reached.
    #[error("remote API error: {message}")]
    Remote {
        message: String,
        /// HTTP status, when the platform answered at all.
        status: Option<u16>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The WhatsApp protocol client failed to send or download.
    #[error("whatsapp error: {message}")]
    WhatsApp {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A required collaborator is missing, logged out, or disconnected.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// Malformed input from a caller (bad payload, missing destination).
    #[error("validation error: {0}")]
    Validation(String),

    /// Unknown or missing tenant token.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Credential vault errors (seal/open failure, missing key).
    #[error("vault error: {0}")]
    Vault(String),

    /// Webhook delivery failed permanently.
    #[error("delivery error: {0}")]
    Delivery(String),

    /// The originating request or event was cancelled before completion.
    #[error("operation cancelled")]
    Cancelled,

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl BridgeError {
    /// Convenience constructor for remote API failures with a status code.
    pub fn remote(status: Option<u16>, message: impl Into<String>) -> Self {
        BridgeError::Remote {
            message: message.into(),
            status,
            source: None,
        }
    }

    /// Wrap any storage-layer error.
    pub fn storage(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        BridgeError::Storage {
            source: source.into(),
        }
    }
}
