// SPDX-FileCopyrightText: 2026 Zapbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable queue publishing (dead letters, shared event stream).

use async_trait::async_trait;

use crate::error::BridgeError;

/// Publishes opaque payloads onto a named durable queue.
#[async_trait]
pub trait QueuePublisher: Send + Sync {
    /// Whether publishing is configured at all. Disabled publishers are
    /// skipped without logging.
    fn is_enabled(&self) -> bool {
        true
    }

    async fn publish(&self, queue: &str, payload: Vec<u8>) -> Result<(), BridgeError>;
}
