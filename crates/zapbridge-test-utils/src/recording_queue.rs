// SPDX-FileCopyrightText: 2026 Zapbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Queue publisher that records instead of publishing.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use zapbridge_core::{BridgeError, QueuePublisher};

#[derive(Debug, Clone, PartialEq)]
pub struct PublishedMessage {
    pub queue: String,
    pub payload: Vec<u8>,
}

/// Captures every publish for later assertion.
#[derive(Default)]
pub struct RecordingPublisher {
    published: Mutex<Vec<PublishedMessage>>,
    failing: AtomicBool,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// A publisher whose every publish errors.
    pub fn failing() -> Self {
        let publisher = Self::default();
        publisher.failing.store(true, Ordering::SeqCst);
        publisher
    }

    pub async fn published(&self) -> Vec<PublishedMessage> {
        self.published.lock().await.clone()
    }

    /// Payloads published to `queue`, in order.
    pub async fn payloads_for(&self, queue: &str) -> Vec<Vec<u8>> {
        self.published
            .lock()
            .await
            .iter()
            .filter(|m| m.queue == queue)
            .map(|m| m.payload.clone())
            .collect()
    }
}

#[async_trait]
impl QueuePublisher for RecordingPublisher {
    async fn publish(&self, queue: &str, payload: Vec<u8>) -> Result<(), BridgeError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(BridgeError::Delivery(format!("publish to {queue} refused")));
        }
        self.published.lock().await.push(PublishedMessage {
            queue: queue.to_string(),
            payload,
        });
        Ok(())
    }
}
