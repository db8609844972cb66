// SPDX-FileCopyrightText: 2026 Zapbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock WhatsApp session for deterministic testing.
//!
//! `MockWhatsAppClient` implements `WhatsAppClient` with switchable session
//! state, canned media downloads, and captured outbound sends.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use zapbridge_core::{BridgeError, ChatAddress, MediaAttachment, OutgoingContent, WhatsAppClient};

/// One captured call to `send_message`.
#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub to: ChatAddress,
    pub content: OutgoingContent,
    /// Id returned to the caller.
    pub id: String,
}

/// A fake WhatsApp session.
///
/// Sends succeed with ids `MOCK-1`, `MOCK-2`, ... unless [`fail_sends`]
/// was called. Downloads return whatever was registered for the media
/// handle via [`with_media`], or an error.
///
/// [`fail_sends`]: MockWhatsAppClient::fail_sends
/// [`with_media`]: MockWhatsAppClient::with_media
pub struct MockWhatsAppClient {
    logged_in: AtomicBool,
    connected: AtomicBool,
    fail_sends: AtomicBool,
    counter: AtomicUsize,
    sent: Mutex<Vec<SentMessage>>,
    media: Mutex<HashMap<String, Vec<u8>>>,
    downloads: AtomicUsize,
}

impl MockWhatsAppClient {
    /// A logged-in, connected session.
    pub fn new() -> Self {
        Self {
            logged_in: AtomicBool::new(true),
            connected: AtomicBool::new(true),
            fail_sends: AtomicBool::new(false),
            counter: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
            media: Mutex::new(HashMap::new()),
            downloads: AtomicUsize::new(0),
        }
    }

    /// A session that has not finished pairing.
    pub fn logged_out() -> Self {
        let client = Self::new();
        client.logged_in.store(false, Ordering::SeqCst);
        client
    }

    /// A paired session whose socket is down.
    pub fn disconnected() -> Self {
        let client = Self::new();
        client.connected.store(false, Ordering::SeqCst);
        client
    }

    /// Registers the bytes returned when downloading `handle`.
    pub async fn with_media(self, handle: &str, bytes: &[u8]) -> Self {
        self.media
            .lock()
            .await
            .insert(handle.to_string(), bytes.to_vec());
        self
    }

    /// Makes every subsequent send fail.
    pub fn fail_sends(&self) {
        self.fail_sends.store(true, Ordering::SeqCst);
    }

    pub async fn sent_messages(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Number of download calls made, successful or not.
    pub fn download_count(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }
}

impl Default for MockWhatsAppClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WhatsAppClient for MockWhatsAppClient {
    fn is_logged_in(&self) -> bool {
        self.logged_in.load(Ordering::SeqCst)
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn send_message(
        &self,
        to: &ChatAddress,
        content: OutgoingContent,
    ) -> Result<String, BridgeError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(BridgeError::WhatsApp {
                message: format!("mock send to {to} failed"),
                source: None,
            });
        }
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format!("MOCK-{n}");
        self.sent.lock().await.push(SentMessage {
            to: to.clone(),
            content,
            id: id.clone(),
        });
        Ok(id)
    }

    async fn download(&self, media: &MediaAttachment) -> Result<Vec<u8>, BridgeError> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        self.media
            .lock()
            .await
            .get(&media.handle)
            .cloned()
            .ok_or_else(|| BridgeError::WhatsApp {
                message: format!("no media registered for handle {}", media.handle),
                source: None,
            })
    }
}
