// SPDX-FileCopyrightText: 2026 Zapbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for zapbridge integration tests.
//!
//! Provides in-process stand-ins for the bridge's collaborators so the
//! bridge, delivery engine, and gateway can be exercised without a phone
//! session or a database.
//!
//! # Components
//!
//! - [`MockWhatsAppClient`] - Scriptable WhatsApp session that captures sends
//! - [`InMemoryStore`] - `BridgeStore` backed by plain maps
//! - [`RecordingPublisher`] - `QueuePublisher` that keeps every payload
//! - [`fixtures`] - Ready-made tenants, configs, and message events

pub mod fixtures;
pub mod memory_store;
pub mod mock_whatsapp;
pub mod recording_queue;

pub use memory_store::InMemoryStore;
pub use mock_whatsapp::{MockWhatsAppClient, SentMessage};
pub use recording_queue::{PublishedMessage, RecordingPublisher};
