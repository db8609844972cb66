// SPDX-FileCopyrightText: 2026 Zapbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator traits consumed by the bridge and the delivery engine.
//!
//! All traits use `#[async_trait]` so they can be held as trait objects.

pub mod queue;
pub mod store;
pub mod whatsapp;

pub use queue::QueuePublisher;
pub use store::BridgeStore;
pub use whatsapp::{ClientDirectory, WhatsAppClient};
