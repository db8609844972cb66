// SPDX-FileCopyrightText: 2026 Zapbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound event delivery for zapbridge.
//!
//! The [`DeliveryEngine`] posts WhatsApp-originated events to tenant webhook
//! URLs (form or JSON, optionally HMAC-signed), retries with exponential
//! backoff, and hands permanent failures to a dead-letter queue. Events are
//! also published to the shared events queue when one is configured.

pub mod dead_letter;
pub mod engine;
pub mod policy;
pub mod publisher;
pub mod signing;

pub use dead_letter::DeadLetterRecord;
pub use engine::{DeliveryEngine, DeliveryOutcome, EventFields};
pub use policy::DeliveryPolicy;
pub use publisher::{NoopQueuePublisher, SqliteQueuePublisher};
pub use signing::{SIGNATURE_HEADER, sign_payload};
