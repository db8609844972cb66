// SPDX-FileCopyrightText: 2026 Zapbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credential vault for zapbridge.
//!
//! Per-tenant HMAC signing keys are sealed with AES-256-GCM under a single
//! process-wide key loaded from configuration at startup and never written
//! to disk by this crate.

pub mod crypto;
pub mod vault;

pub use vault::CredentialVault;
