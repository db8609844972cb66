// SPDX-FileCopyrightText: 2026 Zapbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for zapbridge.
//!
//! Serves the helpdesk webhook that carries agent replies back to WhatsApp,
//! the per-tenant bridge configuration endpoints, and an unauthenticated
//! health probe.

pub mod auth;
pub mod handlers;
pub mod server;

pub use handlers::ApiError;
pub use server::{GatewayState, ServerConfig, router, start_server};
