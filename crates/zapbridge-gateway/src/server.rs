// SPDX-FileCopyrightText: 2026 Zapbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Router,
    http::HeaderMap,
    middleware as axum_middleware,
    routing::{get, post},
};
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use zapbridge_bridge::BridgeService;
use zapbridge_core::BridgeError;

use crate::auth::tenant_auth;
use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub bridge: Arc<BridgeService>,
    /// Externally reachable base URL; derived from request headers when unset.
    pub public_url: Option<String>,
    /// Process start time for uptime calculation.
    pub start_time: Instant,
}

impl GatewayState {
    pub fn new(bridge: Arc<BridgeService>, public_url: Option<String>) -> Self {
        Self {
            bridge,
            public_url: public_url.filter(|u| !u.trim().is_empty()),
            start_time: Instant::now(),
        }
    }

    /// Base URL the helpdesk should use to reach this process.
    ///
    /// Honors `X-Forwarded-Proto` and `X-Forwarded-Host` from a reverse proxy,
    /// falling back to `Host` over plain HTTP.
    pub fn base_url(&self, headers: &HeaderMap) -> String {
        if let Some(url) = &self.public_url {
            return url.trim_end_matches('/').to_string();
        }

        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };
        let scheme = header("x-forwarded-proto").unwrap_or("http");
        let host = header("x-forwarded-host")
            .or_else(|| header("host"))
            .unwrap_or("localhost");
        format!("{scheme}://{host}")
    }
}

/// Gateway bind address.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Builds the router:
/// - POST /chatwoot/webhook/{token} and POST /chatwoot/webhook?token= (token in the URL)
/// - GET/PUT/DELETE /chatwoot/config (tenant auth middleware)
/// - GET /health (public)
pub fn router(state: GatewayState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/chatwoot/webhook", post(handlers::chatwoot_webhook_query))
        .route("/chatwoot/webhook/{token}", post(handlers::chatwoot_webhook))
        .with_state(state.clone());

    let tenant_routes = Router::new()
        .route(
            "/chatwoot/config",
            get(handlers::get_config)
                .put(handlers::put_config)
                .delete(handlers::delete_config),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            tenant_auth,
        ))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(tenant_routes)
        .layer(TraceLayer::new_for_http())
}

/// Serves until `shutdown` is cancelled, then drains in-flight requests.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), BridgeError> {
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| BridgeError::Config(format!("failed to bind gateway to {addr}: {e}")))?;

    tracing::info!(addr = %addr, "gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| BridgeError::Internal(format!("gateway server error: {e}")))?;

    tracing::info!("gateway stopped");
    Ok(())
}
