// SPDX-FileCopyrightText: 2026 Zapbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers.
//!
//! Handles the helpdesk webhook (token in the path or the query string),
//! GET/PUT/DELETE /chatwoot/config, and GET /health.

use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use zapbridge_bridge::{BridgeSettingsRequest, WebhookAck};
use zapbridge_core::{BridgeError, Tenant};

use crate::server::GatewayState;

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// A failed request, rendered as `{"error": "..."}` with a matching status.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<BridgeError> for ApiError {
    fn from(e: BridgeError) -> Self {
        let status = match &e {
            BridgeError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            BridgeError::Validation(_) => StatusCode::BAD_REQUEST,
            BridgeError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %e, status = status.as_u16(), "request failed");
        } else {
            tracing::debug!(error = %e, status = status.as_u16(), "request rejected");
        }
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    #[serde(default)]
    pub token: Option<String>,
}

fn ack_body(ack: WebhookAck) -> Json<serde_json::Value> {
    match ack {
        WebhookAck::Ignored(reason) => Json(json!({ "status": "ignored", "reason": reason })),
        WebhookAck::Delivered { .. } => Json(json!({ "status": "success" })),
    }
}

/// POST /chatwoot/webhook/{token}
pub async fn chatwoot_webhook(
    State(state): State<GatewayState>,
    Path(token): Path<String>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    let ack = state.bridge.handle_outgoing_webhook(&token, &body).await?;
    Ok(ack_body(ack))
}

/// POST /chatwoot/webhook?token=...
pub async fn chatwoot_webhook_query(
    State(state): State<GatewayState>,
    Query(query): Query<TokenQuery>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    let token = query
        .token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| BridgeError::Unauthorized("missing token".into()))?;
    let ack = state.bridge.handle_outgoing_webhook(&token, &body).await?;
    Ok(ack_body(ack))
}

/// GET /chatwoot/config
pub async fn get_config(
    State(state): State<GatewayState>,
    Extension(tenant): Extension<Tenant>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let base = state.base_url(&headers);
    match state.bridge.get_settings(&tenant, &base).await? {
        Some(view) => Ok(Json(view).into_response()),
        None => Err(ApiError::not_found("chatwoot not configured")),
    }
}

/// PUT /chatwoot/config
pub async fn put_config(
    State(state): State<GatewayState>,
    Extension(tenant): Extension<Tenant>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ApiError> {
    let request: BridgeSettingsRequest = serde_json::from_slice(&body)
        .map_err(|e| BridgeError::Validation(format!("invalid request body: {e}")))?;
    let base = state.base_url(&headers);
    let inbox_id = state.bridge.save_settings(&tenant, request, &base).await?;
    tracing::info!(tenant = %tenant.id, inbox_id, "bridge configuration saved");
    Ok(Json(json!({
        "status": "success",
        "inbox_id": inbox_id,
        "webhook_url": zapbridge_bridge::webhook_url(&base, &tenant.token),
    })))
}

/// DELETE /chatwoot/config
pub async fn delete_config(
    State(state): State<GatewayState>,
    Extension(tenant): Extension<Tenant>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if state.bridge.delete_settings(&tenant.id).await? {
        Ok(Json(json!({ "status": "success" })))
    } else {
        Err(ApiError::not_found("chatwoot not configured"))
    }
}

/// GET /health
pub async fn health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}
