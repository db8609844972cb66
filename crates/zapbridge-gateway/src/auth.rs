// SPDX-FileCopyrightText: 2026 Zapbridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tenant authentication for the configuration endpoints.
//!
//! The tenant's own opaque token is accepted from either header, checked in
//! order:
//! 1. `Authorization: Bearer <token>`
//! 2. `token: <token>`
//!
//! On success the resolved [`Tenant`] is attached to the request extensions.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use zapbridge_core::{BridgeError, Tenant};

use crate::handlers::ApiError;
use crate::server::GatewayState;

/// Header carrying the tenant token when no bearer token is sent.
pub const TOKEN_HEADER: &str = "token";

/// Token presented by the caller, if any.
pub fn presented_token(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    bearer.or_else(|| {
        headers
            .get(TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|t| !t.is_empty())
    })
}

/// Rejects requests without a valid tenant token.
pub async fn tenant_auth(
    State(state): State<GatewayState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(token) = presented_token(request.headers()) else {
        tracing::debug!(path = %request.uri().path(), "request without tenant token");
        return Err(BridgeError::Unauthorized("missing token".into()).into());
    };

    let tenant: Tenant = state.bridge.authenticate(token).await?;
    request.extensions_mut().insert(tenant);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_wins_over_token_header() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer abc"));
        headers.insert(TOKEN_HEADER, HeaderValue::from_static("xyz"));
        assert_eq!(presented_token(&headers), Some("abc"));
    }

    #[test]
    fn token_header_is_accepted() {
        let mut headers = HeaderMap::new();
        headers.insert(TOKEN_HEADER, HeaderValue::from_static("xyz"));
        assert_eq!(presented_token(&headers), Some("xyz"));
    }

    #[test]
    fn malformed_authorization_falls_through() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Basic abc"));
        assert_eq!(presented_token(&headers), None);

        headers.insert("authorization", HeaderValue::from_static("Bearer   "));
        assert_eq!(presented_token(&headers), None);
    }
}
