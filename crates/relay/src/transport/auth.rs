// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, Request};
use axum::middleware::Next;
use axum::response::Response;

use crate::auth::{AccessClaims, Role};
use crate::error::{auth_error_response, RelayError};
use crate::state::AppState;

/// Extract the token from an `Authorization: Bearer ...` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get("authorization").and_then(|v| v.to_str().ok())?;
    let token = header.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

/// Check the caller's role against a route minimum.
pub fn require_role(claims: &AccessClaims, required: Role) -> Result<(), RelayError> {
    if claims.role.at_least(required) {
        Ok(())
    } else {
        Err(RelayError::Forbidden)
    }
}

/// Paths reachable without an access token.
fn is_public(path: &str) -> bool {
    path == "/api/v1/health" || path == "/api/v1/auth/refresh" || path == "/ws"
}

/// Axum middleware that verifies the bearer access token and stores its
/// claims in the request extensions.
///
/// Exempt: health, refresh (authenticated by its refresh credential) and the
/// socket endpoint (authenticated by its handshake frame).
pub async fn auth_layer(
    state: State<Arc<AppState>>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    if is_public(req.uri().path()) {
        return next.run(req).await;
    }

    let Some(token) = bearer_token(req.headers()) else {
        return RelayError::Unauthorized.to_http_response("unauthorized");
    };

    match state.authority.verify_access(token) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Err(e) => {
            tracing::debug!(path = %req.uri().path(), err = %e, "bearer rejected");
            auth_error_response(&e)
        }
    }
}
