// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP + WebSocket transport for the relay.

pub mod auth;
pub mod http;
pub mod http_auth;
pub mod http_cmd;
pub mod ws;

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the axum `Router` with all relay routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health (no auth)
        .route("/api/v1/health", get(http::health))
        // Token endpoints
        .route("/api/v1/auth/refresh", post(http_auth::refresh))
        .route("/api/v1/auth/logout", post(http_auth::logout))
        .route("/api/v1/auth/me", get(http_auth::me))
        // Commands to the authoritative agent
        .route("/api/v1/commands/reload-module", post(http_cmd::reload_module))
        .route("/api/v1/commands/reload-command", post(http_cmd::reload_command))
        .route("/api/v1/commands/send-message", post(http_cmd::send_message))
        .route("/api/v1/commands/stats", post(http_cmd::stats))
        // Relay socket (handshake-authenticated)
        .route("/ws", get(ws::ws_handler))
        // Middleware
        .layer(middleware::from_fn_with_state(state.clone(), auth::auth_layer))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
