// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dashboard command endpoints. Each one maps to a [`CommandDispatcher`] call.
//!
//! [`CommandDispatcher`]: crate::relay::dispatch::CommandDispatcher

use std::sync::Arc;

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::auth::{AccessClaims, Role};
use crate::error::RelayError;
use crate::state::AppState;
use crate::transport::auth::require_role;

#[derive(Debug, Deserialize)]
pub struct NameRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub channel_id: String,
    pub content: String,
    #[serde(default)]
    pub embed: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct DeliveredResponse {
    pub delivered: bool,
}

fn delivered(ok: bool, command: &str) -> Response {
    if ok {
        Json(DeliveredResponse { delivered: true }).into_response()
    } else {
        RelayError::AgentUnavailable.to_http_response(format!("no agent available for {command}"))
    }
}

fn forbidden(claims: &AccessClaims, required: Role) -> Option<Response> {
    require_role(claims, required).err().map(|code| {
        tracing::info!(subject = %claims.sub, role = %claims.role, %required, "insufficient role");
        code.to_http_response(format!("requires {required}"))
    })
}

/// `POST /api/v1/commands/reload-module`
pub async fn reload_module(
    State(s): State<Arc<AppState>>,
    Extension(claims): Extension<AccessClaims>,
    Json(req): Json<NameRequest>,
) -> Response {
    if let Some(resp) = forbidden(&claims, Role::Admin) {
        return resp;
    }
    tracing::info!(subject = %claims.sub, module = %req.name, "reload module requested");
    delivered(s.dispatcher.reload_module(&req.name), "reload:module")
}

/// `POST /api/v1/commands/reload-command`
pub async fn reload_command(
    State(s): State<Arc<AppState>>,
    Extension(claims): Extension<AccessClaims>,
    Json(req): Json<NameRequest>,
) -> Response {
    if let Some(resp) = forbidden(&claims, Role::Admin) {
        return resp;
    }
    tracing::info!(subject = %claims.sub, command = %req.name, "reload command requested");
    delivered(s.dispatcher.reload_command(&req.name), "reload:command")
}

/// `POST /api/v1/commands/send-message`
pub async fn send_message(
    State(s): State<Arc<AppState>>,
    Extension(claims): Extension<AccessClaims>,
    Json(req): Json<SendMessageRequest>,
) -> Response {
    if let Some(resp) = forbidden(&claims, Role::Moderator) {
        return resp;
    }
    let ok = s.dispatcher.send_message(&req.channel_id, &req.content, req.embed);
    delivered(ok, "message:send")
}

/// `POST /api/v1/commands/stats`
pub async fn stats(State(s): State<Arc<AppState>>) -> Response {
    delivered(s.dispatcher.request_stats(), "stats:get")
}
