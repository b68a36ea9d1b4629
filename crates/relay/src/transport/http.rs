// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Health endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub agent_connected: bool,
    pub panels: usize,
    pub connections: usize,
}

/// `GET /api/v1/health`
pub async fn health(State(s): State<Arc<AppState>>) -> impl IntoResponse {
    let stats = s.relay.stats();
    Json(HealthResponse {
        status: "running".to_owned(),
        agent_connected: stats.agent_connected,
        panels: stats.panels,
        connections: stats.connections,
    })
}
