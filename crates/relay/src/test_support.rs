// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Helpers for integration tests: in-memory state and a real TCP server.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::RelayConfig;
use crate::state::AppState;

pub const TEST_AGENT_SECRET: &str = "test-agent-secret";
pub const TEST_TOKEN_SECRET: &str = "test-token-secret";

/// Config with fixed secrets and an in-memory store.
pub fn test_config() -> RelayConfig {
    RelayConfig {
        host: "127.0.0.1".to_owned(),
        port: 0,
        agent_secret: Some(TEST_AGENT_SECRET.to_owned()),
        token_secret: Some(TEST_TOKEN_SECRET.to_owned()),
        ..RelayConfig::default()
    }
}

/// Shared state built from `config` with a fresh shutdown token.
pub fn test_state(config: RelayConfig) -> anyhow::Result<Arc<AppState>> {
    crate::build_state(config, CancellationToken::new())
}

/// Spawn an HTTP server on a random port for integration testing.
///
/// Returns the bound address and a join handle for the server task.
pub async fn spawn_http_server(
    state: Arc<AppState>,
) -> anyhow::Result<(std::net::SocketAddr, tokio::task::JoinHandle<()>)> {
    let router = crate::transport::build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok((addr, handle))
}
