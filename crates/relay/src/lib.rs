// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Guildrelay: realtime relay between one chat-bot agent and many dashboard
//! panels, plus the token authority that admits the panels.

pub mod auth;
pub mod config;
pub mod error;
pub mod relay;
pub mod state;
pub mod test_support;
pub mod transport;

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::auth::authority::signer_from_secret;
use crate::auth::file::FileStore;
use crate::auth::memory::MemoryStore;
use crate::auth::store::CredentialStore;
use crate::auth::sweep::spawn_sweeper;
use crate::auth::TokenAuthority;
use crate::config::RelayConfig;
use crate::state::AppState;
use crate::transport::build_router;

/// Build shared state: credential store, token authority and relay.
pub fn build_state(
    config: RelayConfig,
    shutdown: CancellationToken,
) -> anyhow::Result<Arc<AppState>> {
    let store: Arc<dyn CredentialStore> = match config.store_path {
        Some(ref path) => {
            tracing::info!(path = %path.display(), "using file credential store");
            Arc::new(FileStore::open(path)?)
        }
        None => {
            tracing::info!("using in-memory credential store");
            Arc::new(MemoryStore::new())
        }
    };

    let authority = Arc::new(TokenAuthority::new(
        signer_from_secret(config.token_secret.as_deref()),
        store,
        config.access_ttl(),
        config.refresh_ttl(),
    ));

    Ok(Arc::new(AppState::new(config, authority, shutdown)))
}

/// Run the relay server until shutdown.
pub async fn run(config: RelayConfig) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let shutdown = CancellationToken::new();
    let state = build_state(config, shutdown.clone())?;

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("shutdown requested");
                shutdown.cancel();
            }
        });
    }

    spawn_sweeper(Arc::clone(&state.authority), state.config.sweep_interval(), shutdown.clone());

    let router = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("guildrelay listening on {addr}");
    axum::serve(listener, router).with_graceful_shutdown(shutdown.cancelled_owned()).await?;

    Ok(())
}
