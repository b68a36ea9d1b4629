// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::auth::TokenAuthority;
use crate::config::RelayConfig;
use crate::relay::dispatch::CommandDispatcher;
use crate::relay::Relay;

/// Shared server state.
pub struct AppState {
    pub config: RelayConfig,
    pub authority: Arc<TokenAuthority>,
    pub relay: Arc<Relay>,
    pub dispatcher: CommandDispatcher,
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        config: RelayConfig,
        authority: Arc<TokenAuthority>,
        shutdown: CancellationToken,
    ) -> Self {
        let relay = Arc::new(Relay::new(
            Arc::clone(&authority),
            config.agent_secret.as_deref(),
            config.outbox_capacity,
        ));
        let dispatcher = CommandDispatcher::new(Arc::clone(&relay));
        Self { config, authority, relay, dispatcher, shutdown }
    }
}
