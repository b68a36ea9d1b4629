// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the relay server.
#[derive(Debug, Clone, clap::Args)]
pub struct RelayConfig {
    /// Host to bind on.
    #[arg(long, default_value = "127.0.0.1", env = "GUILDRELAY_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 9700, env = "GUILDRELAY_PORT")]
    pub port: u16,

    /// Shared secret for the agent HMAC handshake. If unset, every agent
    /// handshake is rejected.
    #[arg(long, env = "GUILDRELAY_AGENT_SECRET", hide_env_values = true)]
    pub agent_secret: Option<String>,

    /// Signing key for access tokens. If unset, a random key is generated at
    /// startup and tokens do not survive a restart.
    #[arg(long, env = "GUILDRELAY_TOKEN_SECRET", hide_env_values = true)]
    pub token_secret: Option<String>,

    /// Access token lifetime in seconds.
    #[arg(long, default_value_t = 900, env = "GUILDRELAY_ACCESS_TTL_SECS")]
    pub access_ttl_secs: u64,

    /// Refresh credential lifetime in seconds.
    #[arg(long, default_value_t = 604_800, env = "GUILDRELAY_REFRESH_TTL_SECS")]
    pub refresh_ttl_secs: u64,

    /// Path of the JSON credential store. In-memory when unset.
    #[arg(long, env = "GUILDRELAY_STORE_PATH")]
    pub store_path: Option<PathBuf>,

    /// Expiry sweep interval in milliseconds.
    #[arg(long, default_value_t = 3_600_000, env = "GUILDRELAY_SWEEP_MS")]
    pub sweep_ms: u64,

    /// Per-connection outbound queue depth. Frames for a full queue are dropped.
    #[arg(long, default_value_t = 256, env = "GUILDRELAY_OUTBOX_CAPACITY")]
    pub outbox_capacity: usize,

    /// Mark the refresh cookie `Secure` (HTTPS-only).
    #[arg(long, env = "GUILDRELAY_SECURE_COOKIES")]
    pub secure_cookies: bool,
}

impl RelayConfig {
    pub fn access_ttl(&self) -> Duration {
        Duration::from_secs(self.access_ttl_secs)
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_ms)
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 9700,
            agent_secret: None,
            token_secret: None,
            access_ttl_secs: 900,
            refresh_ttl_secs: 604_800,
            store_path: None,
            sweep_ms: 3_600_000,
            outbox_capacity: 256,
            secure_cookies: false,
        }
    }
}
