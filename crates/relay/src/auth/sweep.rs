// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background sweeper for expired refresh credentials and sessions.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::auth::TokenAuthority;

/// Spawn a task that periodically deletes expired credentials until `shutdown`.
///
/// The first tick fires immediately so a restart cleans up stale state.
pub fn spawn_sweeper(
    authority: Arc<TokenAuthority>,
    interval: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = timer.tick() => {}
            }

            match authority.sweep_expired().await {
                Ok(outcome) if outcome.refresh > 0 || outcome.sessions > 0 => {
                    tracing::info!(
                        refresh = outcome.refresh,
                        sessions = outcome.sessions,
                        "swept expired credentials"
                    );
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(err = %e, "credential sweep failed"),
            }
        }
        tracing::debug!("credential sweeper stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::memory::MemoryStore;
    use crate::auth::token::AccessSigner;
    use crate::auth::Role;

    #[tokio::test]
    async fn sweeper_clears_expired_and_stops_on_shutdown() -> anyhow::Result<()> {
        let store = Arc::new(MemoryStore::new());
        let authority = Arc::new(TokenAuthority::new(
            AccessSigner::new(b"sweep"),
            store.clone(),
            Duration::from_secs(60),
            Duration::ZERO,
        ));
        authority.issue_token_pair("u1", "111", Role::User).await?;
        assert_eq!(store.refresh_count(), 1);

        let shutdown = CancellationToken::new();
        let handle = spawn_sweeper(authority, Duration::from_millis(10), shutdown.clone());

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while store.refresh_count() > 0 && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(store.refresh_count(), 0);

        shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(5), handle).await??;
        Ok(())
    }
}
