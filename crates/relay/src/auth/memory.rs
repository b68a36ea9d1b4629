// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-local credential store.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::auth::store::{
    AuditRecord, CredentialStore, RefreshRecord, SessionRecord, SweepOutcome,
};

/// Refresh records and sessions, keyed by token and session id.
///
/// Shared by [`MemoryStore`] and the file-backed store, which persists it
/// as a whole.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialSnapshot {
    #[serde(default)]
    pub refresh: HashMap<String, RefreshRecord>,
    #[serde(default)]
    pub sessions: HashMap<String, SessionRecord>,
}

impl CredentialSnapshot {
    pub fn owns_refresh(&self, token: &str, subject: &str) -> bool {
        self.refresh.get(token).is_some_and(|r| r.subject == subject)
    }

    pub fn delete_refresh_for(&mut self, subject: &str) -> usize {
        let before = self.refresh.len();
        self.refresh.retain(|_, r| r.subject != subject);
        before - self.refresh.len()
    }

    pub fn delete_sessions_for(&mut self, subject: &str) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, s| s.subject != subject);
        before - self.sessions.len()
    }

    pub fn sweep_expired(&mut self, now: u64) -> SweepOutcome {
        let refresh_before = self.refresh.len();
        let sessions_before = self.sessions.len();
        self.refresh.retain(|_, r| !r.is_expired(now));
        self.sessions.retain(|_, s| now < s.expires_at);
        SweepOutcome {
            refresh: refresh_before - self.refresh.len(),
            sessions: sessions_before - self.sessions.len(),
        }
    }
}

/// In-memory [`CredentialStore`]. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<CredentialSnapshot>,
    audit: Mutex<Vec<AuditRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refresh_count(&self) -> usize {
        self.state.lock().refresh.len()
    }

    pub fn session(&self, id: &str) -> Option<SessionRecord> {
        self.state.lock().sessions.get(id).cloned()
    }

    pub fn session_count(&self) -> usize {
        self.state.lock().sessions.len()
    }

    pub fn audit_entries(&self) -> Vec<AuditRecord> {
        self.audit.lock().clone()
    }
}

#[async_trait::async_trait]
impl CredentialStore for MemoryStore {
    async fn insert_refresh(&self, record: RefreshRecord) -> anyhow::Result<()> {
        self.state.lock().refresh.insert(record.token.clone(), record);
        Ok(())
    }

    async fn take_refresh(&self, token: &str) -> anyhow::Result<Option<RefreshRecord>> {
        Ok(self.state.lock().refresh.remove(token))
    }

    async fn take_refresh_owned(
        &self,
        token: &str,
        subject: &str,
    ) -> anyhow::Result<Option<RefreshRecord>> {
        let mut state = self.state.lock();
        if !state.owns_refresh(token, subject) {
            return Ok(None);
        }
        Ok(state.refresh.remove(token))
    }

    async fn delete_refresh_for(&self, subject: &str) -> anyhow::Result<usize> {
        Ok(self.state.lock().delete_refresh_for(subject))
    }

    async fn insert_session(&self, session: SessionRecord) -> anyhow::Result<()> {
        self.state.lock().sessions.insert(session.id.clone(), session);
        Ok(())
    }

    async fn delete_session(&self, id: &str) -> anyhow::Result<bool> {
        Ok(self.state.lock().sessions.remove(id).is_some())
    }

    async fn delete_sessions_for(&self, subject: &str) -> anyhow::Result<usize> {
        Ok(self.state.lock().delete_sessions_for(subject))
    }

    async fn append_audit(&self, record: AuditRecord) -> anyhow::Result<()> {
        self.audit.lock().push(record);
        Ok(())
    }

    async fn sweep_expired(&self, now: u64) -> anyhow::Result<SweepOutcome> {
        Ok(self.state.lock().sweep_expired(now))
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
