// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential store boundary: refresh credentials, sessions, audit trail.

use serde::{Deserialize, Serialize};

use crate::auth::Role;

/// An outstanding refresh credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshRecord {
    pub token: String,
    pub subject: String,
    /// External id and role captured at login; carried across rotations.
    pub external_id: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Epoch seconds.
    pub issued_at: u64,
    /// Epoch seconds.
    pub expires_at: u64,
}

impl RefreshRecord {
    pub fn is_expired(&self, now: u64) -> bool {
        now >= self.expires_at
    }
}

/// One logical login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub subject: String,
    pub created_at: u64,
    pub expires_at: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

/// Append-only audit entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub actor: String,
    pub action: String,
    pub target: String,
    pub detail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub at: u64,
}

/// Counts removed by an expiry sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    pub refresh: usize,
    pub sessions: usize,
}

/// Durable storage behind the Token Authority.
///
/// `take_refresh` and `take_refresh_owned` carry a hard atomicity
/// requirement: lookup, any ownership check and delete happen in a single
/// critical section, so concurrent callers presenting the same token observe
/// exactly one `Some`.
#[async_trait::async_trait]
pub trait CredentialStore: Send + Sync {
    async fn insert_refresh(&self, record: RefreshRecord) -> anyhow::Result<()>;

    /// Remove and return the record for `token`, if any.
    async fn take_refresh(&self, token: &str) -> anyhow::Result<Option<RefreshRecord>>;

    /// Like [`take_refresh`](Self::take_refresh), but only removes the record
    /// when it belongs to `subject`. A record owned by anyone else is left in
    /// place and `None` is returned.
    async fn take_refresh_owned(
        &self,
        token: &str,
        subject: &str,
    ) -> anyhow::Result<Option<RefreshRecord>>;

    /// Delete every refresh record owned by `subject`. Returns the count removed.
    async fn delete_refresh_for(&self, subject: &str) -> anyhow::Result<usize>;

    async fn insert_session(&self, session: SessionRecord) -> anyhow::Result<()>;

    /// Returns whether a session was removed.
    async fn delete_session(&self, id: &str) -> anyhow::Result<bool>;

    async fn delete_sessions_for(&self, subject: &str) -> anyhow::Result<usize>;

    async fn append_audit(&self, record: AuditRecord) -> anyhow::Result<()>;

    /// Drop refresh records and sessions whose expiry is at or before `now`.
    async fn sweep_expired(&self, now: u64) -> anyhow::Result<SweepOutcome>;
}
