// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON-file credential store with atomic writes.
//!
//! The whole credential snapshot is rewritten on every mutation (write tmp +
//! rename). Audit records go to an append-only JSONL file beside it.

use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::auth::memory::CredentialSnapshot;
use crate::auth::store::{
    AuditRecord, CredentialStore, RefreshRecord, SessionRecord, SweepOutcome,
};

/// File-backed [`CredentialStore`].
pub struct FileStore {
    path: PathBuf,
    audit_path: PathBuf,
    state: Mutex<CredentialSnapshot>,
}

impl FileStore {
    /// Open the store at `path`, loading existing state if the file exists.
    pub fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let state = if path.exists() { load(&path)? } else { CredentialSnapshot::default() };
        let audit_path = path.with_extension("audit.jsonl");
        tracing::debug!(
            path = %path.display(),
            refresh = state.refresh.len(),
            sessions = state.sessions.len(),
            "credential store loaded"
        );
        Ok(Self { path, audit_path, state: Mutex::new(state) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn audit_path(&self) -> &Path {
        &self.audit_path
    }

    /// Apply `f` to a copy of the state, persist it, then commit it.
    ///
    /// The lock is held across the write so that concurrent mutations are
    /// serialized and the in-memory state never runs ahead of the disk.
    fn mutate<T>(&self, f: impl FnOnce(&mut CredentialSnapshot) -> T) -> anyhow::Result<T> {
        let mut guard = self.state.lock();
        let mut next = guard.clone();
        let out = f(&mut next);
        save(&self.path, &next)?;
        *guard = next;
        Ok(out)
    }

    /// Remove `token` under the lock when `pred` holds. Nothing is written
    /// otherwise.
    fn take_if(
        &self,
        token: &str,
        pred: impl FnOnce(&CredentialSnapshot) -> bool,
    ) -> anyhow::Result<Option<RefreshRecord>> {
        let mut guard = self.state.lock();
        if !pred(&guard) {
            return Ok(None);
        }
        let mut next = guard.clone();
        let taken = next.refresh.remove(token);
        save(&self.path, &next)?;
        *guard = next;
        Ok(taken)
    }
}

#[async_trait::async_trait]
impl CredentialStore for FileStore {
    async fn insert_refresh(&self, record: RefreshRecord) -> anyhow::Result<()> {
        self.mutate(|s| {
            s.refresh.insert(record.token.clone(), record);
        })
    }

    async fn take_refresh(&self, token: &str) -> anyhow::Result<Option<RefreshRecord>> {
        self.take_if(token, |s| s.refresh.contains_key(token))
    }

    async fn take_refresh_owned(
        &self,
        token: &str,
        subject: &str,
    ) -> anyhow::Result<Option<RefreshRecord>> {
        self.take_if(token, |s| s.owns_refresh(token, subject))
    }

    async fn delete_refresh_for(&self, subject: &str) -> anyhow::Result<usize> {
        self.mutate(|s| s.delete_refresh_for(subject))
    }

    async fn insert_session(&self, session: SessionRecord) -> anyhow::Result<()> {
        self.mutate(|s| {
            s.sessions.insert(session.id.clone(), session);
        })
    }

    async fn delete_session(&self, id: &str) -> anyhow::Result<bool> {
        self.mutate(|s| s.sessions.remove(id).is_some())
    }

    async fn delete_sessions_for(&self, subject: &str) -> anyhow::Result<usize> {
        self.mutate(|s| s.delete_sessions_for(subject))
    }

    async fn append_audit(&self, record: AuditRecord) -> anyhow::Result<()> {
        let mut line = serde_json::to_string(&record)?;
        line.push('\n');
        let mut file =
            std::fs::OpenOptions::new().create(true).append(true).open(&self.audit_path)?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    async fn sweep_expired(&self, now: u64) -> anyhow::Result<SweepOutcome> {
        self.mutate(|s| s.sweep_expired(now))
    }
}

/// Load a credential snapshot from a JSON file.
pub fn load(path: &Path) -> anyhow::Result<CredentialSnapshot> {
    let contents = std::fs::read_to_string(path)?;
    let snapshot: CredentialSnapshot = serde_json::from_str(&contents)?;
    Ok(snapshot)
}

/// Save a credential snapshot atomically (write tmp + rename).
///
/// Uses a unique temp filename (PID + counter) so concurrent writers never
/// share a `.tmp` file.
pub fn save(path: &Path, snapshot: &CredentialSnapshot) -> anyhow::Result<()> {
    use std::sync::atomic::{AtomicU32, Ordering};
    static COUNTER: AtomicU32 = AtomicU32::new(0);

    let json = serde_json::to_string_pretty(snapshot)?;
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    let tmp_name = format!(
        "{}.{}.{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy(),
        std::process::id(),
        seq,
    );
    let tmp_path = path.with_file_name(tmp_name);
    std::fs::write(&tmp_path, json)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
