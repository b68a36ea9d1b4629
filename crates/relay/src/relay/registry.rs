// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Connection registry: every live socket, its handshake state and its
//! bounded outbound queue.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::auth::Role;

/// Sender half of a connection's outbound queue.
pub type Outbox = mpsc::Sender<String>;

/// Immutable per-socket identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnId(u64);

impl fmt::Display for ConnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Which side of the relay a connection speaks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelayRole {
    Agent,
    Panel,
}

impl RelayRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Agent => "agent",
            Self::Panel => "panel",
        }
    }
}

/// Handshake state machine of one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    Unassigned,
    Pending(RelayRole),
    Authenticated(RelayRole),
}

impl ConnState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    pub fn is_authenticated_as(&self, role: RelayRole) -> bool {
        *self == Self::Authenticated(role)
    }
}

/// Registry entry for one live socket.
#[derive(Debug, Clone)]
pub struct ConnEntry {
    pub state: ConnState,
    pub outbox: Outbox,
    /// Subject and role of an authenticated panel's access token.
    pub principal: Option<(String, Role)>,
}

/// Live-connection counts for the health endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnCounts {
    pub total: usize,
    pub panels: usize,
}

/// In-memory table of live connections.
///
/// All access goes through a `parking_lot::RwLock` that is never held across
/// an await point.
pub struct ConnectionRegistry {
    next_id: AtomicU64,
    conns: RwLock<HashMap<ConnId, ConnEntry>>,
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self { next_id: AtomicU64::new(1), conns: RwLock::new(HashMap::new()) }
    }

    /// Register a new socket in the `Unassigned` state.
    pub fn insert(&self, outbox: Outbox) -> ConnId {
        let id = ConnId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.conns
            .write()
            .insert(id, ConnEntry { state: ConnState::Unassigned, outbox, principal: None });
        id
    }

    pub fn state(&self, id: ConnId) -> Option<ConnState> {
        self.conns.read().get(&id).map(|e| e.state)
    }

    pub fn entry(&self, id: ConnId) -> Option<ConnEntry> {
        self.conns.read().get(&id).cloned()
    }

    /// Mutate one entry under the write lock. Returns `None` if the
    /// connection is gone.
    ///
    /// `f` runs with the registry lock held; it may take the agent slot lock
    /// but nothing else.
    pub fn update<T>(&self, id: ConnId, f: impl FnOnce(&mut ConnEntry) -> T) -> Option<T> {
        let mut conns = self.conns.write();
        conns.get_mut(&id).map(f)
    }

    /// Remove an entry, running `f` on it before the write lock is released.
    pub fn remove_with<T>(&self, id: ConnId, f: impl FnOnce(&ConnEntry) -> T) -> Option<T> {
        let mut conns = self.conns.write();
        conns.remove(&id).map(|entry| f(&entry))
    }

    /// Run `f` against an entry under the read lock.
    pub fn inspect<T>(&self, id: ConnId, f: impl FnOnce(&ConnEntry) -> T) -> Option<T> {
        let conns = self.conns.read();
        conns.get(&id).map(f)
    }

    /// Snapshot the outboxes of every `Authenticated(PANEL)` connection.
    pub fn panel_outboxes(&self) -> Vec<(ConnId, Outbox)> {
        self.conns
            .read()
            .iter()
            .filter(|(_, e)| e.state.is_authenticated_as(RelayRole::Panel))
            .map(|(id, e)| (*id, e.outbox.clone()))
            .collect()
    }

    pub fn counts(&self) -> ConnCounts {
        let conns = self.conns.read();
        let panels =
            conns.values().filter(|e| e.state.is_authenticated_as(RelayRole::Panel)).count();
        ConnCounts { total: conns.len(), panels }
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
