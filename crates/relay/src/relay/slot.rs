// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The single authoritative agent slot.

use parking_lot::Mutex;

use crate::relay::registry::{ConnId, Outbox};

/// The connection currently allowed to receive commands.
#[derive(Debug, Clone)]
pub struct AgentHandle {
    pub conn: ConnId,
    pub outbox: Outbox,
}

/// Holds at most one [`AgentHandle`]. Installing a new holder supersedes the
/// old one; the superseded socket stays open but is no longer authoritative.
#[derive(Default)]
pub struct AgentSlot {
    inner: Mutex<Option<AgentHandle>>,
}

impl AgentSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `handle` unconditionally. Returns the superseded holder.
    pub fn try_set(&self, handle: AgentHandle) -> Option<ConnId> {
        self.inner.lock().replace(handle).map(|prev| prev.conn)
    }

    pub fn get(&self) -> Option<AgentHandle> {
        self.inner.lock().clone()
    }

    /// Clear the slot only if `conn` still holds it.
    pub fn clear_if_eq(&self, conn: ConnId) -> bool {
        let mut inner = self.inner.lock();
        if inner.as_ref().is_some_and(|h| h.conn == conn) {
            *inner = None;
            true
        } else {
            false
        }
    }

    pub fn holder(&self) -> Option<ConnId> {
        self.inner.lock().as_ref().map(|h| h.conn)
    }
}
