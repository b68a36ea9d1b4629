// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Relay gateway: one authoritative agent, many panels.
//!
//! Sockets are registered on open, authenticated by a handshake frame, then
//! routed: agent events fan out to every authenticated panel, commands go
//! only to the current slot holder.

pub mod dispatch;
pub mod handshake;
pub mod protocol;
pub mod registry;
pub mod slot;

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::auth::TokenAuthority;
use crate::relay::handshake::{AgentVerifier, ProofCheck};
use crate::relay::protocol::{
    parse_inbound, AgentCommand, AgentEvent, CommandResult, HandshakeReply, Inbound,
};
use crate::relay::registry::{ConnCounts, ConnId, ConnState, ConnectionRegistry, RelayRole};
use crate::relay::slot::{AgentHandle, AgentSlot};

/// Result of a handshake attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeOutcome {
    Accepted,
    Rejected,
    /// Malformed proof, already authenticated, or connection gone. No reply.
    Ignored,
}

/// Snapshot for the health endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayStats {
    pub connections: usize,
    pub panels: usize,
    pub agent_connected: bool,
}

/// The relay gateway.
pub struct Relay {
    registry: ConnectionRegistry,
    slot: AgentSlot,
    authority: Arc<TokenAuthority>,
    verifier: AgentVerifier,
    outbox_capacity: usize,
}

impl Relay {
    pub fn new(
        authority: Arc<TokenAuthority>,
        agent_secret: Option<&str>,
        outbox_capacity: usize,
    ) -> Self {
        let verifier = AgentVerifier::new(agent_secret);
        if !verifier.is_configured() {
            tracing::warn!("no agent secret configured; agent handshakes will be rejected");
        }
        Self {
            registry: ConnectionRegistry::new(),
            slot: AgentSlot::new(),
            authority,
            verifier,
            outbox_capacity: outbox_capacity.max(1),
        }
    }

    /// Register a new socket. The receiver feeds that socket's writer task.
    pub fn open(&self) -> (ConnId, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(self.outbox_capacity);
        let id = self.registry.insert(tx);
        tracing::debug!(conn = %id, "connection opened");
        (id, rx)
    }

    /// Forget a socket. Clears the agent slot if this connection holds it.
    pub fn close(&self, id: ConnId) {
        let released = self.registry.remove_with(id, |_| self.slot.clear_if_eq(id));
        match released {
            Some(true) => tracing::info!(conn = %id, "authoritative agent disconnected"),
            Some(false) => tracing::debug!(conn = %id, "connection closed"),
            None => {}
        }
    }

    pub fn state(&self, id: ConnId) -> Option<ConnState> {
        self.registry.state(id)
    }

    /// Connection currently holding the agent slot.
    pub fn agent(&self) -> Option<ConnId> {
        self.slot.holder()
    }

    pub fn stats(&self) -> RelayStats {
        let ConnCounts { total, panels } = self.registry.counts();
        let agent_connected = self.deliverable_agent().is_some();
        RelayStats { connections: total, panels, agent_connected }
    }

    /// Handle one inbound text frame from `id`.
    pub fn handle_text(&self, id: ConnId, text: &str) {
        match parse_inbound(text) {
            Some(Inbound::Handshake(hs)) => {
                self.authenticate(id, hs.role, &hs.token);
            }
            Some(Inbound::Event(event)) => {
                self.broadcast(id, &event);
            }
            Some(Inbound::Command(command)) => self.panel_command(id, command),
            None => tracing::trace!(conn = %id, "dropping unrecognised frame"),
        }
    }

    /// Run the handshake for `id` declaring `role` with `proof`.
    pub fn authenticate(&self, id: ConnId, role: RelayRole, proof: &str) -> HandshakeOutcome {
        let Some(state) = self.registry.state(id) else {
            return HandshakeOutcome::Ignored;
        };
        if state.is_authenticated() {
            tracing::debug!(conn = %id, "handshake on authenticated connection ignored");
            return HandshakeOutcome::Ignored;
        }

        match role {
            RelayRole::Panel => self.authenticate_panel(id, proof),
            RelayRole::Agent => self.authenticate_agent(id, proof),
        }
    }

    fn authenticate_panel(&self, id: ConnId, token: &str) -> HandshakeOutcome {
        self.registry.update(id, |e| e.state = ConnState::Pending(RelayRole::Panel));

        match self.authority.verify_access(token) {
            Ok(claims) => {
                let accepted = self.registry.update(id, |entry| {
                    entry.state = ConnState::Authenticated(RelayRole::Panel);
                    entry.principal = Some((claims.sub.clone(), claims.role));
                });
                if accepted.is_none() {
                    return HandshakeOutcome::Ignored;
                }
                tracing::info!(
                    conn = %id,
                    subject = %claims.sub,
                    role = %claims.role,
                    "panel authenticated"
                );
                self.reply(id, &HandshakeReply::ok());
                HandshakeOutcome::Accepted
            }
            Err(e) => {
                tracing::debug!(conn = %id, err = %e, "panel handshake rejected");
                self.registry.update(id, |entry| entry.state = ConnState::Unassigned);
                self.reply(id, &HandshakeReply::failed());
                HandshakeOutcome::Rejected
            }
        }
    }

    fn authenticate_agent(&self, id: ConnId, proof: &str) -> HandshakeOutcome {
        match self.verifier.check(proof) {
            ProofCheck::Malformed => {
                tracing::debug!(conn = %id, "malformed agent proof dropped");
                HandshakeOutcome::Ignored
            }
            ProofCheck::Rejected => {
                self.registry.update(id, |e| e.state = ConnState::Pending(RelayRole::Agent));
                tracing::warn!(conn = %id, "agent handshake rejected");
                self.reply(id, &HandshakeReply::failed());
                HandshakeOutcome::Rejected
            }
            ProofCheck::Accepted => {
                // State and slot change together under the registry lock.
                let superseded = self.registry.update(id, |e| {
                    e.state = ConnState::Authenticated(RelayRole::Agent);
                    e.principal = None;
                    self.slot.try_set(AgentHandle { conn: id, outbox: e.outbox.clone() })
                });
                let Some(superseded) = superseded else {
                    return HandshakeOutcome::Ignored;
                };
                match superseded {
                    Some(prev) => {
                        tracing::info!(
                            conn = %id,
                            superseded = %prev,
                            "agent authenticated, previous agent superseded"
                        );
                    }
                    None => tracing::info!(conn = %id, "agent authenticated"),
                }
                self.reply(id, &HandshakeReply::ok());
                HandshakeOutcome::Accepted
            }
        }
    }

    /// Fan an agent event out to every authenticated panel.
    ///
    /// Only the current slot holder may broadcast; anything else is dropped.
    /// Returns the number of panels the frame was queued for.
    pub fn broadcast(&self, from: ConnId, event: &AgentEvent) -> usize {
        let is_holder = self
            .registry
            .inspect(from, |e| {
                e.state.is_authenticated_as(RelayRole::Agent) && self.slot.holder() == Some(from)
            })
            .unwrap_or(false);
        if !is_holder {
            tracing::debug!(conn = %from, "event from non-authoritative connection dropped");
            return 0;
        }

        let frame = match event.to_panel_json() {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(err = %e, "failed to encode panel frame");
                return 0;
            }
        };

        let targets = self.registry.panel_outboxes();
        let mut queued = 0;
        for (conn, outbox) in targets {
            match outbox.try_send(frame.clone()) {
                Ok(()) => queued += 1,
                Err(e) => tracing::debug!(conn = %conn, err = %e, "panel frame dropped"),
            }
        }
        queued
    }

    /// Deliver `command` to the authoritative agent. `false` if there is none
    /// or its queue cannot take the frame. Never retried or buffered.
    pub fn send_to_agent(&self, command: &AgentCommand) -> bool {
        let Some(agent) = self.deliverable_agent() else {
            tracing::debug!(command = command.name(), "no authoritative agent");
            return false;
        };
        let frame = match serde_json::to_string(command) {
            Ok(f) => f,
            Err(e) => {
                tracing::warn!(err = %e, "failed to encode command");
                return false;
            }
        };
        match agent.outbox.try_send(frame) {
            Ok(()) => {
                tracing::debug!(conn = %agent.conn, command = command.name(), "command delivered");
                true
            }
            Err(e) => {
                tracing::warn!(
                    conn = %agent.conn,
                    command = command.name(),
                    err = %e,
                    "agent queue rejected command"
                );
                false
            }
        }
    }

    /// The slot holder, if it is still registered as an authenticated agent.
    fn deliverable_agent(&self) -> Option<AgentHandle> {
        let handle = self.slot.get()?;
        let live = self
            .registry
            .inspect(handle.conn, |e| e.state.is_authenticated_as(RelayRole::Agent))
            .unwrap_or(false);
        live.then_some(handle)
    }

    fn panel_command(&self, id: ConnId, command: AgentCommand) {
        let Some(entry) = self.registry.entry(id) else {
            return;
        };
        if !entry.state.is_authenticated_as(RelayRole::Panel) {
            tracing::debug!(conn = %id, "command from unauthenticated connection dropped");
            return;
        }
        let allowed = entry
            .principal
            .as_ref()
            .is_some_and(|(_, role)| role.at_least(command.required_role()));
        let delivered = if allowed {
            self.send_to_agent(&command)
        } else {
            tracing::info!(conn = %id, command = command.name(), "panel lacks role for command");
            false
        };

        let result = CommandResult { command: command.name().to_owned(), delivered };
        match result.to_json() {
            Ok(frame) => self.send_raw(id, frame),
            Err(e) => tracing::warn!(err = %e, "failed to encode command result"),
        }
    }

    fn reply(&self, id: ConnId, reply: &HandshakeReply) {
        match serde_json::to_string(reply) {
            Ok(frame) => self.send_raw(id, frame),
            Err(e) => tracing::warn!(err = %e, "failed to encode handshake reply"),
        }
    }

    fn send_raw(&self, id: ConnId, frame: String) {
        let Some(outbox) = self.registry.inspect(id, |e| e.outbox.clone()) else {
            return;
        };
        if let Err(e) = outbox.try_send(frame) {
            tracing::debug!(conn = %id, err = %e, "reply dropped");
        }
    }
}

#[cfg(test)]
#[path = "relay_tests.rs"]
mod tests;
