// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Socket wire frames.
//!
//! Inbound frames are recognised by their discriminating key: `type`
//! (handshake), `event` (agent event) or `command` (panel command). Anything
//! outside the closed vocabularies fails to parse and is dropped.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::Role;
use crate::relay::registry::RelayRole;

/// `{ "type": "agent" | "panel", "token": "..." }`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Handshake {
    #[serde(rename = "type")]
    pub role: RelayRole,
    pub token: String,
}

/// `{ "success": bool, "error"?: string }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandshakeReply {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HandshakeReply {
    pub fn ok() -> Self {
        Self { success: true, error: None }
    }

    pub fn failed() -> Self {
        Self { success: false, error: Some("authentication failed".to_owned()) }
    }
}

/// Agent event names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "stats")]
    Stats,
    #[serde(rename = "ready")]
    Ready,
    #[serde(rename = "member:join")]
    MemberJoin,
    #[serde(rename = "member:leave")]
    MemberLeave,
    #[serde(rename = "moderation:action")]
    ModerationAction,
    #[serde(rename = "command:executed")]
    CommandExecuted,
    #[serde(rename = "log")]
    Log,
}

impl EventKind {
    /// Name panels see. Only `stats` is renamed.
    pub fn panel_name(&self) -> &'static str {
        match self {
            Self::Stats => "stats:update",
            Self::Ready => "ready",
            Self::MemberJoin => "member:join",
            Self::MemberLeave => "member:leave",
            Self::ModerationAction => "moderation:action",
            Self::CommandExecuted => "command:executed",
            Self::Log => "log",
        }
    }
}

/// `{ "event": <name>, "data": {...} }` from the agent.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AgentEvent {
    pub event: EventKind,
    #[serde(default)]
    pub data: Value,
}

/// Event frame as delivered to panels.
#[derive(Debug, Serialize)]
pub struct PanelFrame<'a> {
    pub event: &'static str,
    pub data: &'a Value,
}

impl AgentEvent {
    pub fn to_panel_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&PanelFrame { event: self.event.panel_name(), data: &self.data })
    }
}

/// Commands the relay delivers to the agent: `{ "command": <name>, "data": {...} }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", content = "data")]
pub enum AgentCommand {
    #[serde(rename = "reload:module")]
    ReloadModule { name: String },
    #[serde(rename = "reload:command")]
    ReloadCommand { name: String },
    #[serde(rename = "message:send", rename_all = "camelCase")]
    SendMessage {
        channel_id: String,
        content: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        embed: Option<Value>,
    },
    #[serde(rename = "stats:get", with = "empty_data")]
    RequestStats,
}

/// `data` of a command without parameters: absent, `null` or any object on
/// input, always `{}` on output.
mod empty_data {
    use serde::de::IgnoredAny;
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_map(Some(0))?.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<(), D::Error> {
        Option::<IgnoredAny>::deserialize(deserializer).map(|_| ())
    }
}

impl AgentCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ReloadModule { .. } => "reload:module",
            Self::ReloadCommand { .. } => "reload:command",
            Self::SendMessage { .. } => "message:send",
            Self::RequestStats => "stats:get",
        }
    }

    /// Least privileged user role allowed to issue this command.
    pub fn required_role(&self) -> Role {
        match self {
            Self::ReloadModule { .. } | Self::ReloadCommand { .. } => Role::Admin,
            Self::SendMessage { .. } => Role::Moderator,
            Self::RequestStats => Role::User,
        }
    }
}

/// Reply to a panel-submitted command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    pub command: String,
    pub delivered: bool,
}

/// `{ "event": "command:result", "data": {...} }`
#[derive(Debug, Serialize)]
pub struct CommandResultFrame<'a> {
    pub event: &'static str,
    pub data: &'a CommandResult,
}

impl CommandResult {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&CommandResultFrame { event: "command:result", data: self })
    }
}

/// A recognised inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Handshake(Handshake),
    Event(AgentEvent),
    Command(AgentCommand),
}

/// Classify an inbound text frame. `None` for anything unrecognised.
pub fn parse_inbound(text: &str) -> Option<Inbound> {
    let value: Value = serde_json::from_str(text).ok()?;
    let obj = value.as_object()?;
    if obj.contains_key("type") {
        serde_json::from_value(value).ok().map(Inbound::Handshake)
    } else if obj.contains_key("event") {
        serde_json::from_value(value).ok().map(Inbound::Event)
    } else if obj.contains_key("command") {
        serde_json::from_value(value).ok().map(Inbound::Command)
    } else {
        None
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
