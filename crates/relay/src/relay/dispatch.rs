// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed command façade over [`Relay::send_to_agent`].

use std::sync::Arc;

use serde_json::Value;

use crate::relay::protocol::AgentCommand;
use crate::relay::Relay;

/// Each method returns whether an agent was reachable and took the command.
#[derive(Clone)]
pub struct CommandDispatcher {
    relay: Arc<Relay>,
}

impl CommandDispatcher {
    pub fn new(relay: Arc<Relay>) -> Self {
        Self { relay }
    }

    pub fn reload_module(&self, name: &str) -> bool {
        self.dispatch(AgentCommand::ReloadModule { name: name.to_owned() })
    }

    pub fn reload_command(&self, name: &str) -> bool {
        self.dispatch(AgentCommand::ReloadCommand { name: name.to_owned() })
    }

    pub fn send_message(&self, channel_id: &str, content: &str, embed: Option<Value>) -> bool {
        self.dispatch(AgentCommand::SendMessage {
            channel_id: channel_id.to_owned(),
            content: content.to_owned(),
            embed,
        })
    }

    pub fn request_stats(&self) -> bool {
        self.dispatch(AgentCommand::RequestStats)
    }

    pub fn dispatch(&self, command: AgentCommand) -> bool {
        self.relay.send_to_agent(&command)
    }
}
