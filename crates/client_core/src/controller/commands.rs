//! Side effects requested by the reducer and executed by the controller.

use shared::domain::{AuthMode, MessageKey};

use crate::validation::Credentials;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCommand {
    Authenticate {
        mode: AuthMode,
        request: u64,
        credentials: Credentials,
    },
    ListUsers {
        epoch: u64,
        current_user: String,
        query: String,
    },
    ListConversations {
        epoch: u64,
        username: String,
    },
    FetchMessages {
        epoch: u64,
        username: String,
        peer: String,
    },
    SendMessage {
        epoch: u64,
        sender: String,
        recipient: String,
        text: String,
        local_key: MessageKey,
    },
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::Authenticate { mode, .. } => match mode {
                AuthMode::Login => "login",
                AuthMode::Register => "register",
            },
            BackendCommand::ListUsers { .. } => "list_users",
            BackendCommand::ListConversations { .. } => "list_conversations",
            BackendCommand::FetchMessages { .. } => "fetch_messages",
            BackendCommand::SendMessage { .. } => "send_message",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Backend(BackendCommand),
    StartPolling {
        epoch: u64,
        username: String,
        peer: String,
    },
    StopPolling,
}
