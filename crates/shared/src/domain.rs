use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Screens of the client. Transitions are driven by the controller reducer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    #[default]
    Login,
    Register,
    Search,
    Chat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    Login,
    Register,
}

impl AuthMode {
    pub fn as_str(self) -> &'static str {
        match self {
            AuthMode::Login => "login",
            AuthMode::Register => "register",
        }
    }

    /// The form that issues requests of this mode.
    pub fn screen(self) -> Screen {
        match self {
            AuthMode::Login => Screen::Login,
            AuthMode::Register => Screen::Register,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub last_seen: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            last_seen: None,
        }
    }
}

/// Latest exchange with one peer, as listed on the search screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub peer: String,
    pub last_message: String,
    pub last_message_time: Option<DateTime<Utc>>,
}

/// Identity of a message in the local buffer.
///
/// Server rows carry their database id; optimistic placeholders inserted
/// before the send is acknowledged carry a random local id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKey {
    Server(i64),
    Local(Uuid),
}

impl MessageKey {
    pub fn new_local() -> Self {
        MessageKey::Local(Uuid::new_v4())
    }

    pub fn is_local(&self) -> bool {
        matches!(self, MessageKey::Local(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub key: MessageKey,
    pub text: String,
    pub sender: String,
    pub recipient: String,
    pub timestamp: DateTime<Utc>,
    /// Display flag only; no cryptography is applied to message bodies.
    pub encrypted: bool,
}

impl ChatMessage {
    pub fn optimistic(
        sender: impl Into<String>,
        recipient: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            key: MessageKey::new_local(),
            text: text.into(),
            sender: sender.into(),
            recipient: recipient.into(),
            timestamp: Utc::now(),
            encrypted: true,
        }
    }

    pub fn is_own(&self, username: &str) -> bool {
        self.sender == username
    }
}
