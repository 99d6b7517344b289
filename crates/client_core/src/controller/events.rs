//! User actions, async results and error modeling for the chat controller.

use shared::domain::{AuthMode, ChatMessage, ConversationSummary, MessageKey, User};

use crate::error::ClientError;

pub const TRANSPORT_NOTICE: &str = "Could not connect to the server";

/// Direct user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiAction {
    EditUsername(String),
    EditPassword(String),
    EditConfirm(String),
    EditMessage(String),
    SubmitLogin,
    SubmitRegister,
    ShowRegister,
    ShowLogin,
    SearchChanged(String),
    SelectChat(User),
    SendMessage,
    BackToSearch,
    Logout,
    DismissNotice,
}

/// Completed backend calls. Each carries the context it was issued for so the
/// reducer can drop results that arrive after the user moved on.
#[derive(Debug, Clone)]
pub enum UiEvent {
    AuthFinished {
        mode: AuthMode,
        request: u64,
        username: String,
        result: Result<(), ClientError>,
    },
    UsersLoaded {
        epoch: u64,
        query: String,
        result: Result<Vec<User>, ClientError>,
    },
    ConversationsLoaded {
        epoch: u64,
        result: Result<Vec<ConversationSummary>, ClientError>,
    },
    MessagesLoaded {
        epoch: u64,
        peer: String,
        result: Result<Vec<ChatMessage>, ClientError>,
    },
    MessageSent {
        epoch: u64,
        peer: String,
        local_key: MessageKey,
        result: Result<Option<ChatMessage>, ClientError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Validation,
    Auth,
    Transport,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    Login,
    Register,
    Search,
    LoadConversations,
    LoadMessages,
    SendMessage,
}

impl From<AuthMode> for UiErrorContext {
    fn from(value: AuthMode) -> Self {
        match value {
            AuthMode::Login => UiErrorContext::Login,
            AuthMode::Register => UiErrorContext::Register,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_client_error(context: UiErrorContext, err: &ClientError) -> Self {
        let (category, message) = match err {
            ClientError::Validation(err) => (UiErrorCategory::Validation, err.to_string()),
            ClientError::Rejected(text) => {
                let category = match context {
                    UiErrorContext::Login | UiErrorContext::Register => UiErrorCategory::Auth,
                    _ => UiErrorCategory::Unknown,
                };
                (category, text.clone())
            }
            ClientError::Transport(_) => (UiErrorCategory::Transport, TRANSPORT_NOTICE.to_string()),
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    /// Text shown to the user.
    pub fn message(&self) -> &str {
        &self.message
    }
}
