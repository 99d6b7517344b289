//! Application state owned by the controller store.

use std::collections::HashSet;

use shared::domain::{ChatMessage, ConversationSummary, MessageKey, Screen, User};

/// Uncommitted form fields. Cleared after the submission they feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionDrafts {
    pub username: String,
    pub password: String,
    pub confirm: String,
    pub search: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub screen: Screen,
    /// Empty while unauthenticated.
    pub username: String,
    pub drafts: SessionDrafts,
    pub users: Vec<User>,
    pub conversations: Vec<ConversationSummary>,
    pub active_chat: Option<User>,
    pub messages: Vec<ChatMessage>,
    pub notice: Option<Notice>,
    pub auth_pending: bool,
    /// Bumped on every auth submit and form switch; only the latest request's result applies.
    pub auth_request: u64,
    /// Bumped on every login and logout; results from older sessions are dropped.
    pub session_epoch: u64,
    /// Optimistic placeholders whose send has not been acknowledged yet.
    pub pending_sends: HashSet<MessageKey>,
    /// Server echoes of acknowledged sends not yet seen in a fetched list.
    pub unconfirmed_echoes: HashSet<MessageKey>,
}

impl AppState {
    pub fn is_authenticated(&self) -> bool {
        !self.username.is_empty()
    }

    pub fn chat_peer(&self) -> Option<&str> {
        self.active_chat.as_ref().map(|user| user.username.as_str())
    }

    pub fn last_message_with(&self, peer: &str) -> Option<&ConversationSummary> {
        self.conversations
            .iter()
            .find(|summary| summary.peer == peer)
    }

    /// True when a result for `peer` issued in session `epoch` still belongs on screen.
    pub fn is_current_chat(&self, epoch: u64, peer: &str) -> bool {
        epoch == self.session_epoch && self.screen == Screen::Chat && self.chat_peer() == Some(peer)
    }
}
