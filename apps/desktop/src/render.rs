//! Prints what changed in the application state since the previous frame.

use chrono::{DateTime, Local, Utc};
use client_core::controller::{AppState, Notice, NoticeKind};
use shared::domain::{ChatMessage, ConversationSummary, MessageKey, Screen, User};

#[derive(Default)]
pub struct Renderer {
    screen: Option<Screen>,
    notice: Option<Notice>,
    users: Option<(Vec<User>, Vec<ConversationSummary>)>,
    shown: Vec<MessageKey>,
}

impl Renderer {
    pub fn render(&mut self, state: &AppState) {
        if self.screen != Some(state.screen) {
            self.screen = Some(state.screen);
            self.users = None;
            self.shown.clear();
            println!("{}", screen_header(state));
        }

        if state.notice != self.notice {
            if let Some(notice) = &state.notice {
                match notice.kind {
                    NoticeKind::Info => println!("* {}", notice.text),
                    NoticeKind::Error => println!("! {}", notice.text),
                }
            }
            self.notice = state.notice.clone();
        }

        match state.screen {
            Screen::Search => self.render_users(state),
            Screen::Chat => self.render_messages(state),
            Screen::Login | Screen::Register => {}
        }
    }

    fn render_users(&mut self, state: &AppState) {
        if self
            .users
            .as_ref()
            .is_some_and(|(users, conversations)| {
                users == &state.users && conversations == &state.conversations
            })
        {
            return;
        }
        if state.users.is_empty() {
            println!("  no users found");
        }
        for (index, user) in state.users.iter().enumerate() {
            let seen = user
                .last_seen
                .map(|seen| format!(" (last seen {})", clock(seen)))
                .unwrap_or_default();
            println!("  {:>2}. @{}{seen}", index + 1, user.username);
            if let Some(summary) = state.last_message_with(&user.username) {
                println!("      > {}", preview(summary));
            }
        }
        self.users = Some((state.users.clone(), state.conversations.clone()));
    }

    fn render_messages(&mut self, state: &AppState) {
        let keys: Vec<MessageKey> = state.messages.iter().map(|message| message.key).collect();
        if keys == self.shown {
            return;
        }
        let start = if keys.starts_with(&self.shown) {
            self.shown.len()
        } else {
            if !self.shown.is_empty() {
                println!("  ---");
            }
            0
        };
        for message in &state.messages[start..] {
            println!("{}", format_message(message, &state.username));
        }
        self.shown = keys;
    }
}

fn screen_header(state: &AppState) -> String {
    match state.screen {
        Screen::Login => "== SecureChat: sign in ==  /login <user> <pass>  |  /signup".into(),
        Screen::Register => {
            "== SecureChat: create account ==  /register <user> <pass> <confirm>  |  /signin"
                .into()
        }
        Screen::Search => format!(
            "== @{} ==  type to search, /open <n> to chat, /logout",
            state.username
        ),
        Screen::Chat => format!(
            "== chat with @{} (end-to-end encrypted) ==  /back to leave",
            state.chat_peer().unwrap_or_default()
        ),
    }
}

fn format_message(message: &ChatMessage, viewer: &str) -> String {
    let who = if message.is_own(viewer) {
        "you".to_string()
    } else {
        format!("@{}", message.sender)
    };
    let lock = if message.encrypted { " [locked]" } else { "" };
    let pending = if message.key.is_local() { " (sending)" } else { "" };
    format!(
        "[{}] {who}: {}{lock}{pending}",
        clock(message.timestamp),
        message.text
    )
}

fn preview(summary: &ConversationSummary) -> String {
    let mut text: String = summary.last_message.chars().take(40).collect();
    if summary.last_message.chars().count() > 40 {
        text.push_str("...");
    }
    match summary.last_message_time {
        Some(at) => format!("{text} [{}]", clock(at)),
        None => text,
    }
}

fn clock(timestamp: DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format("%H:%M").to_string()
}
