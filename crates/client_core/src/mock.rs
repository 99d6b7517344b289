//! In-memory [`ChatBackend`] for offline use: seeded demo users, locally
//! simulated login/registration and a process-local message store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use shared::domain::{AuthMode, ChatMessage, ConversationSummary, MessageKey, User};
use tokio::sync::Mutex;

use crate::{error::ClientError, validation::Credentials, ChatBackend};

pub const DEMO_PASSWORD: &str = "password123";
pub const DEMO_GREETING: &str = "Привет! Это защищенный чат 🔒";
const USER_LIST_LIMIT: usize = 50;

struct MockUser {
    username: String,
    password: String,
    last_seen: DateTime<Utc>,
    greets: bool,
}

#[derive(Default)]
struct MockStore {
    users: Vec<MockUser>,
    messages: Vec<ChatMessage>,
    next_message_id: i64,
}

impl MockStore {
    fn find_user(&self, username: &str) -> Option<&MockUser> {
        self.users
            .iter()
            .find(|user| user.username.eq_ignore_ascii_case(username))
    }

    fn push_message(
        &mut self,
        sender: &str,
        recipient: &str,
        text: &str,
        timestamp: DateTime<Utc>,
    ) -> ChatMessage {
        self.next_message_id += 1;
        let message = ChatMessage {
            key: MessageKey::Server(self.next_message_id),
            text: text.to_string(),
            sender: sender.to_string(),
            recipient: recipient.to_string(),
            timestamp,
            encrypted: true,
        };
        self.messages.push(message.clone());
        message
    }

    fn touch(&mut self, username: &str) {
        if let Some(user) = self
            .users
            .iter_mut()
            .find(|user| user.username == username)
        {
            user.last_seen = Utc::now();
        }
    }
}

#[derive(Default)]
pub struct MockChatBackend {
    store: Mutex<MockStore>,
}

impl MockChatBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_demo_users() -> Self {
        let now = Utc::now();
        let users = [
            ("alice_crypto", now),
            ("bob_secure", now - Duration::minutes(5)),
            ("charlie_anon", now - Duration::minutes(10)),
        ]
        .into_iter()
        .map(|(username, last_seen)| MockUser {
            username: username.to_string(),
            password: DEMO_PASSWORD.to_string(),
            last_seen,
            greets: true,
        })
        .collect();

        Self {
            store: Mutex::new(MockStore {
                users,
                ..MockStore::default()
            }),
        }
    }
}

#[async_trait]
impl ChatBackend for MockChatBackend {
    async fn authenticate(
        &self,
        mode: AuthMode,
        credentials: &Credentials,
    ) -> Result<(), ClientError> {
        let mut store = self.store.lock().await;
        match mode {
            AuthMode::Login => {
                let user = store
                    .find_user(&credentials.username)
                    .ok_or_else(|| ClientError::Rejected("Пользователь не найден".into()))?;
                if user.password != credentials.password {
                    return Err(ClientError::Rejected("Неверный пароль".into()));
                }
                let username = user.username.clone();
                store.touch(&username);
            }
            AuthMode::Register => {
                if store.find_user(&credentials.username).is_some() {
                    return Err(ClientError::Rejected("Никнейм уже занят".into()));
                }
                store.users.push(MockUser {
                    username: credentials.username.clone(),
                    password: credentials.password.clone(),
                    last_seen: Utc::now(),
                    greets: false,
                });
            }
        }
        Ok(())
    }

    async fn list_users(&self, current_user: &str, search: &str) -> Result<Vec<User>, ClientError> {
        let store = self.store.lock().await;
        let search = search.trim().to_lowercase();
        let current_user = current_user.trim();

        let mut users: Vec<&MockUser> = store
            .users
            .iter()
            .filter(|user| user.username != current_user)
            .filter(|user| search.is_empty() || user.username.to_lowercase().contains(&search))
            .collect();
        if search.is_empty() {
            users.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));
        } else {
            users.sort_by(|a, b| a.username.cmp(&b.username));
        }

        Ok(users
            .into_iter()
            .take(USER_LIST_LIMIT)
            .map(|user| User {
                username: user.username.clone(),
                last_seen: Some(user.last_seen),
            })
            .collect())
    }

    async fn fetch_messages(
        &self,
        username: &str,
        other_user: &str,
    ) -> Result<Vec<ChatMessage>, ClientError> {
        if username.trim().is_empty() {
            return Err(ClientError::Rejected("Username required".into()));
        }
        let mut store = self.store.lock().await;
        let in_conversation = |message: &ChatMessage| {
            (message.sender == username && message.recipient == other_user)
                || (message.sender == other_user && message.recipient == username)
        };

        let greets = store
            .users
            .iter()
            .any(|user| user.username == other_user && user.greets);
        if greets && !store.messages.iter().any(in_conversation) {
            store.push_message(
                other_user,
                username,
                DEMO_GREETING,
                Utc::now() - Duration::minutes(1),
            );
        }

        let mut messages: Vec<ChatMessage> = store
            .messages
            .iter()
            .filter(|message| in_conversation(*message))
            .cloned()
            .collect();
        messages.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(messages)
    }

    async fn list_conversations(
        &self,
        username: &str,
    ) -> Result<Vec<ConversationSummary>, ClientError> {
        if username.trim().is_empty() {
            return Err(ClientError::Rejected("Username required".into()));
        }
        let store = self.store.lock().await;

        let mut latest: BTreeMap<&str, &ChatMessage> = BTreeMap::new();
        for message in &store.messages {
            let peer = if message.sender == username {
                message.recipient.as_str()
            } else if message.recipient == username {
                message.sender.as_str()
            } else {
                continue;
            };
            let newer = latest
                .get(peer)
                .map_or(true, |current| message.timestamp >= current.timestamp);
            if newer {
                latest.insert(peer, message);
            }
        }

        Ok(latest
            .into_iter()
            .map(|(peer, message)| ConversationSummary {
                peer: peer.to_string(),
                last_message: message.text.clone(),
                last_message_time: Some(message.timestamp),
            })
            .collect())
    }

    async fn send_message(
        &self,
        sender: &str,
        recipient: &str,
        text: &str,
    ) -> Result<Option<ChatMessage>, ClientError> {
        let (sender, recipient, text) = (sender.trim(), recipient.trim(), text.trim());
        if sender.is_empty() || recipient.is_empty() || text.is_empty() {
            return Err(ClientError::Rejected(
                "Sender, recipient and message_text required".into(),
            ));
        }
        let mut store = self.store.lock().await;
        store.touch(sender);
        Ok(Some(store.push_message(sender, recipient, text, Utc::now())))
    }
}
