//! reqwest-backed [`ChatBackend`] talking to the remote auth and messaging endpoints.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{AuthMode, ChatMessage, ConversationSummary, User},
    error::ErrorBody,
    protocol::{
        AuthRequest, AuthResponse, ConversationsResponse, MessagesResponse, MessagingRequest,
        SendResponse, UsersResponse,
    },
};
use tracing::debug;
use url::Url;

use crate::{config::ClientSettings, error::ClientError, validation::Credentials, ChatBackend};

pub struct HttpChatBackend {
    http: Client,
    auth_url: Url,
    messages_url: Url,
}

impl HttpChatBackend {
    pub fn new(settings: &ClientSettings) -> anyhow::Result<Self> {
        Ok(Self::with_client(
            Client::new(),
            settings.auth_endpoint()?,
            settings.messages_endpoint()?,
        ))
    }

    pub fn with_client(http: Client, auth_url: Url, messages_url: Url) -> Self {
        Self {
            http,
            auth_url,
            messages_url,
        }
    }

    async fn post_messaging<T: DeserializeOwned>(
        &self,
        request: &MessagingRequest,
    ) -> Result<T, ClientError> {
        let res = self
            .http
            .post(self.messages_url.clone())
            .json(request)
            .send()
            .await?;
        read_json(res).await
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn authenticate(
        &self,
        mode: AuthMode,
        credentials: &Credentials,
    ) -> Result<(), ClientError> {
        let res = self
            .http
            .post(self.auth_url.clone())
            .json(&AuthRequest {
                action: mode,
                username: credentials.username.clone(),
                password: credentials.password.clone(),
            })
            .send()
            .await?;
        let status = res.status();
        let bytes = res.bytes().await?;

        // Failed logins come back with a non-2xx status and a readable body.
        let body: AuthResponse = serde_json::from_slice(&bytes).map_err(|err| {
            if status.is_success() {
                ClientError::Transport(format!("malformed {} response: {err}", mode.as_str()))
            } else {
                ClientError::Transport(format!("auth endpoint returned {status}"))
            }
        })?;
        debug!(action = mode.as_str(), %status, success = body.success, "auth response");

        if body.success {
            Ok(())
        } else {
            Err(ClientError::Rejected(
                body.error
                    .unwrap_or_else(|| default_rejection(mode).to_string()),
            ))
        }
    }

    async fn list_users(&self, current_user: &str, search: &str) -> Result<Vec<User>, ClientError> {
        let body: UsersResponse = self
            .post_messaging(&MessagingRequest::GetUsers {
                current_user: current_user.to_string(),
                search: search.to_string(),
            })
            .await?;
        Ok(body.users.into_iter().map(User::from).collect())
    }

    async fn fetch_messages(
        &self,
        username: &str,
        other_user: &str,
    ) -> Result<Vec<ChatMessage>, ClientError> {
        let res = self
            .http
            .get(self.messages_url.clone())
            .query(&[("username", username), ("other_user", other_user)])
            .send()
            .await?;
        let body: MessagesResponse = read_json(res).await?;
        Ok(body.messages.into_iter().map(ChatMessage::from).collect())
    }

    async fn list_conversations(
        &self,
        username: &str,
    ) -> Result<Vec<ConversationSummary>, ClientError> {
        let res = self
            .http
            .get(self.messages_url.clone())
            .query(&[("username", username)])
            .send()
            .await?;
        let body: ConversationsResponse = read_json(res).await?;
        Ok(body
            .messages
            .into_iter()
            .map(ConversationSummary::from)
            .collect())
    }

    async fn send_message(
        &self,
        sender: &str,
        recipient: &str,
        text: &str,
    ) -> Result<Option<ChatMessage>, ClientError> {
        let body: SendResponse = self
            .post_messaging(&MessagingRequest::Send {
                sender_username: sender.to_string(),
                recipient_username: recipient.to_string(),
                message_text: text.to_string(),
            })
            .await?;
        if !body.success {
            return Err(ClientError::Rejected(
                body.error
                    .unwrap_or_else(|| "Message was not delivered".to_string()),
            ));
        }
        Ok(body.message.map(ChatMessage::from))
    }
}

fn default_rejection(mode: AuthMode) -> &'static str {
    match mode {
        AuthMode::Login => "Login failed",
        AuthMode::Register => "Registration failed",
    }
}

/// Decodes a success body, or turns an `{"error": ...}` body into a rejection.
async fn read_json<T: DeserializeOwned>(res: Response) -> Result<T, ClientError> {
    let status = res.status();
    let bytes = res.bytes().await?;
    if status.is_success() {
        return serde_json::from_slice(&bytes)
            .map_err(|err| ClientError::Transport(format!("malformed response: {err}")));
    }

    match serde_json::from_slice::<ErrorBody>(&bytes) {
        Ok(body) => Err(ClientError::Rejected(body.error)),
        Err(_) => Err(ClientError::Transport(format!(
            "messaging endpoint returned {status}"
        ))),
    }
}

#[cfg(test)]
#[path = "tests/http_tests.rs"]
mod tests;
