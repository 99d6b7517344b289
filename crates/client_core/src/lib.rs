use async_trait::async_trait;
use shared::domain::{AuthMode, ChatMessage, ConversationSummary, User};

pub mod config;
pub mod controller;
pub mod error;
pub mod http;
pub mod mock;
pub mod validation;

pub use config::{load_settings, ClientSettings};
pub use controller::ChatController;
pub use error::{ClientError, ValidationError};
pub use http::HttpChatBackend;
pub use mock::MockChatBackend;
pub use validation::Credentials;

/// Client-side view of the auth and messaging endpoints.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn authenticate(&self, mode: AuthMode, credentials: &Credentials)
        -> Result<(), ClientError>;

    /// Directory filtered by substring, never including `current_user`.
    async fn list_users(&self, current_user: &str, search: &str) -> Result<Vec<User>, ClientError>;

    /// Full conversation between `username` and `other_user`, oldest first.
    async fn fetch_messages(
        &self,
        username: &str,
        other_user: &str,
    ) -> Result<Vec<ChatMessage>, ClientError>;

    /// Latest message per peer `username` has talked to, ordered by peer.
    async fn list_conversations(
        &self,
        username: &str,
    ) -> Result<Vec<ConversationSummary>, ClientError>;

    /// Returns the stored message when the server echoes it back.
    async fn send_message(
        &self,
        sender: &str,
        recipient: &str,
        text: &str,
    ) -> Result<Option<ChatMessage>, ClientError>;
}
