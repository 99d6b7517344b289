use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::{AuthMode, ChatMessage, ConversationSummary, MessageKey, User};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthRequest {
    pub action: AuthMode,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// POST bodies accepted by the messaging endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum MessagingRequest {
    GetUsers {
        current_user: String,
        search: String,
    },
    Send {
        sender_username: String,
        recipient_username: String,
        message_text: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    pub last_seen: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: i64,
    pub message_text: String,
    pub sender_username: String,
    pub recipient_username: String,
    #[serde(alias = "created_at", deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default = "default_encrypted")]
    pub encrypted: bool,
}

/// One row of the per-peer summary served by `GET ?username=` without `other_user`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub other_user: String,
    #[serde(default)]
    pub last_message: String,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    pub last_message_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsersResponse {
    #[serde(default)]
    pub users: Vec<UserRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessagesResponse {
    #[serde(default)]
    pub messages: Vec<MessageRecord>,
}

/// The summary query reuses the `messages` key of the conversation response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationsResponse {
    #[serde(default)]
    pub messages: Vec<ConversationRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SendResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<MessageRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<UserRecord> for User {
    fn from(value: UserRecord) -> Self {
        Self {
            username: value.username,
            last_seen: value.last_seen,
        }
    }
}

impl From<MessageRecord> for ChatMessage {
    fn from(value: MessageRecord) -> Self {
        Self {
            key: MessageKey::Server(value.id),
            text: value.message_text,
            sender: value.sender_username,
            recipient: value.recipient_username,
            timestamp: value.timestamp,
            encrypted: value.encrypted,
        }
    }
}

impl From<ConversationRecord> for ConversationSummary {
    fn from(value: ConversationRecord) -> Self {
        Self {
            peer: value.other_user,
            last_message: value.last_message,
            last_message_time: value.last_message_time,
        }
    }
}

fn default_encrypted() -> bool {
    true
}

/// Parses ISO-8601 timestamps. Values without an offset (as produced by a
/// naive `isoformat()`) are taken to be UTC.
pub fn parse_wire_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_wire_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{raw}'")))
}

fn deserialize_optional_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(raw) => parse_wire_timestamp(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{raw}'"))),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    use super::*;

    #[test]
    fn auth_request_uses_action_field() {
        let body = serde_json::to_value(AuthRequest {
            action: AuthMode::Register,
            username: "alice".into(),
            password: "secret1".into(),
        })
        .expect("serialize");
        assert_eq!(
            body,
            json!({"action": "register", "username": "alice", "password": "secret1"})
        );
    }

    #[test]
    fn messaging_requests_are_tagged_by_action() {
        let body = serde_json::to_value(MessagingRequest::GetUsers {
            current_user: "alice".into(),
            search: "bo".into(),
        })
        .expect("serialize");
        assert_eq!(
            body,
            json!({"action": "get_users", "current_user": "alice", "search": "bo"})
        );

        let body = serde_json::to_value(MessagingRequest::Send {
            sender_username: "alice".into(),
            recipient_username: "bob".into(),
            message_text: "hi".into(),
        })
        .expect("serialize");
        assert_eq!(body["action"], "send");
        assert_eq!(body["message_text"], "hi");
    }

    #[test]
    fn failed_auth_response_keeps_server_text() {
        let parsed: AuthResponse =
            serde_json::from_value(json!({"success": false, "error": "Неверный пароль"}))
                .expect("parse");
        assert!(!parsed.success);
        assert_eq!(parsed.error.as_deref(), Some("Неверный пароль"));
    }

    #[test]
    fn message_record_accepts_created_at_and_naive_timestamps() {
        let parsed: MessagesResponse = serde_json::from_value(json!({
            "messages": [{
                "id": 4,
                "sender_username": "bob",
                "recipient_username": "alice",
                "message_text": "hey",
                "encrypted": true,
                "created_at": "2024-03-01T10:15:30.123456"
            }]
        }))
        .expect("parse");
        let message = ChatMessage::from(parsed.messages[0].clone());
        assert_eq!(message.key, MessageKey::Server(4));
        assert_eq!(message.sender, "bob");
        assert_eq!(message.timestamp.year(), 2024);
        assert_eq!(message.timestamp.hour(), 10);
    }

    #[test]
    fn user_record_tolerates_null_last_seen() {
        let parsed: UsersResponse = serde_json::from_value(json!({
            "users": [
                {"username": "bob", "last_seen": null},
                {"username": "carol", "last_seen": "2024-03-01T10:15:30+03:00"}
            ]
        }))
        .expect("parse");
        assert!(parsed.users[0].last_seen.is_none());
        assert_eq!(parsed.users[1].last_seen.map(|ts| ts.hour()), Some(7));
    }

    #[test]
    fn conversation_summary_maps_other_user_to_peer() {
        let parsed: ConversationsResponse = serde_json::from_value(json!({
            "messages": [
                {"other_user": "bob", "last_message": "see you", "last_message_time": "2024-03-01T10:15:30"},
                {"other_user": "carol", "last_message": "hi", "last_message_time": null}
            ]
        }))
        .expect("parse");
        let summaries: Vec<ConversationSummary> =
            parsed.messages.into_iter().map(ConversationSummary::from).collect();
        assert_eq!(summaries[0].peer, "bob");
        assert_eq!(summaries[0].last_message, "see you");
        assert_eq!(summaries[0].last_message_time.map(|ts| ts.minute()), Some(15));
        assert!(summaries[1].last_message_time.is_none());
    }

    #[test]
    fn rejects_garbage_timestamps() {
        assert!(parse_wire_timestamp("yesterday").is_none());
        assert!(parse_wire_timestamp("2024-03-01 10:15:30").is_some());
    }
}
