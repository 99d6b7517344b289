use std::{collections::HashMap, sync::Arc, time::Duration};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use shared::domain::{MessageKey, Screen};
use tokio::{net::TcpListener, sync::Mutex, time::timeout};

use super::*;
use crate::controller::{ChatController, Notice};

#[derive(Clone, Default)]
struct ServerState {
    auth_bodies: Arc<Mutex<Vec<Value>>>,
    messaging_bodies: Arc<Mutex<Vec<Value>>>,
    queries: Arc<Mutex<Vec<HashMap<String, String>>>>,
}

async fn handle_auth(
    State(state): State<ServerState>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.auth_bodies.lock().await.push(body.clone());
    match (body["username"].as_str(), body["password"].as_str()) {
        (Some("alice_crypto"), Some("wrongpass")) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"success": false, "error": "Неверный пароль"})),
        ),
        (Some("taken"), _) => (
            StatusCode::CONFLICT,
            Json(json!({"success": false, "error": "Никнейм уже занят"})),
        ),
        (Some("broken"), _) => (StatusCode::BAD_GATEWAY, Json(json!("upstream down"))),
        _ => (
            StatusCode::OK,
            Json(json!({"success": true, "user": {"username": body["username"]}})),
        ),
    }
}

async fn handle_get_messages(
    State(state): State<ServerState>,
    Query(query): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    state.queries.lock().await.push(query.clone());
    if !query.contains_key("username") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Username required"})),
        );
    }
    if !query.contains_key("other_user") {
        return (
            StatusCode::OK,
            Json(json!({
                "messages": [{
                    "other_user": "bob_secure",
                    "last_message": "see you",
                    "last_message_time": "2024-05-01T09:45:00.5"
                }]
            })),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "messages": [{
                "id": 1,
                "sender_username": query.get("other_user"),
                "recipient_username": query.get("username"),
                "message_text": "hello there",
                "encrypted": true,
                "created_at": "2024-05-01T09:30:00.000001"
            }]
        })),
    )
}

async fn handle_post_messages(
    State(state): State<ServerState>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.messaging_bodies.lock().await.push(body.clone());
    match body["action"].as_str() {
        Some("get_users") => (
            StatusCode::OK,
            Json(json!({
                "users": [
                    {"username": "bob_secure", "last_seen": "2024-05-01T09:00:00"},
                    {"username": "charlie_anon", "last_seen": null}
                ]
            })),
        ),
        Some("send") => (
            StatusCode::CREATED,
            Json(json!({
                "success": true,
                "message": {
                    "id": 42,
                    "sender_username": body["sender_username"],
                    "recipient_username": body["recipient_username"],
                    "message_text": body["message_text"],
                    "encrypted": true,
                    "created_at": "2024-05-01T09:31:00"
                }
            })),
        ),
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Invalid action"})),
        ),
    }
}

async fn spawn_chat_server() -> anyhow::Result<(HttpChatBackend, ServerState)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = ServerState::default();
    let app = Router::new()
        .route("/auth", post(handle_auth))
        .route(
            "/messages",
            post(handle_post_messages).get(handle_get_messages),
        )
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    let backend = HttpChatBackend::with_client(
        Client::new(),
        Url::parse(&format!("http://{addr}/auth"))?,
        Url::parse(&format!("http://{addr}/messages"))?,
    );
    Ok((backend, state))
}

fn credentials(username: &str, password: &str) -> Credentials {
    Credentials {
        username: username.into(),
        password: password.into(),
    }
}

#[tokio::test]
async fn login_posts_action_and_credentials() {
    let (backend, state) = spawn_chat_server().await.expect("spawn server");
    backend
        .authenticate(AuthMode::Login, &credentials("alice", "secret1"))
        .await
        .expect("login");

    let bodies = state.auth_bodies.lock().await;
    assert_eq!(
        bodies[0],
        json!({"action": "login", "username": "alice", "password": "secret1"})
    );
}

#[tokio::test]
async fn rejected_auth_keeps_server_error_text() {
    let (backend, _state) = spawn_chat_server().await.expect("spawn server");

    let err = backend
        .authenticate(AuthMode::Login, &credentials("alice_crypto", "wrongpass"))
        .await
        .expect_err("wrong password");
    assert_eq!(err, ClientError::Rejected("Неверный пароль".into()));

    let err = backend
        .authenticate(AuthMode::Register, &credentials("taken", "secret1"))
        .await
        .expect_err("duplicate");
    assert_eq!(err, ClientError::Rejected("Никнейм уже занят".into()));
}

#[tokio::test]
async fn unreadable_auth_failure_is_a_transport_error() {
    let (backend, _state) = spawn_chat_server().await.expect("spawn server");
    let err = backend
        .authenticate(AuthMode::Login, &credentials("broken", "secret1"))
        .await
        .expect_err("bad gateway");
    assert!(matches!(err, ClientError::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let backend = HttpChatBackend::with_client(
        Client::new(),
        Url::parse(&format!("http://{addr}/auth")).expect("url"),
        Url::parse(&format!("http://{addr}/messages")).expect("url"),
    );
    let err = backend
        .list_users("alice", "")
        .await
        .expect_err("nothing listening");
    assert!(matches!(err, ClientError::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn list_users_posts_search_and_current_user() {
    let (backend, state) = spawn_chat_server().await.expect("spawn server");
    let users = backend.list_users("alice", "ob").await.expect("users");

    assert_eq!(users.len(), 2);
    assert_eq!(users[0].username, "bob_secure");
    assert!(users[0].last_seen.is_some());
    assert!(users[1].last_seen.is_none());

    let bodies = state.messaging_bodies.lock().await;
    assert_eq!(
        bodies[0],
        json!({"action": "get_users", "current_user": "alice", "search": "ob"})
    );
}

#[tokio::test]
async fn fetch_messages_sends_both_usernames_as_query() {
    let (backend, state) = spawn_chat_server().await.expect("spawn server");
    let messages = backend
        .fetch_messages("alice", "bob_secure")
        .await
        .expect("messages");

    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].key, MessageKey::Server(1));
    assert_eq!(messages[0].sender, "bob_secure");
    assert_eq!(messages[0].recipient, "alice");
    assert!(messages[0].encrypted);

    let queries = state.queries.lock().await;
    assert_eq!(queries[0].get("username").map(String::as_str), Some("alice"));
    assert_eq!(
        queries[0].get("other_user").map(String::as_str),
        Some("bob_secure")
    );
}

#[tokio::test]
async fn list_conversations_queries_username_only() {
    let (backend, state) = spawn_chat_server().await.expect("spawn server");
    let summaries = backend.list_conversations("alice").await.expect("summaries");

    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].peer, "bob_secure");
    assert_eq!(summaries[0].last_message, "see you");
    assert!(summaries[0].last_message_time.is_some());

    let queries = state.queries.lock().await;
    assert_eq!(queries[0].get("username").map(String::as_str), Some("alice"));
    assert!(!queries[0].contains_key("other_user"));
}

#[tokio::test]
async fn send_returns_stored_message() {
    let (backend, state) = spawn_chat_server().await.expect("spawn server");
    let stored = backend
        .send_message("alice", "bob_secure", "hi")
        .await
        .expect("send")
        .expect("echo");

    assert_eq!(stored.key, MessageKey::Server(42));
    assert_eq!(stored.text, "hi");
    let bodies = state.messaging_bodies.lock().await;
    assert_eq!(
        bodies[0],
        json!({
            "action": "send",
            "sender_username": "alice",
            "recipient_username": "bob_secure",
            "message_text": "hi"
        })
    );
}

#[tokio::test]
async fn controller_surfaces_wrong_password_from_server() {
    let (backend, state) = spawn_chat_server().await.expect("spawn server");
    let mut controller = ChatController::new(Arc::new(backend), Duration::from_secs(3));

    controller.login("alice_crypto", "wrongpass");
    let applied = timeout(Duration::from_secs(5), controller.next_event())
        .await
        .expect("auth response");
    assert!(applied);

    assert_eq!(controller.state().screen, Screen::Login);
    assert_eq!(
        controller.state().notice,
        Some(Notice::error("Неверный пароль"))
    );
    assert!(state.messaging_bodies.lock().await.is_empty());
}
