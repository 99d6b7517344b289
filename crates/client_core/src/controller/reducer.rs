//! Pure state transitions. Every user action and every completed backend call
//! goes through [`update`], which mutates [`AppState`] and returns the effects
//! the controller must run.

use shared::domain::{AuthMode, ChatMessage, Screen, User};
use tracing::{debug, info, warn};

use crate::{
    controller::{
        commands::{BackendCommand, Effect},
        events::{UiAction, UiError, UiErrorContext, UiEvent},
        state::{AppState, Notice, SessionDrafts},
    },
    error::ClientError,
    validation::{validate_login, validate_registration},
};

#[derive(Debug, Clone)]
pub enum Msg {
    Action(UiAction),
    Event(UiEvent),
}

impl From<UiAction> for Msg {
    fn from(value: UiAction) -> Self {
        Msg::Action(value)
    }
}

impl From<UiEvent> for Msg {
    fn from(value: UiEvent) -> Self {
        Msg::Event(value)
    }
}

pub fn update(state: &mut AppState, msg: Msg) -> Vec<Effect> {
    match msg {
        Msg::Action(action) => apply_action(state, action),
        Msg::Event(event) => apply_event(state, event),
    }
}

fn apply_action(state: &mut AppState, action: UiAction) -> Vec<Effect> {
    match action {
        UiAction::EditUsername(value) => {
            state.drafts.username = value;
            Vec::new()
        }
        UiAction::EditPassword(value) => {
            state.drafts.password = value;
            Vec::new()
        }
        UiAction::EditConfirm(value) => {
            state.drafts.confirm = value;
            Vec::new()
        }
        UiAction::EditMessage(value) => {
            state.drafts.message = value;
            Vec::new()
        }
        UiAction::SubmitLogin => submit_auth(state, AuthMode::Login),
        UiAction::SubmitRegister => submit_auth(state, AuthMode::Register),
        UiAction::ShowRegister => switch_form(state, Screen::Login, Screen::Register),
        UiAction::ShowLogin => switch_form(state, Screen::Register, Screen::Login),
        UiAction::SearchChanged(query) => {
            state.drafts.search = query;
            if state.screen == Screen::Search && state.is_authenticated() {
                vec![list_users(state)]
            } else {
                Vec::new()
            }
        }
        UiAction::SelectChat(user) => select_chat(state, user),
        UiAction::SendMessage => send_message(state),
        UiAction::BackToSearch => {
            if state.screen != Screen::Chat {
                return Vec::new();
            }
            state.screen = Screen::Search;
            state.active_chat = None;
            clear_conversation(state);
            vec![
                Effect::StopPolling,
                list_users(state),
                list_conversations(state),
            ]
        }
        UiAction::Logout => {
            if state.is_authenticated() {
                info!(username = %state.username, "logged out");
            }
            *state = AppState {
                session_epoch: state.session_epoch + 1,
                auth_request: state.auth_request + 1,
                ..AppState::default()
            };
            vec![Effect::StopPolling]
        }
        UiAction::DismissNotice => {
            state.notice = None;
            Vec::new()
        }
    }
}

fn switch_form(state: &mut AppState, from: Screen, to: Screen) -> Vec<Effect> {
    if state.screen == from {
        state.screen = to;
        state.notice = None;
        state.auth_pending = false;
        state.auth_request += 1;
        state.drafts.password.clear();
        state.drafts.confirm.clear();
    }
    Vec::new()
}

fn submit_auth(state: &mut AppState, mode: AuthMode) -> Vec<Effect> {
    if state.auth_pending || state.screen != mode.screen() {
        return Vec::new();
    }

    let drafts = &state.drafts;
    let validated = match mode {
        AuthMode::Login => validate_login(&drafts.username, &drafts.password),
        AuthMode::Register => {
            validate_registration(&drafts.username, &drafts.password, &drafts.confirm)
        }
    };

    match validated {
        Ok(credentials) => {
            state.auth_pending = true;
            state.auth_request += 1;
            state.notice = None;
            vec![Effect::Backend(BackendCommand::Authenticate {
                mode,
                request: state.auth_request,
                credentials,
            })]
        }
        Err(err) => {
            let err = UiError::from_client_error(mode.into(), &ClientError::from(err));
            state.notice = Some(Notice::error(err.message()));
            Vec::new()
        }
    }
}

fn select_chat(state: &mut AppState, user: User) -> Vec<Effect> {
    if !state.is_authenticated() || !matches!(state.screen, Screen::Search | Screen::Chat) {
        return Vec::new();
    }

    let peer = user.username.clone();
    state.active_chat = Some(user);
    clear_conversation(state);
    state.screen = Screen::Chat;

    vec![
        fetch_messages(state, peer.clone()),
        Effect::StartPolling {
            epoch: state.session_epoch,
            username: state.username.clone(),
            peer,
        },
    ]
}

fn send_message(state: &mut AppState) -> Vec<Effect> {
    let text = state.drafts.message.trim().to_string();
    if text.is_empty() || state.screen != Screen::Chat {
        return Vec::new();
    }
    let Some(peer) = state.chat_peer().map(str::to_string) else {
        return Vec::new();
    };

    let placeholder = ChatMessage::optimistic(state.username.clone(), peer.clone(), text.clone());
    let local_key = placeholder.key;
    state.messages.push(placeholder);
    state.pending_sends.insert(local_key);
    state.drafts.message.clear();

    vec![Effect::Backend(BackendCommand::SendMessage {
        epoch: state.session_epoch,
        sender: state.username.clone(),
        recipient: peer,
        text,
        local_key,
    })]
}

fn clear_conversation(state: &mut AppState) {
    state.messages.clear();
    state.pending_sends.clear();
    state.unconfirmed_echoes.clear();
    state.drafts.message.clear();
}

fn list_users(state: &AppState) -> Effect {
    Effect::Backend(BackendCommand::ListUsers {
        epoch: state.session_epoch,
        current_user: state.username.clone(),
        query: state.drafts.search.clone(),
    })
}

fn list_conversations(state: &AppState) -> Effect {
    Effect::Backend(BackendCommand::ListConversations {
        epoch: state.session_epoch,
        username: state.username.clone(),
    })
}

fn fetch_messages(state: &AppState, peer: String) -> Effect {
    Effect::Backend(BackendCommand::FetchMessages {
        epoch: state.session_epoch,
        username: state.username.clone(),
        peer,
    })
}

fn apply_event(state: &mut AppState, event: UiEvent) -> Vec<Effect> {
    match event {
        UiEvent::AuthFinished {
            mode,
            request,
            username,
            result,
        } => {
            if !state.auth_pending
                || request != state.auth_request
                || state.screen != mode.screen()
            {
                debug!(action = mode.as_str(), "dropping stale auth result");
                return Vec::new();
            }
            state.auth_pending = false;

            match result {
                Ok(()) => {
                    info!(%username, action = mode.as_str(), "session started");
                    state.notice = Some(Notice::info(format!("Welcome, @{username}")));
                    state.username = username;
                    state.screen = Screen::Search;
                    state.session_epoch += 1;
                    state.drafts = SessionDrafts::default();
                    state.users.clear();
                    state.conversations.clear();
                    vec![list_users(state), list_conversations(state)]
                }
                Err(err) => {
                    report(state, mode.into(), &err);
                    Vec::new()
                }
            }
        }
        UiEvent::UsersLoaded {
            epoch,
            query,
            result,
        } => {
            if epoch != state.session_epoch
                || state.screen != Screen::Search
                || query != state.drafts.search
            {
                debug!(%query, "dropping stale user list");
                return Vec::new();
            }
            match result {
                Ok(users) => state.users = users,
                Err(err) => report(state, UiErrorContext::Search, &err),
            }
            Vec::new()
        }
        UiEvent::ConversationsLoaded { epoch, result } => {
            if epoch != state.session_epoch || state.screen != Screen::Search {
                debug!("dropping stale conversation summary");
                return Vec::new();
            }
            match result {
                Ok(conversations) => state.conversations = conversations,
                Err(err) => report(state, UiErrorContext::LoadConversations, &err),
            }
            Vec::new()
        }
        UiEvent::MessagesLoaded {
            epoch,
            peer,
            result,
        } => {
            if !state.is_current_chat(epoch, &peer) {
                debug!(%peer, "dropping stale message list");
                return Vec::new();
            }
            match result {
                Ok(messages) => {
                    // The server list is authoritative. Unacknowledged placeholders
                    // and echoes the list does not contain yet survive a refresh.
                    let AppState {
                        messages: buffer,
                        pending_sends,
                        unconfirmed_echoes,
                        ..
                    } = &mut *state;
                    unconfirmed_echoes
                        .retain(|key| !messages.iter().any(|message| message.key == *key));
                    let carried: Vec<ChatMessage> = buffer
                        .drain(..)
                        .filter(|message| {
                            pending_sends.contains(&message.key)
                                || unconfirmed_echoes.contains(&message.key)
                        })
                        .collect();
                    *buffer = messages;
                    buffer.extend(carried);
                }
                Err(err) => report(state, UiErrorContext::LoadMessages, &err),
            }
            Vec::new()
        }
        UiEvent::MessageSent {
            epoch,
            peer,
            local_key,
            result,
        } => {
            if !state.is_current_chat(epoch, &peer) {
                debug!(%peer, "dropping stale send acknowledgement");
                return Vec::new();
            }
            state.pending_sends.remove(&local_key);

            match result {
                Ok(stored) => {
                    match stored {
                        Some(stored) if state.messages.iter().any(|m| m.key == stored.key) => {
                            // A refresh already delivered the stored row.
                            state.messages.retain(|message| message.key != local_key);
                        }
                        Some(stored) => {
                            if let Some(slot) = state
                                .messages
                                .iter_mut()
                                .find(|message| message.key == local_key)
                            {
                                state.unconfirmed_echoes.insert(stored.key);
                                *slot = stored;
                            }
                        }
                        None => {}
                    }
                    vec![fetch_messages(state, peer)]
                }
                Err(err) => {
                    state.messages.retain(|message| message.key != local_key);
                    report(state, UiErrorContext::SendMessage, &err);
                    Vec::new()
                }
            }
        }
    }
}

fn report(state: &mut AppState, context: UiErrorContext, err: &ClientError) {
    let err_ui = UiError::from_client_error(context, err);
    warn!(context = ?err_ui.context(), category = ?err_ui.category(), "request failed: {err}");
    state.notice = Some(Notice::error(err_ui.message()));
}

#[cfg(test)]
#[path = "tests/reducer_tests.rs"]
mod tests;
