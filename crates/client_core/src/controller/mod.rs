//! Controller layer: application state, reducer transitions, and effect orchestration.

use std::{sync::Arc, time::Duration};

use shared::domain::{Screen, User};
use tokio::{
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
};
use tracing::debug;

use crate::{config::DEFAULT_POLL_INTERVAL_MS, ChatBackend};

pub mod commands;
pub mod events;
pub mod orchestration;
pub mod reducer;
pub mod state;

pub use commands::{BackendCommand, Effect};
pub use events::{UiAction, UiError, UiErrorCategory, UiErrorContext, UiEvent};
pub use reducer::{update, Msg};
pub use state::{AppState, Notice, NoticeKind, SessionDrafts};

/// Store owning the [`AppState`]. All mutation goes through [`reducer::update`];
/// backend calls run on spawned tasks and come back through an mpsc channel.
///
/// Must be used from within a tokio runtime.
pub struct ChatController {
    state: AppState,
    backend: Arc<dyn ChatBackend>,
    poll_interval: Duration,
    event_tx: UnboundedSender<UiEvent>,
    event_rx: UnboundedReceiver<UiEvent>,
    poller: Option<JoinHandle<()>>,
}

impl ChatController {
    /// A zero `poll_interval` falls back to the default period.
    pub fn new(backend: Arc<dyn ChatBackend>, poll_interval: Duration) -> Self {
        let poll_interval = if poll_interval.is_zero() {
            Duration::from_millis(DEFAULT_POLL_INTERVAL_MS)
        } else {
            poll_interval
        };
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        Self {
            state: AppState::default(),
            backend,
            poll_interval,
            event_tx,
            event_rx,
            poller: None,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn is_polling(&self) -> bool {
        self.poller
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn dispatch(&mut self, action: UiAction) {
        self.apply(Msg::Action(action));
    }

    /// Waits for the next completed backend call without applying it.
    pub async fn recv_event(&mut self) -> Option<UiEvent> {
        self.event_rx.recv().await
    }

    pub fn handle_event(&mut self, event: UiEvent) {
        self.apply(Msg::Event(event));
    }

    /// Waits for one completed backend call and applies it.
    pub async fn next_event(&mut self) -> bool {
        match self.recv_event().await {
            Some(event) => {
                self.handle_event(event);
                true
            }
            None => false,
        }
    }

    /// Applies every result that is already waiting, returning how many there were.
    pub fn drain_events(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.event_rx.try_recv() {
            self.handle_event(event);
            applied += 1;
        }
        applied
    }

    pub fn login(&mut self, username: &str, password: &str) {
        if self.state.screen == Screen::Register {
            self.dispatch(UiAction::ShowLogin);
        }
        self.dispatch(UiAction::EditUsername(username.to_string()));
        self.dispatch(UiAction::EditPassword(password.to_string()));
        self.dispatch(UiAction::SubmitLogin);
    }

    pub fn register(&mut self, username: &str, password: &str, confirm: &str) {
        if self.state.screen == Screen::Login {
            self.dispatch(UiAction::ShowRegister);
        }
        self.dispatch(UiAction::EditUsername(username.to_string()));
        self.dispatch(UiAction::EditPassword(password.to_string()));
        self.dispatch(UiAction::EditConfirm(confirm.to_string()));
        self.dispatch(UiAction::SubmitRegister);
    }

    pub fn logout(&mut self) {
        self.dispatch(UiAction::Logout);
    }

    pub fn search_users(&mut self, query: &str) {
        self.dispatch(UiAction::SearchChanged(query.to_string()));
    }

    pub fn select_chat(&mut self, user: User) {
        self.dispatch(UiAction::SelectChat(user));
    }

    pub fn send_message(&mut self, text: &str) {
        self.dispatch(UiAction::EditMessage(text.to_string()));
        self.dispatch(UiAction::SendMessage);
    }

    pub fn back_to_search(&mut self) {
        self.dispatch(UiAction::BackToSearch);
    }

    fn apply(&mut self, msg: Msg) {
        for effect in update(&mut self.state, msg) {
            self.run(effect);
        }
    }

    fn run(&mut self, effect: Effect) {
        match effect {
            Effect::Backend(cmd) => {
                orchestration::spawn_backend_command(
                    Arc::clone(&self.backend),
                    cmd,
                    self.event_tx.clone(),
                );
            }
            Effect::StartPolling {
                epoch,
                username,
                peer,
            } => {
                self.stop_polling();
                self.poller = Some(orchestration::spawn_poller(
                    Arc::clone(&self.backend),
                    epoch,
                    username,
                    peer,
                    self.poll_interval,
                    self.event_tx.clone(),
                ));
            }
            Effect::StopPolling => self.stop_polling(),
        }
    }

    fn stop_polling(&mut self) {
        if let Some(handle) = self.poller.take() {
            debug!("stopping message polling");
            handle.abort();
        }
    }
}

impl Drop for ChatController {
    fn drop(&mut self) {
        self.stop_polling();
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
