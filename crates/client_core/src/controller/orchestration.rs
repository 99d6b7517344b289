//! Runs reducer effects against a [`ChatBackend`] and feeds results back as [`UiEvent`]s.

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::mpsc::UnboundedSender,
    task::JoinHandle,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::{debug, trace};

use crate::{
    controller::{commands::BackendCommand, events::UiEvent},
    ChatBackend,
};

pub fn spawn_backend_command(
    backend: Arc<dyn ChatBackend>,
    cmd: BackendCommand,
    events: UnboundedSender<UiEvent>,
) -> JoinHandle<()> {
    debug!(command = cmd.name(), "queued backend command");
    tokio::spawn(async move {
        let event = run_backend_command(backend.as_ref(), cmd).await;
        // The controller may already be gone; nothing left to update then.
        let _ = events.send(event);
    })
}

pub async fn run_backend_command(backend: &dyn ChatBackend, cmd: BackendCommand) -> UiEvent {
    match cmd {
        BackendCommand::Authenticate {
            mode,
            request,
            credentials,
        } => {
            let result = backend.authenticate(mode, &credentials).await;
            UiEvent::AuthFinished {
                mode,
                request,
                username: credentials.username,
                result,
            }
        }
        BackendCommand::ListUsers {
            epoch,
            current_user,
            query,
        } => {
            let result = backend.list_users(&current_user, &query).await;
            UiEvent::UsersLoaded {
                epoch,
                query,
                result,
            }
        }
        BackendCommand::ListConversations { epoch, username } => {
            let result = backend.list_conversations(&username).await;
            UiEvent::ConversationsLoaded { epoch, result }
        }
        BackendCommand::FetchMessages {
            epoch,
            username,
            peer,
        } => {
            let result = backend.fetch_messages(&username, &peer).await;
            UiEvent::MessagesLoaded {
                epoch,
                peer,
                result,
            }
        }
        BackendCommand::SendMessage {
            epoch,
            sender,
            recipient,
            text,
            local_key,
        } => {
            let result = backend.send_message(&sender, &recipient, &text).await;
            UiEvent::MessageSent {
                epoch,
                peer: recipient,
                local_key,
                result,
            }
        }
    }
}

/// Re-fetches the conversation every `period` until the handle is aborted.
/// The first tick fires one period after start; selection already fetched once.
pub fn spawn_poller(
    backend: Arc<dyn ChatBackend>,
    epoch: u64,
    username: String,
    peer: String,
    period: Duration,
    events: UnboundedSender<UiEvent>,
) -> JoinHandle<()> {
    debug!(%peer, period_ms = period.as_millis() as u64, "starting message polling");
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            trace!(%peer, "polling messages");
            let result = backend.fetch_messages(&username, &peer).await;
            let event = UiEvent::MessagesLoaded {
                epoch,
                peer: peer.clone(),
                result,
            };
            if events.send(event).is_err() {
                break;
            }
        }
    })
}
