//! Line-oriented input mapped onto controller actions.

use client_core::controller::{AppState, UiAction};
use shared::domain::{Screen, User};

pub const HELP: &str = "\
commands:
  /login <username> <password>
  /register <username> <password> <confirm>
  /signup, /signin          switch between the register and login forms
  /search [query]           filter the user directory (plain text works too)
  /open <username|number>   open a conversation from the search results
  /back                     return to the search screen
  /logout
  /quit
in a chat, any other line is sent as a message";

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Dispatch(Vec<UiAction>),
    Help,
    Quit,
    Invalid(String),
}

pub fn parse_line(line: &str, state: &AppState) -> Command {
    let line = line.trim_end_matches(['\r', '\n']);
    let Some(rest) = line.strip_prefix('/') else {
        return match state.screen {
            Screen::Chat => Command::Dispatch(vec![
                UiAction::EditMessage(line.to_string()),
                UiAction::SendMessage,
            ]),
            Screen::Search => Command::Dispatch(vec![UiAction::SearchChanged(
                line.trim().to_string(),
            )]),
            Screen::Login | Screen::Register => {
                Command::Invalid("sign in with /login or create an account with /register".into())
            }
        };
    };

    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let args: Vec<&str> = parts.collect();

    match (name, args.as_slice()) {
        ("quit" | "exit", _) => Command::Quit,
        ("help", _) => Command::Help,
        ("login", [username, password]) => Command::Dispatch(vec![
            UiAction::ShowLogin,
            UiAction::EditUsername(username.to_string()),
            UiAction::EditPassword(password.to_string()),
            UiAction::SubmitLogin,
        ]),
        ("login", _) => Command::Invalid("usage: /login <username> <password>".into()),
        ("register", [username, password, confirm]) => Command::Dispatch(vec![
            UiAction::ShowRegister,
            UiAction::EditUsername(username.to_string()),
            UiAction::EditPassword(password.to_string()),
            UiAction::EditConfirm(confirm.to_string()),
            UiAction::SubmitRegister,
        ]),
        ("register", _) => {
            Command::Invalid("usage: /register <username> <password> <confirm>".into())
        }
        ("signup", []) => Command::Dispatch(vec![UiAction::ShowRegister]),
        ("signin", []) => Command::Dispatch(vec![UiAction::ShowLogin]),
        ("search", query) => Command::Dispatch(vec![UiAction::SearchChanged(query.join(" "))]),
        ("open", [target]) => match resolve_user(state, target) {
            Some(user) => Command::Dispatch(vec![UiAction::SelectChat(user)]),
            None => Command::Invalid(format!("no user '{target}' in the current results")),
        },
        ("open", _) => Command::Invalid("usage: /open <username|number>".into()),
        ("back", []) => Command::Dispatch(vec![UiAction::BackToSearch]),
        ("logout", []) => Command::Dispatch(vec![UiAction::Logout]),
        _ => Command::Invalid(format!("unknown command '/{name}', try /help")),
    }
}

fn resolve_user(state: &AppState, target: &str) -> Option<User> {
    if let Ok(index) = target.parse::<usize>() {
        return index
            .checked_sub(1)
            .and_then(|index| state.users.get(index))
            .cloned();
    }
    let target = target.trim_start_matches('@');
    state
        .users
        .iter()
        .find(|user| user.username == target)
        .cloned()
}
