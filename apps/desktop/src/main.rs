use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use clap::Parser;
use client_core::{
    load_settings, ChatBackend, ChatController, HttpChatBackend, MockChatBackend,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

mod input;
mod render;

use input::{parse_line, Command, HELP};
use render::Renderer;

#[derive(Parser, Debug)]
#[command(about = "Terminal client for the SecureChat messaging service")]
struct Args {
    /// Settings file (defaults to ./securechat.toml when present).
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    auth_url: Option<String>,
    #[arg(long)]
    messages_url: Option<String>,
    #[arg(long)]
    poll_interval_ms: Option<u64>,
    /// Use the built-in in-memory backend with demo users instead of the network.
    #[arg(long)]
    offline: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref())?;
    if let Some(v) = args.auth_url {
        settings.auth_url = v;
    }
    if let Some(v) = args.messages_url {
        settings.messages_url = v;
    }
    if let Some(v) = args.poll_interval_ms.filter(|v| *v > 0) {
        settings.poll_interval_ms = v;
    }
    settings.validate()?;

    let backend: Arc<dyn ChatBackend> = if args.offline {
        tracing::info!("using offline demo backend");
        Arc::new(MockChatBackend::with_demo_users())
    } else {
        tracing::info!(auth = %settings.auth_url, messages = %settings.messages_url, "using remote backend");
        Arc::new(HttpChatBackend::new(&settings)?)
    };

    let mut controller = ChatController::new(backend, settings.poll_interval());
    let mut renderer = Renderer::default();
    renderer.render(controller.state());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_line(&line, controller.state()) {
                    Command::Dispatch(actions) => {
                        for action in actions {
                            controller.dispatch(action);
                        }
                    }
                    Command::Help => println!("{HELP}"),
                    Command::Quit => break,
                    Command::Invalid(reason) => println!("? {reason}"),
                }
            }
            Some(event) = controller.recv_event() => controller.handle_event(event),
        }
        renderer.render(controller.state());
    }

    Ok(())
}
