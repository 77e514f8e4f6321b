// src/main.rs

use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// --- Module Declarations ---
mod config;
mod content;
mod error;
mod game_logic;
mod session;

// --- Imports ---
use crate::config::load_settings;
use crate::content::ConfiguredContentStore;
use crate::error::Result as AppResult;
use crate::game_logic::presenter::describe_event;
use crate::game_logic::{ChannelPresenter, GameState, SessionCommand};
use crate::session::{CommandOutcome, SessionHandle};

const HELP: &str = "Commands: category <id> | difficulty <level> | random | next | reveal | \
wildcard | exit-wildcard | lang <tag> | status | quit";

#[tokio::main]
async fn main() -> AppResult<()> {
    // Setup tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("{}=info", env!("CARGO_PKG_NAME")).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load Configuration
    let app_settings = load_settings()?;
    tracing::info!("Configuration loaded: {:?}", app_settings);

    let content_store = Arc::new(ConfiguredContentStore::new(app_settings.content.clone()));

    let (presenter, mut events) = ChannelPresenter::new();
    let game = GameState::new(presenter, app_settings.session.clone());
    let session = SessionHandle::spawn(app_settings.session.command_buffer, game, content_store);

    let render_task = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            println!("{}", describe_event(&event));
        }
    });

    // Initial content load; a failure leaves the session waiting for `lang <tag>`.
    let reply = session
        .execute(SessionCommand::SwitchLanguage {
            language: app_settings.content.default_language.clone(),
        })
        .await?;
    match &reply.outcome {
        CommandOutcome::LoadFailed(message) => {
            tracing::warn!(error = %message, "Initial content load failed");
        }
        _ => tracing::info!(
            content.language = ?reply.context.language,
            phase = ?reply.phase,
            "Session ready"
        ),
    }

    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if matches!(trimmed, "quit" | "exit") {
            break;
        }
        if trimmed == "help" {
            println!("{HELP}");
            continue;
        }

        let command = match trimmed.parse::<SessionCommand>() {
            Ok(command) => command,
            Err(e) => {
                println!("{e}. {HELP}");
                continue;
            }
        };

        let reply = session.execute(command).await?;
        tracing::debug!(
            phase = ?reply.phase,
            pool.remaining = ?reply.context.pool_remaining,
            timer.remaining = ?reply.context.timer_remaining,
            "Command reply"
        );
        if let CommandOutcome::Ignored(reason) = reply.outcome {
            println!("({reason})");
        }
    }

    // Closing the session drops the presenter, which ends the render loop
    // once every queued event has been printed.
    drop(session);
    if let Err(e) = render_task.await {
        tracing::error!(error = %e, "Render task failed");
    }
    tracing::info!("Goodbye");

    Ok(())
}
