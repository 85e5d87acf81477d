//! TefCON Bot - Main Entry Point
//!
//! A Telegram bot that answers conference schedule commands from the
//! schedule API.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use tefcon_bot::commands::{BotCommand, CommandHandler};
use tefcon_bot::config::{BotSettings, TelegramConfig};
use tefcon_bot::schedule::FeedClient;
use tefcon_bot::telegram::TelegramBot;

/// Telegram bot for the conference schedule.
#[derive(Parser, Debug)]
#[command(name = "tefcon_bot")]
#[command(about = "Answer conference schedule questions on Telegram")]
#[command(version)]
struct Args {
    /// Path to the .env file for environment variables.
    #[arg(long, default_value = ".env")]
    env_file: String,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Skip publishing the command menu to Telegram on startup.
    #[arg(long)]
    skip_command_menu: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level);

    if let Err(e) = dotenvy::from_filename(&args.env_file) {
        debug!("Could not load .env file ({}): {}", args.env_file, e);
    }

    let tg_config = TelegramConfig::from_env()
        .context("Failed to load Telegram configuration from environment")?;

    let settings = BotSettings::from_env_with_defaults();

    let feed = FeedClient::new(&settings.feed).context("Failed to build schedule API client")?;

    info!(
        "Schedule API: {} (timeout {}s)",
        feed.base_url(),
        settings.feed.timeout_secs
    );

    if !settings.map_image_path.exists() {
        warn!(
            "Map image not found at {}; /map will fail until it exists",
            settings.map_image_path.display()
        );
    }

    let bot = TelegramBot::connect(&tg_config)
        .await
        .context("Failed to connect to Telegram")?;

    if !bot.is_authorized().await.context("Failed to check authorization")? {
        bot.sign_in_bot(&tg_config)
            .await
            .context("Failed to sign in with the bot token")?;
    }

    let username = match bot.username().await {
        Ok(username) => username,
        Err(e) => {
            warn!("Could not fetch bot username: {}. Accepting any @mention.", e);
            None
        }
    };

    if let Some(name) = &username {
        info!("Signed in as @{}", name);
    }

    if !args.skip_command_menu
        && let Err(e) = bot.register_commands(&BotCommand::ALL).await
    {
        warn!("Failed to register command menu: {}", e);
    }

    let handler = Arc::new(
        CommandHandler::new(feed, settings.map_image_path).with_bot_username(username),
    );

    let result = bot.run(handler).await;

    info!("Shutting down...");
    bot.disconnect();

    result.context("Update loop failed")
}

/// Initializes the logging subsystem.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
