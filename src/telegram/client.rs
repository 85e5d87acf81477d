//! Telegram client wrapper for the schedule bot.

use std::sync::Arc;

use grammers_client::message::InputMessage;
use grammers_client::update::Update;
use grammers_client::client::UpdatesConfiguration;
use grammers_client::{Client, InvocationError, SenderPool, sender};
use grammers_session::storages::SqliteSession;
use grammers_session::updates::UpdatesLike;
use grammers_tl_types as tl;
use thiserror::Error;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::commands::{BotCommand, CommandHandler, CommandReply, FAILURE_REPLY};
use crate::config::TelegramConfig;

/// Raw update channel produced by the sender pool.
pub type RawUpdatesReceiver = mpsc::UnboundedReceiver<UpdatesLike>;

/// Errors that can occur during Telegram operations.
#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("Not authorized. Sign in with the bot token first.")]
    NotAuthorized,

    #[error("Bot sign in failed: {0}")]
    SignInFailed(String),

    #[error("Flood wait required: {0} seconds")]
    FloodWait(u32),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("API invocation error: {0}")]
    Invocation(String),

    #[error("Failed to upload file: {0}")]
    Upload(#[from] std::io::Error),

    #[error("Update loop is already running")]
    AlreadyRunning,
}

impl From<InvocationError> for TelegramError {
    fn from(err: InvocationError) -> Self {
        let err_str = err.to_string();

        if (err_str.contains("FLOOD_WAIT") || err_str.contains("flood"))
            && let Some(seconds) = extract_flood_wait_seconds(&err_str)
        {
            return Self::FloodWait(seconds);
        }

        Self::Invocation(err_str)
    }
}

/// Extracts flood wait seconds from an error message.
fn extract_flood_wait_seconds(err_msg: &str) -> Option<u32> {
    let lower = err_msg.to_lowercase();

    ["flood_wait_", "flood wait "].iter().find_map(|pattern| {
        let start = lower.find(pattern)? + pattern.len();
        let digits: String = lower[start..]
            .chars()
            .take_while(char::is_ascii_digit)
            .collect();
        digits.parse().ok()
    })
}

/// Telegram bot connection.
pub struct TelegramBot {
    /// The underlying grammers client.
    client: Client,

    /// Handle to the sender pool for disconnection.
    handle: sender::SenderPoolHandle,

    /// Update channel, taken by the first call to [`TelegramBot::run`].
    updates: Mutex<Option<RawUpdatesReceiver>>,

    /// Background task running the sender pool.
    _pool_task: JoinHandle<()>,
}

impl TelegramBot {
    /// Connects to Telegram with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be opened or the connection fails.
    pub async fn connect(config: &TelegramConfig) -> Result<Self, TelegramError> {
        info!("Connecting to Telegram...");

        let session = Arc::new(
            SqliteSession::open(&config.session_path)
                .await
                .map_err(|e| TelegramError::Session(e.to_string()))?,
        );

        let SenderPool {
            runner,
            updates,
            handle,
        } = SenderPool::new(Arc::clone(&session), config.api_id);

        let client = Client::new(handle.clone());

        let pool_task = tokio::spawn(async move {
            runner.run().await;
        });

        let is_authorized = client
            .is_authorized()
            .await
            .map_err(|e| TelegramError::Connection(e.to_string()))?;

        info!("Connected to Telegram. Authorized: {}", is_authorized);

        Ok(Self {
            client,
            handle: handle.thin,
            updates: Mutex::new(Some(updates)),
            _pool_task: pool_task,
        })
    }

    /// Checks if the session is signed in.
    ///
    /// # Errors
    ///
    /// Returns an error if the check fails.
    pub async fn is_authorized(&self) -> Result<bool, TelegramError> {
        self.client
            .is_authorized()
            .await
            .map_err(|e| TelegramError::Connection(e.to_string()))
    }

    /// Signs in with the bot token.
    ///
    /// # Errors
    ///
    /// Returns an error if Telegram rejects the token.
    pub async fn sign_in_bot(&self, config: &TelegramConfig) -> Result<(), TelegramError> {
        info!("Signing in with bot token {}...", mask_token(&config.bot_token));

        self.client
            .bot_sign_in(&config.bot_token, &config.api_hash)
            .await
            .map(|_user| info!("Bot signed in"))
            .map_err(|e| TelegramError::SignInFailed(e.to_string()))
    }

    /// Returns the bot's username, if it has one.
    ///
    /// # Errors
    ///
    /// Returns an error if not authorized or the API call fails.
    pub async fn username(&self) -> Result<Option<String>, TelegramError> {
        if !self.is_authorized().await? {
            return Err(TelegramError::NotAuthorized);
        }

        let me = self.client.get_me().await?;
        Ok(me.username().map(str::to_owned))
    }

    /// Publishes the command menu shown by Telegram clients.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails.
    pub async fn register_commands(&self, commands: &[BotCommand]) -> Result<(), TelegramError> {
        let request = tl::functions::bots::SetBotCommands {
            scope: tl::enums::BotCommandScope::Default,
            lang_code: String::new(),
            commands: commands
                .iter()
                .map(|cmd| {
                    tl::types::BotCommand {
                        command: cmd.name().to_owned(),
                        description: cmd.description().to_owned(),
                    }
                    .into()
                })
                .collect(),
        };

        self.client.invoke(&request).await?;
        info!("Registered {} bot commands", commands.len());
        Ok(())
    }

    /// Answers incoming commands until Ctrl+C is received.
    ///
    /// Each message is handled in its own task, so a slow schedule request
    /// does not hold up other chats.
    ///
    /// # Errors
    ///
    /// Returns an error if the update stream fails or the loop was already started.
    pub async fn run(&self, handler: Arc<CommandHandler>) -> Result<(), TelegramError> {
        let updates = self
            .updates
            .lock()
            .await
            .take()
            .ok_or(TelegramError::AlreadyRunning)?;

        let mut stream = self
            .client
            .stream_updates(
                updates,
                UpdatesConfiguration {
                    catch_up: false,
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| TelegramError::Session(e.to_string()))?;

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        info!("Bot is running. Use Ctrl+C to stop.");

        loop {
            let update = tokio::select! {
                _ = &mut shutdown => {
                    info!("Received Ctrl+C, shutting down...");
                    break;
                }
                update = stream.next() => update?,
            };

            let Update::NewMessage(message) = update else {
                continue;
            };
            if message.outgoing() {
                continue;
            }

            let client = self.client.clone();
            let handler = Arc::clone(&handler);

            tokio::spawn(async move {
                let Some(reply) = handler.try_handle(message.text()).await else {
                    return;
                };

                debug!("Replying to message {}", message.id());

                let sent = match reply {
                    CommandReply::Text(text) => message.reply(text).await,
                    CommandReply::Photo(path) => match client.upload_file(&path).await {
                        Ok(uploaded) => {
                            message
                                .reply(InputMessage::default().photo(uploaded))
                                .await
                        }
                        Err(e) => {
                            error!("Failed to upload {}: {}", path.display(), e);
                            message.reply(FAILURE_REPLY).await
                        }
                    },
                };

                if let Err(e) = sent {
                    match TelegramError::from(e) {
                        TelegramError::FloodWait(seconds) => {
                            warn!("Flood wait from Telegram: {} seconds", seconds);
                        }
                        e => error!("Failed to send reply: {}", e),
                    }
                }
            });
        }

        Ok(())
    }

    /// Disconnects from Telegram.
    pub fn disconnect(&self) {
        info!("Disconnecting from Telegram...");
        self.handle.quit();
    }
}

impl std::fmt::Debug for TelegramBot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramBot").finish_non_exhaustive()
    }
}

/// Masks a bot token for logging (keeps the bot id before the colon).
fn mask_token(token: &str) -> String {
    match token.split_once(':') {
        Some((bot_id, _)) if !bot_id.is_empty() => format!("{bot_id}:***"),
        _ => "***".to_owned(),
    }
}
