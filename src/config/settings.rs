//! Telegram credentials and schedule feed settings.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SCHEDULE_API_URL};

/// Telegram API configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Telegram API ID (obtain from <https://my.telegram.org>).
    pub api_id: i32,

    /// Telegram API hash (obtain from <https://my.telegram.org>).
    pub api_hash: String,

    /// Bot token issued by `@BotFather`.
    pub bot_token: String,

    /// Path to the session file.
    #[serde(default = "default_session_path")]
    pub session_path: PathBuf,
}

fn default_session_path() -> PathBuf {
    PathBuf::from("tefcon_bot.session")
}

impl TelegramConfig {
    /// Creates a new Telegram configuration.
    #[must_use]
    pub fn new(api_id: i32, api_hash: String, bot_token: String) -> Self {
        Self {
            api_id,
            api_hash,
            bot_token,
            session_path: default_session_path(),
        }
    }

    /// Creates configuration from environment variables.
    ///
    /// Expects `TG_API_ID`, `TG_API_HASH` and `TG_BOT_TOKEN` to be set.
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_id: i32 = std::env::var("TG_API_ID")
            .map_err(|_| ConfigError::MissingEnvVar("TG_API_ID"))?
            .parse()
            .map_err(|_| ConfigError::InvalidApiId)?;

        let api_hash = std::env::var("TG_API_HASH")
            .map_err(|_| ConfigError::MissingEnvVar("TG_API_HASH"))?;

        let bot_token = std::env::var("TG_BOT_TOKEN")
            .map_err(|_| ConfigError::MissingEnvVar("TG_BOT_TOKEN"))?;
        if bot_token.trim().is_empty() {
            return Err(ConfigError::MissingEnvVar("TG_BOT_TOKEN"));
        }

        let session_path = std::env::var("TG_SESSION_PATH")
            .map_or_else(|_| default_session_path(), PathBuf::from);

        Ok(Self {
            api_id,
            api_hash,
            bot_token,
            session_path,
        })
    }
}

// Keeps the hash and token out of logs.
impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("api_id", &self.api_id)
            .field("session_path", &self.session_path)
            .finish_non_exhaustive()
    }
}

/// Connection settings for the schedule API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedSettings {
    /// Base URL, without trailing slash (e.g. `https://tefcon.tid.es/api/v1`).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User agent sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    DEFAULT_SCHEDULE_API_URL.to_owned()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_user_agent() -> String {
    format!("tefcon_bot/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl FeedSettings {
    /// Creates feed settings pointing at the given base URL.
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Creates feed settings from environment variables with defaults.
    #[must_use]
    pub fn from_env_with_defaults() -> Self {
        Self {
            base_url: std::env::var("SCHEDULE_API_URL").unwrap_or_else(|_| default_base_url()),
            timeout_secs: std::env::var("SCHEDULE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|&secs| secs > 0)
                .unwrap_or_else(default_timeout_secs),
            user_agent: default_user_agent(),
        }
    }

    /// Returns the request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Bot-specific settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotSettings {
    /// Schedule API connection settings.
    #[serde(default)]
    pub feed: FeedSettings,

    /// Image sent in reply to `/map`.
    #[serde(default = "default_map_image_path")]
    pub map_image_path: PathBuf,
}

fn default_map_image_path() -> PathBuf {
    PathBuf::from("assets/map.jpg")
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            feed: FeedSettings::default(),
            map_image_path: default_map_image_path(),
        }
    }
}

impl BotSettings {
    /// Creates bot settings from environment variables with defaults.
    #[must_use]
    pub fn from_env_with_defaults() -> Self {
        Self {
            feed: FeedSettings::from_env_with_defaults(),
            map_image_path: std::env::var("MAP_IMAGE_PATH")
                .map_or_else(|_| default_map_image_path(), PathBuf::from),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid API ID format (must be a positive integer)")]
    InvalidApiId,
}
