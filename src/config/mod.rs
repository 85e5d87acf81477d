//! Configuration module for the schedule bot.
//!
//! Handles loading of Telegram credentials and schedule feed settings
//! from the environment.

mod settings;

pub use settings::{BotSettings, ConfigError, FeedSettings, TelegramConfig};

/// Base URL of the conference schedule API.
pub const DEFAULT_SCHEDULE_API_URL: &str = "https://tefcon.tid.es/api/v1";

/// Request timeout for schedule API calls, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
