//! Telegram client wrapper module.
//!
//! Connects the command handler to Telegram: bot sign-in, command menu
//! registration and the update loop.

mod client;

pub use client::{RawUpdatesReceiver, TelegramBot, TelegramError};
