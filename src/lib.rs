//! TefCON Bot Library
//!
//! A Telegram bot answering questions about the conference schedule.
//!
//! This crate provides the core functionality for:
//! - Fetching rooms and events from the schedule API
//! - Selecting the events running now and the next time slot
//! - Parsing chat commands and rendering replies
//! - Connecting to Telegram via `MTProto`

pub mod commands;
pub mod config;
pub mod schedule;
pub mod telegram;
