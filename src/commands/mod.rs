//! Bot command handling module.
//!
//! Parses chat messages into commands and renders the schedule replies.

mod handler;
mod types;

pub use handler::{
    CommandHandler, FAILURE_REPLY, NO_CURRENT_REPLY, NO_ROOMS_REPLY, NO_UPCOMING_REPLY,
    WELCOME_REPLY, help_text, next_events_reply, render_current_events, render_next_events,
    render_rooms,
};
pub use types::{BotCommand, CommandReply};
