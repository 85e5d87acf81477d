//! Command handler implementation.

use std::fmt::Write as _;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info};

use super::types::{BotCommand, CommandReply};
use crate::schedule::{self, FeedClient, NextSlot, Room, ScheduleError, ScheduleItem};

/// Welcome message for `/start`.
pub const WELCOME_REPLY: &str = "Hola, bienvenido a @tefconbot, tu asistente en la TefCON 2023. \
     Puedes usar el comando /help para ver los comandos disponibles.";

/// Generic reply sent when a command fails.
pub const FAILURE_REPLY: &str = "Ups, algo falló. ¡Qué chopecha!";

/// Reply sent when the schedule has no future slot left.
pub const NO_UPCOMING_REPLY: &str = "No quedan más eventos programados.";

/// Reply sent when no event is flagged as running.
pub const NO_CURRENT_REPLY: &str = "No hay eventos en curso ahora mismo.";

/// Reply sent when the rooms endpoint returns an empty list.
pub const NO_ROOMS_REPLY: &str = "No hay salas disponibles.";

/// Answers bot commands using the schedule feed.
#[derive(Debug, Clone)]
pub struct CommandHandler {
    /// Schedule API client.
    feed: FeedClient,

    /// Image sent for `/map`.
    map_image_path: PathBuf,

    /// The bot's own username, for `/command@username` matching.
    bot_username: Option<String>,
}

impl CommandHandler {
    /// Creates a new command handler.
    #[must_use]
    pub fn new(feed: FeedClient, map_image_path: PathBuf) -> Self {
        Self {
            feed,
            map_image_path,
            bot_username: None,
        }
    }

    /// Sets the bot username used to filter addressed commands.
    #[must_use]
    pub fn with_bot_username(mut self, username: Option<String>) -> Self {
        self.bot_username = username;
        self
    }

    /// Tries to parse and execute a command from a message.
    ///
    /// Returns `None` if the message is not a command.
    pub async fn try_handle(&self, message_text: &str) -> Option<CommandReply> {
        let command = BotCommand::parse(message_text, self.bot_username.as_deref())?;

        debug!(needs_feed = command.needs_feed(), "Handling command: {}", command);
        Some(self.execute(command).await)
    }

    /// Executes a parsed command.
    pub async fn execute(&self, command: BotCommand) -> CommandReply {
        match command {
            BotCommand::Start => CommandReply::text(WELCOME_REPLY),
            BotCommand::Help => CommandReply::text(help_text()),
            BotCommand::Map => CommandReply::Photo(self.map_image_path.clone()),
            BotCommand::Rooms => self.handle_rooms().await,
            BotCommand::CurrentEvents => self.handle_current_events().await,
            BotCommand::NextEvents => self.handle_next_events().await,
        }
    }

    async fn handle_rooms(&self) -> CommandReply {
        match self.feed.fetch_rooms().await {
            Ok(rooms) => CommandReply::text(render_rooms(&rooms)),
            Err(e) => failure("rooms", &e),
        }
    }

    async fn handle_current_events(&self) -> CommandReply {
        match self.feed.fetch_schedule().await {
            Ok(items) => CommandReply::text(render_current_events(&schedule::current_events(&items))),
            Err(e) => failure("current events", &e),
        }
    }

    async fn handle_next_events(&self) -> CommandReply {
        match self.feed.fetch_schedule().await {
            Ok(items) => CommandReply::text(next_events_reply(&items, Utc::now())),
            Err(e) => failure("next events", &e),
        }
    }
}

/// Logs a failed command and returns the generic failure reply.
fn failure(what: &str, err: &ScheduleError) -> CommandReply {
    error!("Error getting {}: {}", what, err);
    CommandReply::text(FAILURE_REPLY)
}

/// Builds the `/help` text from the command list.
#[must_use]
pub fn help_text() -> String {
    let mut text = "Comandos disponibles:".to_owned();
    for cmd in BotCommand::ALL
        .iter()
        .filter(|cmd| !matches!(cmd, BotCommand::Start | BotCommand::Help))
    {
        let _ = write!(text, "\n{cmd} - {}", cmd.description());
    }
    text
}

/// Renders the room list, with occupancy for rooms that have any.
#[must_use]
pub fn render_rooms(rooms: &[Room]) -> String {
    if rooms.is_empty() {
        return NO_ROOMS_REPLY.to_owned();
    }

    let mut text = String::new();
    for room in rooms {
        text.push_str(&room.name);
        if room.occupancy_percent > 0 {
            let _ = write!(text, " ({} % of {})", room.occupancy_percent, room.capacity);
        }
        text.push('\n');
    }
    text
}

/// Renders the running events with their room and occupancy.
#[must_use]
pub fn render_current_events(items: &[ScheduleItem]) -> String {
    if items.is_empty() {
        return NO_CURRENT_REPLY.to_owned();
    }

    let mut text = "Eventos en curso:\n".to_owned();
    for item in items {
        let _ = write!(text, "- {}", item.activity.name);
        if let Some(room) = &item.room {
            let _ = write!(
                text,
                " en {} ({} % of {})",
                room.name, room.occupancy_percent, room.capacity
            );
        }
        text.push('\n');
    }
    text
}

/// Renders the next slot with its local start time.
#[must_use]
pub fn render_next_events(slot: &NextSlot) -> String {
    let time = slot.starts_at.format("%H:%M");

    let mut text = "Próximos eventos:\n".to_owned();
    for item in &slot.items {
        let _ = write!(text, "- {} ({time})", item.activity.name);
        if let Some(room) = &item.room {
            let _ = write!(text, " en {}", room.name);
        }
        text.push('\n');
    }
    text
}

/// Selects the next slot at `now` and renders the reply for it.
///
/// An exhausted schedule gets its own message; a malformed timestamp is
/// logged and answered with the generic failure reply.
#[must_use]
pub fn next_events_reply(items: &[ScheduleItem], now: DateTime<Utc>) -> String {
    match schedule::select_next(items, now) {
        Ok(slot) => {
            debug!("Next slot at {} with {} events", slot.starts_at, slot.items.len());
            render_next_events(&slot)
        }
        Err(ScheduleError::NoUpcomingEvents) => {
            info!("No upcoming events after {}", now);
            NO_UPCOMING_REPLY.to_owned()
        }
        Err(e) => {
            error!("Error getting next events: {}", e);
            FAILURE_REPLY.to_owned()
        }
    }
}
