//! Command types and definitions.

use std::fmt;
use std::path::PathBuf;

/// Available bot commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    /// Greet the user.
    Start,

    /// Show the command list.
    Help,

    /// Send the venue map.
    Map,

    /// List rooms with their occupancy.
    Rooms,

    /// List the events running right now.
    CurrentEvents,

    /// List the events in the next time slot.
    NextEvents,
}

impl BotCommand {
    /// All commands, in the order they are advertised.
    pub const ALL: [Self; 6] = [
        Self::Start,
        Self::Help,
        Self::Map,
        Self::Rooms,
        Self::CurrentEvents,
        Self::NextEvents,
    ];

    /// Parses a command from a message text.
    ///
    /// The whole message must be the command. A `@username` suffix, as sent
    /// in group chats, is accepted when it names this bot (or when the bot's
    /// username is unknown).
    ///
    /// Returns `None` if the message is not a valid command.
    #[must_use]
    pub fn parse(text: &str, bot_username: Option<&str>) -> Option<Self> {
        let text = text.trim();
        let command = text.strip_prefix('/')?;

        if command.contains(char::is_whitespace) {
            return None;
        }

        let name = match command.split_once('@') {
            Some((name, target)) => {
                if let Some(username) = bot_username
                    && !target.eq_ignore_ascii_case(username)
                {
                    return None;
                }
                name
            }
            None => command,
        };

        Self::ALL
            .into_iter()
            .find(|cmd| name.eq_ignore_ascii_case(cmd.name()))
    }

    /// Returns the command name without the leading slash.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Help => "help",
            Self::Map => "map",
            Self::Rooms => "rooms",
            Self::CurrentEvents => "current_events",
            Self::NextEvents => "next_events",
        }
    }

    /// Returns the command description shown in the Telegram menu.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Start => "Bienvenida",
            Self::Help => "Comandos disponibles",
            Self::Map => "Plano del recinto",
            Self::Rooms => "Salas y ocupación",
            Self::CurrentEvents => "Eventos en curso",
            Self::NextEvents => "Próximos eventos",
        }
    }

    /// Whether answering this command needs a schedule API call.
    #[must_use]
    pub const fn needs_feed(&self) -> bool {
        matches!(self, Self::Rooms | Self::CurrentEvents | Self::NextEvents)
    }
}

impl fmt::Display for BotCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.name())
    }
}

/// Reply produced by a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandReply {
    /// Plain text message.
    Text(String),

    /// Photo uploaded from a local file.
    Photo(PathBuf),
}

impl CommandReply {
    /// Creates a text reply.
    #[must_use]
    pub fn text(message: impl Into<String>) -> Self {
        Self::Text(message.into())
    }
}
