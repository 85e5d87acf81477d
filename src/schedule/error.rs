//! Schedule feed errors.

use thiserror::Error;

/// Errors returned by the feed client and the event selectors.
#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("Schedule API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Malformed schedule payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Item {item_id} has a malformed start time {value:?}: {source}")]
    MalformedTimestamp {
        item_id: i64,
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("No upcoming events in the schedule")]
    NoUpcomingEvents,
}
