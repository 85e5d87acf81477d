//! Wire types for the schedule API.
//!
//! The API returns more fields than the bot needs (room editors, colors,
//! display flags). Unknown fields are ignored by serde, so only what is
//! rendered or selected on is modelled here.

use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};

use super::ScheduleError;

/// Reads a missing or `null` field as its default value.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// An RFC 3339 timestamp exactly as the API sent it.
///
/// Parsing is deferred to the operations that compare times, so a bad value
/// never breaks listings that do not look at it. A missing or `null` value
/// is read as an empty string, which fails to parse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(String);

impl Timestamp {
    /// Wraps a raw timestamp string.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the raw string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parses the value as an RFC 3339 instant, keeping its UTC offset.
    pub fn parse(&self) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
        DateTime::parse_from_rfc3339(&self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of scheduled activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityKind {
    Speech,
    #[default]
    #[serde(other)]
    Other,
}

/// The activity taking place in a schedule slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: i64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    #[serde(rename = "event_type", default, deserialize_with = "null_as_default")]
    pub kind: ActivityKind,
}

/// Room assigned to a schedule item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRef {
    pub id: i64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    /// Current occupancy as a percentage of capacity.
    #[serde(rename = "occupancy", default, deserialize_with = "null_as_default")]
    pub occupancy_percent: i64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub capacity: i64,
}

/// One scheduled activity instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleItem {
    pub id: i64,

    /// Set by the organizers while the activity is running.
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_active: bool,

    #[serde(rename = "start_date_time", default, deserialize_with = "null_as_default")]
    pub start_time: Timestamp,

    #[serde(rename = "end_date_time", default, deserialize_with = "null_as_default")]
    pub end_time: Timestamp,

    #[serde(rename = "event")]
    pub activity: Activity,

    #[serde(rename = "meeting_room", default)]
    pub room: Option<RoomRef>,
}

impl ScheduleItem {
    /// Parses the start time of this item.
    pub fn starts_at(&self) -> Result<DateTime<FixedOffset>, ScheduleError> {
        self.start_time
            .parse()
            .map_err(|source| ScheduleError::MalformedTimestamp {
                item_id: self.id,
                value: self.start_time.as_str().to_owned(),
                source,
            })
    }
}

/// A venue room as listed by the rooms endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: i64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub short_name: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub location: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub capacity: i64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub color: String,

    /// Current occupancy as a percentage of capacity.
    #[serde(rename = "occupancy", default, deserialize_with = "null_as_default")]
    pub occupancy_percent: i64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub show_occupancy: bool,
}
