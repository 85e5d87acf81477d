//! Conference schedule feed.
//!
//! Fetches room and event snapshots from the schedule API and picks
//! the events that are running now or start next.

mod client;
mod error;
mod model;
mod select;

pub use client::{FeedClient, decode_rooms, decode_schedule};
pub use error::ScheduleError;
pub use model::{Activity, ActivityKind, Room, RoomRef, ScheduleItem, Timestamp};
pub use select::{NextSlot, current_events, select_next};
