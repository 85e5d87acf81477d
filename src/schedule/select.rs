//! Current and next event selection.

use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Unbounded};

use chrono::{DateTime, FixedOffset, Utc};

use super::{ScheduleError, ScheduleItem};

/// The nearest future time slot and every item starting in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextSlot {
    /// Start of the slot, in the offset the feed reported it with.
    pub starts_at: DateTime<FixedOffset>,

    /// Items starting at `starts_at`, in feed order.
    pub items: Vec<ScheduleItem>,
}

/// Selects the items in the earliest slot that starts strictly after `now`.
///
/// Items are grouped by start instant, so the same moment written with
/// different UTC offsets lands in one slot.
///
/// # Errors
///
/// - `MalformedTimestamp` if any item's start time does not parse. The whole
///   selection is rejected so a partial slot is never returned.
/// - `NoUpcomingEvents` if nothing starts after `now`, including for an
///   empty snapshot.
pub fn select_next(items: &[ScheduleItem], now: DateTime<Utc>) -> Result<NextSlot, ScheduleError> {
    let mut slots: BTreeMap<DateTime<Utc>, (DateTime<FixedOffset>, Vec<&ScheduleItem>)> =
        BTreeMap::new();

    for item in items {
        let starts_at = item.starts_at()?;
        slots
            .entry(starts_at.with_timezone(&Utc))
            .or_insert_with(|| (starts_at, Vec::new()))
            .1
            .push(item);
    }

    let (_, (starts_at, slot_items)) = slots
        .range((Excluded(now), Unbounded))
        .next()
        .ok_or(ScheduleError::NoUpcomingEvents)?;

    Ok(NextSlot {
        starts_at: *starts_at,
        items: slot_items.iter().map(|&item| item.clone()).collect(),
    })
}

/// Returns the items flagged as currently running, in feed order.
#[must_use]
pub fn current_events(items: &[ScheduleItem]) -> Vec<ScheduleItem> {
    items.iter().filter(|item| item.is_active).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{Activity, ActivityKind, Timestamp};

    fn item(id: i64, start: &str, is_active: bool) -> ScheduleItem {
        ScheduleItem {
            id,
            is_active,
            start_time: Timestamp::new(start),
            end_time: Timestamp::new(start),
            activity: Activity {
                id,
                name: format!("Activity {id}"),
                kind: ActivityKind::Speech,
            },
            room: None,
        }
    }

    fn at(ts: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(ts).unwrap().with_timezone(&Utc)
    }

    fn ids(items: &[ScheduleItem]) -> Vec<i64> {
        let mut ids: Vec<i64> = items.iter().map(|i| i.id).collect();
        ids.sort_unstable();
        ids
    }

    fn sample() -> Vec<ScheduleItem> {
        vec![
            item(1, "2023-11-16T10:00:00Z", false),
            item(2, "2023-11-16T11:00:00Z", true),
            item(3, "2023-11-16T11:00:00Z", false),
        ]
    }

    #[test]
    fn test_next_slot_groups_all_items() {
        let slot = select_next(&sample(), at("2023-11-16T10:30:00Z")).unwrap();
        assert_eq!(ids(&slot.items), vec![2, 3]);
        assert_eq!(slot.starts_at, DateTime::parse_from_rfc3339("2023-11-16T11:00:00Z").unwrap());
    }

    #[test]
    fn test_current_events_only_active() {
        let current = current_events(&sample());
        assert_eq!(ids(&current), vec![2]);
    }

    #[test]
    fn test_empty_snapshot() {
        assert!(matches!(
            select_next(&[], at("2023-11-16T10:30:00Z")),
            Err(ScheduleError::NoUpcomingEvents)
        ));
        assert!(current_events(&[]).is_empty());
    }

    #[test]
    fn test_all_in_past() {
        assert!(matches!(
            select_next(&sample(), at("2023-11-16T12:00:00Z")),
            Err(ScheduleError::NoUpcomingEvents)
        ));
    }

    #[test]
    fn test_slot_starting_now_is_not_next() {
        let slot = select_next(&sample(), at("2023-11-16T10:00:00Z")).unwrap();
        assert_eq!(ids(&slot.items), vec![2, 3]);

        assert!(matches!(
            select_next(&sample(), at("2023-11-16T11:00:00Z")),
            Err(ScheduleError::NoUpcomingEvents)
        ));
    }

    #[test]
    fn test_malformed_timestamp_aborts_selection() {
        let mut items = sample();
        items.push(item(4, "16/11/2023 12:00", false));

        match select_next(&items, at("2023-11-16T10:30:00Z")) {
            Err(ScheduleError::MalformedTimestamp { item_id, .. }) => assert_eq!(item_id, 4),
            other => panic!("expected MalformedTimestamp, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_timestamp_in_past_still_aborts() {
        let items = vec![item(1, "garbage", false), item(2, "2023-11-16T11:00:00Z", false)];
        assert!(matches!(
            select_next(&items, at("2023-11-16T10:30:00Z")),
            Err(ScheduleError::MalformedTimestamp { .. })
        ));
    }

    #[test]
    fn test_compares_instants_not_strings() {
        // As strings "09:30+00:00" < "10:00+01:00", but 10:00+01:00 is 09:00Z.
        let items = vec![
            item(1, "2023-11-16T09:30:00+00:00", false),
            item(2, "2023-11-16T10:00:00+01:00", false),
        ];
        let slot = select_next(&items, at("2023-11-16T08:00:00Z")).unwrap();
        assert_eq!(ids(&slot.items), vec![2]);
    }

    #[test]
    fn test_same_instant_different_offsets_share_slot() {
        let items = vec![
            item(1, "2023-11-16T10:00:00Z", false),
            item(2, "2023-11-16T11:00:00+01:00", false),
            item(3, "2023-11-16T10:00:00.000Z", false),
        ];
        let slot = select_next(&items, at("2023-11-16T09:00:00Z")).unwrap();
        assert_eq!(ids(&slot.items), vec![1, 2, 3]);
    }

    #[test]
    fn test_fractional_seconds_order() {
        let items = vec![
            item(1, "2023-11-16T10:00:00.5Z", false),
            item(2, "2023-11-16T10:00:00.25Z", false),
        ];
        let slot = select_next(&items, at("2023-11-16T09:00:00Z")).unwrap();
        assert_eq!(ids(&slot.items), vec![2]);
    }

    #[test]
    fn test_unordered_feed() {
        let items = vec![
            item(5, "2023-11-16T15:00:00Z", false),
            item(6, "2023-11-16T12:00:00Z", false),
            item(7, "2023-11-16T09:00:00Z", true),
            item(8, "2023-11-16T12:00:00Z", false),
        ];
        let slot = select_next(&items, at("2023-11-16T10:00:00Z")).unwrap();
        assert_eq!(ids(&slot.items), vec![6, 8]);
        assert!(slot.items.iter().all(|i| i.starts_at().unwrap() == slot.starts_at));
    }

    #[test]
    fn test_selection_is_idempotent() {
        let items = sample();
        let now = at("2023-11-16T10:30:00Z");
        let first = select_next(&items, now).unwrap();
        let second = select_next(&items, now).unwrap();
        assert_eq!(ids(&first.items), ids(&second.items));
        assert_eq!(first.starts_at, second.starts_at);
    }

    #[test]
    fn test_current_events_never_grows() {
        let items = vec![
            item(1, "2023-11-16T10:00:00Z", true),
            item(2, "not parsed here", true),
            item(3, "2023-11-16T10:00:00Z", false),
        ];
        let current = current_events(&items);
        assert!(current.len() <= items.len());
        assert!(current.iter().all(|i| i.is_active));
        assert_eq!(ids(&current), vec![1, 2]);
    }
}
