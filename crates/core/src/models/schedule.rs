//! Weekly schedule - slots and the next-occurrence calculation

use chrono::{DateTime, Datelike, Days, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::invariants::assert_schedule_invariants;

/// One weekly recurrence point: ISO weekday (1 = Monday) plus time of day
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Slot {
    pub day: u8,
    pub time: NaiveTime,
}

impl Slot {
    pub fn new(day: u8, time: NaiveTime) -> Self {
        Self { day, time }
    }
}

/// Ordered, non-empty set of distinct weekly slots.
///
/// Immutable after construction; a team changing its match days gets a
/// fresh Schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schedule {
    slots: Vec<Slot>,
}

impl Schedule {
    /// Build a schedule from raw slots. Fails on an empty set or a weekday
    /// outside 1..=7; exact duplicates collapse.
    pub fn new(mut slots: Vec<Slot>) -> Result<Self> {
        if slots.is_empty() {
            return Err(Error::InvalidSchedule(
                "at least one weekday must be a match day".into(),
            ));
        }
        if let Some(slot) = slots.iter().find(|s| !(1..=7).contains(&s.day)) {
            return Err(Error::InvalidSchedule(format!(
                "weekday {} is outside 1..=7",
                slot.day
            )));
        }
        slots.sort();
        slots.dedup();

        let schedule = Self { slots };
        assert_schedule_invariants(&schedule);
        Ok(schedule)
    }

    /// Parse a schedule definition: comma-separated `day;HH:MM` entries,
    /// e.g. `"2;09:00,4;19:30"`.
    pub fn parse(spec: &str) -> Result<Self> {
        let mut slots = Vec::new();
        for entry in spec.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (day, time) = entry.split_once(';').ok_or_else(|| {
                Error::InvalidSchedule(format!("expected `day;HH:MM`, got `{entry}`"))
            })?;
            let day: u8 = day
                .trim()
                .parse()
                .map_err(|_| Error::InvalidSchedule(format!("`{day}` is not a weekday number")))?;
            let time = NaiveTime::parse_from_str(time.trim(), "%H:%M")
                .map_err(|_| Error::InvalidSchedule(format!("`{time}` is not a HH:MM time")))?;
            slots.push(Slot::new(day, time));
        }
        Self::new(slots)
    }

    /// Slots in (weekday, time) order.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Next occurrence strictly after `now`.
    ///
    /// Each slot is placed into the ISO week of `now`; a slot whose instant
    /// is already past (or exactly `now`) does not qualify today. When the
    /// current week is exhausted, the earliest slot wraps to next week.
    pub fn next_occurrence(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let monday = now.date_naive() - Days::new(u64::from(now.weekday().num_days_from_monday()));
        for slot in &self.slots {
            let candidate = (monday + Days::new(u64::from(slot.day) - 1))
                .and_time(slot.time)
                .and_utc();
            if candidate > now {
                return candidate;
            }
        }

        let first = self.slots[0];
        (monday + Days::new(7 + u64::from(first.day) - 1))
            .and_time(first.time)
            .and_utc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    /// 2025-08-04 is a Monday.
    fn instant(day: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, day, h, m, 0).unwrap()
    }

    fn tuesday_nine() -> Schedule {
        Schedule::new(vec![Slot::new(2, at(9, 0))]).unwrap()
    }

    #[test]
    fn empty_schedule_rejected() {
        let err = Schedule::new(Vec::new()).unwrap_err();
        assert!(matches!(err, Error::InvalidSchedule(_)));
    }

    #[test]
    fn out_of_range_weekday_rejected() {
        let err = Schedule::new(vec![Slot::new(8, at(9, 0))]).unwrap_err();
        assert!(matches!(err, Error::InvalidSchedule(_)));
    }

    #[test]
    fn parse_sorts_entries() {
        let schedule = Schedule::parse("4;19:30, 2;09:00").unwrap();
        assert_eq!(
            schedule.slots(),
            &[Slot::new(2, at(9, 0)), Slot::new(4, at(19, 30))]
        );
    }

    #[test]
    fn parse_rejects_malformed_entry() {
        assert!(Schedule::parse("tuesday at nine").is_err());
        assert!(Schedule::parse("2;25:00").is_err());
        assert!(Schedule::parse("0;09:00").is_err());
        assert!(Schedule::parse("").is_err());
    }

    #[test]
    fn duplicate_slots_collapse() {
        let schedule = Schedule::parse("2;09:00,2;09:00,2;19:00").unwrap();
        assert_eq!(schedule.slots().len(), 2);
    }

    #[test]
    fn monday_morning_finds_tuesday_slot() {
        let next = tuesday_nine().next_occurrence(instant(4, 10, 0));
        assert_eq!(next, instant(5, 9, 0));
    }

    #[test]
    fn slot_already_past_wraps_to_next_week() {
        let next = tuesday_nine().next_occurrence(instant(5, 9, 30));
        assert_eq!(next, instant(12, 9, 0));
    }

    #[test]
    fn slot_later_today_still_qualifies() {
        let next = tuesday_nine().next_occurrence(instant(5, 8, 0));
        assert_eq!(next, instant(5, 9, 0));
    }

    #[test]
    fn slot_exactly_now_does_not_qualify() {
        let next = tuesday_nine().next_occurrence(instant(5, 9, 0));
        assert_eq!(next, instant(12, 9, 0));
    }

    #[test]
    fn same_day_slots_pick_earliest_remaining() {
        let schedule = Schedule::parse("2;09:00,2;19:00").unwrap();
        assert_eq!(schedule.next_occurrence(instant(5, 10, 0)), instant(5, 19, 0));
        assert_eq!(schedule.next_occurrence(instant(5, 20, 0)), instant(12, 9, 0));
    }

    #[test]
    fn result_is_always_strictly_after_now() {
        let schedule = Schedule::parse("1;19:00,4;19:00,7;08:30").unwrap();
        let start = instant(4, 0, 0);
        for hour in 0..(3 * 7 * 24) {
            let now = start + Duration::hours(hour);
            assert!(schedule.next_occurrence(now) > now, "failed at {now}");
        }
    }

    #[test]
    fn chained_occurrences_walk_every_slot_in_order() {
        let schedule = Schedule::parse("1;19:00,4;19:00").unwrap();
        let mut now = instant(4, 10, 0);
        let mut dates = Vec::new();
        for _ in 0..6 {
            now = schedule.next_occurrence(now);
            dates.push(now);
        }
        // Mon, Thu, Mon, Thu... strictly increasing, never more than a week apart
        for pair in dates.windows(2) {
            assert!(pair[1] > pair[0]);
            assert!(pair[1] - pair[0] <= Duration::days(7));
        }
        assert_eq!(dates[0], instant(4, 19, 0));
        assert_eq!(dates[1], instant(7, 19, 0));
        assert_eq!(dates[2], instant(11, 19, 0));
        assert_eq!(dates[3], instant(14, 19, 0));
    }
}
