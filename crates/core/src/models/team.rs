//! Team model and the next-match decision

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{Match, Schedule};
use crate::invariants::assert_team_invariants;

/// A chat group playing on a recurring schedule.
///
/// The team does not cache its current match; the latest occurrence is
/// looked up from storage so there is no stale in-memory duplicate of
/// persisted state.
#[derive(Debug, Clone)]
pub struct Team {
    pub id: Uuid,
    /// External chat/group id, the team's identity towards the transport
    pub chat_id: i64,
    pub name: String,
    pub schedule: Schedule,
    pub created_at: DateTime<Utc>,
}

impl Team {
    pub fn new(chat_id: i64, name: String, schedule: Schedule) -> Self {
        let team = Self {
            id: Uuid::new_v4(),
            chat_id,
            name,
            schedule,
            created_at: Utc::now(),
        };
        assert_team_invariants(&team);
        team
    }

    /// Decide which match represents the team's next occurrence.
    ///
    /// Compares full instants, not calendar days: a match earlier the same
    /// day is already stale. When a new match is materialized the caller
    /// completes and persists `retired`, then inserts `current`.
    pub fn next_match(&self, latest: Option<Match>, now: DateTime<Utc>) -> NextMatch {
        let candidate = self.schedule.next_occurrence(now);
        match latest {
            Some(current) if current.date >= candidate => NextMatch {
                current,
                retired: None,
                is_new: false,
            },
            retired => NextMatch {
                current: Match::new(self.chat_id, candidate),
                retired,
                is_new: true,
            },
        }
    }
}

/// Outcome of the next-match decision
#[derive(Debug)]
pub struct NextMatch {
    pub current: Match,
    pub retired: Option<Match>,
    pub is_new: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    /// 2025-08-04 is a Monday.
    fn instant(day: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, day, h, m, 0).unwrap()
    }

    fn team() -> Team {
        Team::new(
            42,
            "Mighty Tigers".to_string(),
            Schedule::parse("2;09:00").unwrap(),
        )
    }

    #[test]
    fn no_latest_match_creates_one() {
        let decision = team().next_match(None, instant(4, 10, 0));

        assert!(decision.is_new);
        assert!(decision.retired.is_none());
        assert_eq!(decision.current.date, instant(5, 9, 0));
        assert!(!decision.current.completed);
    }

    #[test]
    fn stale_match_is_retired_and_replaced() {
        let team = team();
        let old = Match::new(team.chat_id, instant(5, 9, 0));
        let old_id = old.id;

        // Wednesday: this week's Tuesday slot is gone, next is Aug 12
        let decision = team.next_match(Some(old), instant(6, 10, 0));

        assert!(decision.is_new);
        assert_eq!(decision.current.date, instant(12, 9, 0));
        assert_eq!(decision.retired.map(|m| m.id), Some(old_id));
    }

    #[test]
    fn current_match_is_reused() {
        let team = team();
        let current = Match::new(team.chat_id, instant(5, 9, 0));
        let current_id = current.id;

        let decision = team.next_match(Some(current), instant(4, 10, 0));

        assert!(!decision.is_new);
        assert!(decision.retired.is_none());
        assert_eq!(decision.current.id, current_id);
    }

    #[test]
    fn match_dated_exactly_at_candidate_is_not_replaced() {
        let team = team();
        let now = instant(4, 10, 0);
        let candidate = team.schedule.next_occurrence(now);
        let current = Match::new(team.chat_id, candidate);
        let current_id = current.id;

        let decision = team.next_match(Some(current), now);

        assert!(!decision.is_new);
        assert_eq!(decision.current.id, current_id);
    }

    #[test]
    fn comparison_uses_time_of_day_not_calendar_date() {
        let team = Team::new(
            42,
            "Tigers".to_string(),
            Schedule::parse("2;19:00").unwrap(),
        );
        // latest sits on the right day but at an earlier hour
        let latest = Match::new(team.chat_id, instant(5, 9, 0));

        let decision = team.next_match(Some(latest), instant(4, 10, 0));

        assert!(decision.is_new);
        assert_eq!(decision.current.date, instant(5, 19, 0));
    }
}
