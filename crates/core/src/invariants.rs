//! Developer guardrails and invariants
//!
//! Debug assertions for detecting impossible states during development.
//! These checks are compiled out in release builds.

use crate::models::{Match, Schedule, Team};

/// Validate that a schedule's slot set is internally consistent
pub fn assert_schedule_invariants(schedule: &Schedule) {
    debug_assert!(
        !schedule.slots().is_empty(),
        "schedule constructed with no slots"
    );

    debug_assert!(
        schedule.slots().windows(2).all(|w| w[0] < w[1]),
        "schedule slots not strictly ordered: {:?}",
        schedule.slots()
    );

    debug_assert!(
        schedule.slots().iter().all(|s| (1..=7).contains(&s.day)),
        "schedule slot outside ISO weekday range: {:?}",
        schedule.slots()
    );
}

/// Validate that a match's squad is internally consistent
pub fn assert_match_invariants(m: &Match) {
    // handles are the squad's identity; a duplicate would double-count votes
    let mut handles: Vec<&str> = m.squad.iter().map(|p| p.handle.as_str()).collect();
    handles.sort_unstable();
    debug_assert!(
        handles.windows(2).all(|w| w[0] != w[1]),
        "duplicate handle in squad of match {}",
        m.id
    );
}

/// Validate a team
pub fn assert_team_invariants(team: &Team) {
    debug_assert!(
        !team.name.trim().is_empty(),
        "team {} has empty name",
        team.id
    );
}
