//! Storage repository traits
//!
//! The interface the coordinator works against, allowing different
//! implementations (SQLite, test doubles).

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Match, Schedule, Team};

/// Team repository operations
pub trait TeamRepository {
    /// Create a new team
    fn create_team(&self, team: &Team) -> Result<()>;

    /// Find a team by its external chat id
    fn find_team_by_chat(&self, chat_id: i64) -> Result<Option<Team>>;

    /// Replace a team's schedule
    fn update_team_schedule(&self, chat_id: i64, schedule: &Schedule) -> Result<()>;
}

/// Match repository operations
pub trait MatchRepository {
    /// Insert a new match. Fails with `MatchAlreadyScheduled` when the
    /// (team, date) pair already exists - the materialization race.
    fn create_match(&self, m: &Match) -> Result<()>;

    /// Find a match by id
    fn find_match(&self, id: Uuid) -> Result<Option<Match>>;

    /// Latest match for a team, by scheduled date
    fn find_latest_match(&self, team_id: i64) -> Result<Option<Match>>;

    /// Persist squad, completion flag, and message link of an existing match
    fn save_match(&self, m: &Match) -> Result<()>;

    /// Matches still open for a team
    fn open_matches(&self, team_id: i64) -> Result<Vec<Match>>;

    /// Completed matches for a team, oldest first
    fn list_completed_matches(&self, team_id: i64) -> Result<Vec<Match>>;
}

/// Processed-update log operations (the idempotency gate)
pub trait DedupRepository {
    /// Has this update id been processed already?
    fn seen(&self, update_id: &str) -> Result<bool>;

    /// Remember a processed update id
    fn record(&self, update_id: &str, processed_at: DateTime<Utc>) -> Result<()>;

    /// Drop entries older than the retention window; returns rows removed
    fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64>;
}

/// Combined storage interface
pub trait Storage: TeamRepository + MatchRepository + DedupRepository {}

// Blanket implementation: any type implementing all repositories is a Storage
impl<T> Storage for T where T: TeamRepository + MatchRepository + DedupRepository {}
