//! SQLite storage layer for Matchday
//!
//! SQLite serializes writes per connection, which satisfies the
//! per-document update ordering the coordinator relies on.

mod confirmations;
mod matches;
mod migrations;
mod parse;
mod teams;
mod traits;

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::instrument;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Match, Schedule, Team};

pub use confirmations::ConfirmationLog;
pub use matches::MatchStore;
pub use teams::TeamStore;
pub use traits::{DedupRepository, MatchRepository, Storage, TeamRepository};

/// Main database handle
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database at the given path
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Open in-memory database (for testing)
    #[instrument]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    fn init(&self) -> Result<()> {
        migrations::run_migrations(&self.conn)
    }

    /// Get team store
    pub fn teams(&self) -> TeamStore<'_> {
        TeamStore::new(&self.conn)
    }

    /// Get match store
    pub fn matches(&self) -> MatchStore<'_> {
        MatchStore::new(&self.conn)
    }

    /// Get processed-confirmation log
    pub fn confirmations(&self) -> ConfirmationLog<'_> {
        ConfirmationLog::new(&self.conn)
    }
}

// Repository trait implementations, so the coordinator can run against a
// Database or any test double interchangeably.

impl TeamRepository for Database {
    fn create_team(&self, team: &Team) -> Result<()> {
        self.teams().create(team)
    }

    fn find_team_by_chat(&self, chat_id: i64) -> Result<Option<Team>> {
        self.teams().find_by_chat(chat_id)
    }

    fn update_team_schedule(&self, chat_id: i64, schedule: &Schedule) -> Result<()> {
        self.teams().update_schedule(chat_id, schedule)
    }
}

impl MatchRepository for Database {
    fn create_match(&self, m: &Match) -> Result<()> {
        self.matches().create(m)
    }

    fn find_match(&self, id: Uuid) -> Result<Option<Match>> {
        self.matches().find_by_id(id)
    }

    fn find_latest_match(&self, team_id: i64) -> Result<Option<Match>> {
        self.matches().find_latest(team_id)
    }

    fn save_match(&self, m: &Match) -> Result<()> {
        self.matches().save(m)
    }

    fn open_matches(&self, team_id: i64) -> Result<Vec<Match>> {
        self.matches().open_for_team(team_id)
    }

    fn list_completed_matches(&self, team_id: i64) -> Result<Vec<Match>> {
        self.matches().completed_for_team(team_id)
    }
}

impl DedupRepository for Database {
    fn seen(&self, update_id: &str) -> Result<bool> {
        self.confirmations().seen(update_id)
    }

    fn record(&self, update_id: &str, processed_at: DateTime<Utc>) -> Result<()> {
        self.confirmations().record(update_id, processed_at)
    }

    fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        self.confirmations().purge_expired(now)
    }
}
