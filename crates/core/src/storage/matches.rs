//! Match storage operations

use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{parse_datetime, parse_uuid};
use crate::error::{Error, Result};
use crate::models::Match;

pub struct MatchStore<'a> {
    conn: &'a Connection,
}

const MATCH_COLUMNS: &str = "id, team_id, date, squad, completed, message_ref, created_at";

/// Row closure output: the match with its squad still serialized.
/// Squad JSON is hydrated outside the closure so serde errors surface as
/// core errors rather than sqlite conversion failures.
type MatchRow = (Match, String);

fn map_row(row: &Row<'_>) -> rusqlite::Result<MatchRow> {
    Ok((
        Match {
            id: parse_uuid(&row.get::<_, String>(0)?)?,
            team_id: row.get(1)?,
            date: parse_datetime(&row.get::<_, String>(2)?)?,
            squad: Vec::new(),
            completed: row.get::<_, i32>(4)? != 0,
            message_ref: row.get(5)?,
            created_at: parse_datetime(&row.get::<_, String>(6)?)?,
        },
        row.get::<_, String>(3)?,
    ))
}

fn hydrate((mut m, squad_json): MatchRow) -> Result<Match> {
    m.squad = serde_json::from_str(&squad_json)?;
    Ok(m)
}

impl<'a> MatchStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Insert a new match. The UNIQUE(team_id, date) constraint makes this a
    /// conditional insert: losing a materialization race surfaces as
    /// `MatchAlreadyScheduled`, and the caller re-reads the surviving row.
    #[instrument(skip(self, m), fields(match_id = %m.id, team_id = m.team_id))]
    pub fn create(&self, m: &Match) -> Result<()> {
        let result = self.conn.execute(
            "INSERT INTO matches (id, team_id, date, squad, completed, message_ref, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                m.id.to_string(),
                m.team_id,
                m.date.to_rfc3339(),
                serde_json::to_string(&m.squad)?,
                m.completed as i32,
                m.message_ref,
                m.created_at.to_rfc3339(),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(Error::MatchAlreadyScheduled {
                    team_id: m.team_id,
                    date: m.date,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Find a match by id
    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<Match>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {MATCH_COLUMNS} FROM matches WHERE id = ?1"))?;

        let row = stmt
            .query_row(params![id.to_string()], map_row)
            .optional()?;
        row.map(hydrate).transpose()
    }

    /// Latest match for a team by scheduled date, completed or not
    #[instrument(skip(self))]
    pub fn find_latest(&self, team_id: i64) -> Result<Option<Match>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {MATCH_COLUMNS} FROM matches WHERE team_id = ?1
             ORDER BY date DESC LIMIT 1"
        ))?;

        let row = stmt.query_row(params![team_id], map_row).optional()?;
        row.map(hydrate).transpose()
    }

    /// Persist the mutable parts of a match
    #[instrument(skip(self, m), fields(match_id = %m.id))]
    pub fn save(&self, m: &Match) -> Result<()> {
        self.conn.execute(
            "UPDATE matches SET squad = ?1, completed = ?2, message_ref = ?3 WHERE id = ?4",
            params![
                serde_json::to_string(&m.squad)?,
                m.completed as i32,
                m.message_ref,
                m.id.to_string(),
            ],
        )?;
        Ok(())
    }

    /// Matches still open for a team
    #[instrument(skip(self))]
    pub fn open_for_team(&self, team_id: i64) -> Result<Vec<Match>> {
        self.list_where(team_id, 0)
    }

    /// Completed matches for a team, oldest first
    #[instrument(skip(self))]
    pub fn completed_for_team(&self, team_id: i64) -> Result<Vec<Match>> {
        self.list_where(team_id, 1)
    }

    fn list_where(&self, team_id: i64, completed: i32) -> Result<Vec<Match>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {MATCH_COLUMNS} FROM matches
             WHERE team_id = ?1 AND completed = ?2 ORDER BY date"
        ))?;

        let rows = stmt
            .query_map(params![team_id, completed], map_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter().map(hydrate).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Confirmation, Schedule, Team, VoteValue};
    use crate::storage::Database;
    use chrono::{Duration, TimeZone, Utc};

    fn setup_team(db: &Database, chat_id: i64) {
        let team = Team::new(
            chat_id,
            "Tigers".to_string(),
            Schedule::parse("2;09:00").unwrap(),
        );
        db.teams().create(&team).unwrap();
    }

    fn tuesday() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 5, 9, 0, 0).unwrap()
    }

    #[test]
    fn roundtrip_preserves_squad() {
        let db = Database::open_in_memory().unwrap();
        setup_team(&db, 42);

        let mut m = Match::new(42, tuesday());
        m.confirm("Alice", "alice", VoteValue::Kind(Confirmation::Going));
        m.confirm("Bob", "bob", VoteValue::AddOn(2));
        db.matches().create(&m).unwrap();

        let loaded = db.matches().find_by_id(m.id).unwrap().unwrap();
        assert_eq!(loaded.squad, m.squad);
        assert_eq!(loaded.date, m.date);
        assert!(!loaded.completed);
        assert_eq!(loaded.message_ref, None);
    }

    #[test]
    fn same_team_and_date_conflicts() {
        let db = Database::open_in_memory().unwrap();
        setup_team(&db, 42);

        db.matches().create(&Match::new(42, tuesday())).unwrap();
        let err = db.matches().create(&Match::new(42, tuesday())).unwrap_err();
        assert!(matches!(err, Error::MatchAlreadyScheduled { .. }));
    }

    #[test]
    fn latest_is_ordered_by_date() {
        let db = Database::open_in_memory().unwrap();
        setup_team(&db, 42);

        let older = Match::new(42, tuesday());
        let newer = Match::new(42, tuesday() + Duration::days(7));
        db.matches().create(&newer).unwrap();
        db.matches().create(&older).unwrap();

        let latest = db.matches().find_latest(42).unwrap().unwrap();
        assert_eq!(latest.id, newer.id);
    }

    #[test]
    fn save_updates_squad_completion_and_link() {
        let db = Database::open_in_memory().unwrap();
        setup_team(&db, 42);

        let mut m = Match::new(42, tuesday());
        db.matches().create(&m).unwrap();

        m.confirm("Alice", "alice", VoteValue::Kind(Confirmation::Going));
        m.complete();
        m.message_ref = Some(777);
        db.matches().save(&m).unwrap();

        let loaded = db.matches().find_by_id(m.id).unwrap().unwrap();
        assert_eq!(loaded.squad.len(), 1);
        assert!(loaded.completed);
        assert_eq!(loaded.message_ref, Some(777));
    }

    #[test]
    fn open_and_completed_filters() {
        let db = Database::open_in_memory().unwrap();
        setup_team(&db, 42);

        let open = Match::new(42, tuesday());
        let mut done = Match::new(42, tuesday() + Duration::days(7));
        done.complete();
        db.matches().create(&open).unwrap();
        db.matches().create(&done).unwrap();

        let open_rows = db.matches().open_for_team(42).unwrap();
        assert_eq!(open_rows.len(), 1);
        assert_eq!(open_rows[0].id, open.id);

        let done_rows = db.matches().completed_for_team(42).unwrap();
        assert_eq!(done_rows.len(), 1);
        assert_eq!(done_rows[0].id, done.id);
    }
}
