//! Team storage operations

use rusqlite::{params, Connection, OptionalExtension};
use tracing::instrument;

use super::parse::{parse_datetime, parse_uuid};
use crate::error::Result;
use crate::models::{Schedule, Slot, Team};

pub struct TeamStore<'a> {
    conn: &'a Connection,
}

impl<'a> TeamStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create a new team
    #[instrument(skip(self, team), fields(chat_id = team.chat_id, name = %team.name))]
    pub fn create(&self, team: &Team) -> Result<()> {
        self.conn.execute(
            "INSERT INTO teams (id, chat_id, name, schedule, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                team.id.to_string(),
                team.chat_id,
                team.name,
                serde_json::to_string(team.schedule.slots())?,
                team.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Find a team by its external chat id
    #[instrument(skip(self))]
    pub fn find_by_chat(&self, chat_id: i64) -> Result<Option<Team>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, chat_id, name, schedule, created_at FROM teams WHERE chat_id = ?1",
        )?;

        let row = stmt
            .query_row(params![chat_id], |row| {
                Ok((
                    parse_uuid(&row.get::<_, String>(0)?)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    parse_datetime(&row.get::<_, String>(4)?)?,
                ))
            })
            .optional()?;

        match row {
            Some((id, chat_id, name, schedule_json, created_at)) => {
                let slots: Vec<Slot> = serde_json::from_str(&schedule_json)?;
                Ok(Some(Team {
                    id,
                    chat_id,
                    name,
                    schedule: Schedule::new(slots)?,
                    created_at,
                }))
            }
            None => Ok(None),
        }
    }

    /// Replace a team's schedule
    #[instrument(skip(self, schedule))]
    pub fn update_schedule(&self, chat_id: i64, schedule: &Schedule) -> Result<()> {
        self.conn.execute(
            "UPDATE teams SET schedule = ?1 WHERE chat_id = ?2",
            params![serde_json::to_string(schedule.slots())?, chat_id],
        )?;
        Ok(())
    }
}
