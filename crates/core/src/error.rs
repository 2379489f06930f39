//! Error types for Matchday Core

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("Unrecognized confirmation value: {0:?}")]
    UnrecognizedConfirmation(String),

    #[error("Duplicate update: {0}")]
    DuplicateUpdate(String),

    #[error("Match already scheduled for team {team_id} at {date}")]
    MatchAlreadyScheduled { team_id: i64, date: DateTime<Utc> },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
