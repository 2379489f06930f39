//! Decoding gateway updates into core events
//!
//! Everything transport-specific - slash command names, the callback payload
//! format - stops in this module. The core only ever sees parsed events.

use chrono::{DateTime, Utc};
use matchday_core::{ConfirmationEvent, Error, Result, VoteValue};
use matchday_net::SenderInfo;
use serde::Deserialize;
use uuid::Uuid;

/// Commands the bot answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    NewTeam,
    NextMatch,
    SetSchedule,
    SeasonStats,
}

impl BotCommand {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().trim_start_matches('/') {
            "newteam" => Some(Self::NewTeam),
            "nextmatch" => Some(Self::NextMatch),
            "setschedule" => Some(Self::SetSchedule),
            "seasonstats" => Some(Self::SeasonStats),
            _ => None,
        }
    }
}

/// Payload carried in vote-button callback data
#[derive(Debug, Deserialize)]
pub struct CallbackData {
    /// Match the vote belongs to
    pub m: Uuid,
    /// Raw confirmation value as wired into the button
    pub v: String,
}

impl CallbackData {
    /// Encode button data. Values come from the closed confirmation
    /// vocabulary, so no JSON escaping is needed.
    pub fn encode(match_id: Uuid, value: &str) -> String {
        format!(r#"{{"m":"{match_id}","v":"{value}"}}"#)
    }
}

/// Assemble a core confirmation event from a button press.
///
/// An unreadable payload or an unclassifiable value is reported as
/// `UnrecognizedConfirmation`; the caller logs and drops it without a reply.
pub fn confirmation_event(
    chat_id: i64,
    sender: &SenderInfo,
    data: &str,
    update_id: &str,
    timestamp: DateTime<Utc>,
) -> Result<ConfirmationEvent> {
    let payload: CallbackData = serde_json::from_str(data)
        .map_err(|_| Error::UnrecognizedConfirmation(data.to_string()))?;
    let value = VoteValue::parse(&payload.v)?;

    Ok(ConfirmationEvent {
        chat_id,
        match_id: payload.m,
        player_name: sender.name.clone(),
        player_handle: sender.handle.clone(),
        value,
        update_id: update_id.to_string(),
        timestamp,
    })
}
