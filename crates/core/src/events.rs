//! Event shapes crossing the core boundary
//!
//! Transport-specific encodings (slash commands, button payloads) are decoded
//! before these are built; the core never sees them.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{Confirmation, Match, MatchStats, VoteValue};

/// A single confirmation delivered by the transport.
///
/// Delivery is at-least-once; `update_id` is the idempotency key the dedup
/// gate checks before any state is touched.
#[derive(Debug, Clone)]
pub struct ConfirmationEvent {
    pub chat_id: i64,
    pub match_id: Uuid,
    pub player_name: String,
    pub player_handle: String,
    pub value: VoteValue,
    pub update_id: String,
    pub timestamp: DateTime<Utc>,
}

/// Immutable view of a match handed outward for rendering
#[derive(Debug, Clone)]
pub struct MatchSnapshot {
    pub match_id: Uuid,
    pub chat_id: i64,
    pub date: DateTime<Utc>,
    pub stats: MatchStats,
    pub kinds: &'static [Confirmation],
    pub message_ref: Option<i64>,
}

impl MatchSnapshot {
    pub fn of(m: &Match) -> Self {
        Self {
            match_id: m.id,
            chat_id: m.team_id,
            date: m.date,
            stats: m.stats(),
            kinds: &Confirmation::ALL,
            message_ref: m.message_ref,
        }
    }
}
