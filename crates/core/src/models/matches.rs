//! Match aggregate - squad, vote state machine, stats

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::invariants::assert_match_invariants;

/// Attendance status a player can pick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confirmation {
    Going,
    NotGoing,
    Undecided,
}

impl Confirmation {
    /// All kinds in display order; the first one counts toward the headcount.
    pub const ALL: [Confirmation; 3] = [
        Confirmation::Going,
        Confirmation::NotGoing,
        Confirmation::Undecided,
    ];

    /// The kind whose players (plus their guests) make up the headcount
    pub const PRIMARY: Confirmation = Confirmation::Going;

    pub fn as_str(&self) -> &'static str {
        match self {
            Confirmation::Going => "going",
            Confirmation::NotGoing => "not_going",
            Confirmation::Undecided => "undecided",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Confirmation::Going => "Going",
            Confirmation::NotGoing => "NOT going",
            Confirmation::Undecided => "Undecided",
        }
    }

    fn from_raw(raw: &str) -> Option<Self> {
        match raw {
            "going" => Some(Confirmation::Going),
            "not_going" => Some(Confirmation::NotGoing),
            "undecided" => Some(Confirmation::Undecided),
            _ => None,
        }
    }
}

/// A classified confirmation payload: an attendance kind or a signed guest
/// delta. Raw transport strings are classified exactly once, at the boundary,
/// before they reach a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteValue {
    Kind(Confirmation),
    AddOn(i32),
}

impl VoteValue {
    pub fn parse(raw: &str) -> Result<Self> {
        if let Some(kind) = Confirmation::from_raw(raw) {
            return Ok(VoteValue::Kind(kind));
        }
        raw.trim()
            .parse::<i32>()
            .map(VoteValue::AddOn)
            .map_err(|_| Error::UnrecognizedConfirmation(raw.to_string()))
    }
}

/// One participant's vote state within a match.
///
/// The handle is the dedup key; the display name is whatever the transport
/// reported the first time the player interacted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub handle: String,
    pub confirmation: Confirmation,
    pub add_on: u32,
}

impl Player {
    pub fn new(name: String, handle: String) -> Self {
        Self {
            name,
            handle,
            confirmation: Confirmation::Undecided,
            add_on: 0,
        }
    }

    /// add_on never goes negative: over-decrementing clamps at zero.
    fn apply_add_on(&mut self, delta: i32) {
        self.add_on = self.add_on.saturating_add_signed(delta);
    }
}

/// What happened to a confirmation handed to a match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// Vote state was updated
    Applied,
    /// The match is completed; nothing changed
    Rejected,
}

/// One concrete occurrence of a team's recurring match.
///
/// The squad grows lazily, one entry per handle in first-confirmation order;
/// entries are never removed while the match is open. A completed match is
/// terminal and accepts no further mutation.
#[derive(Debug, Clone)]
pub struct Match {
    pub id: Uuid,
    pub team_id: i64,
    pub date: DateTime<Utc>,
    pub squad: Vec<Player>,
    pub completed: bool,
    /// Transport message the vote summary lives in, once posted
    pub message_ref: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl Match {
    pub fn new(team_id: i64, date: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            team_id,
            date,
            squad: Vec::new(),
            completed: false,
            message_ref: None,
            created_at: Utc::now(),
        }
    }

    /// Fold one confirmation into the squad.
    ///
    /// An unseen handle creates its player entry; a kind overwrites the
    /// player's confirmation; a delta adjusts the guest count (clamped at
    /// zero). Completed matches reject the event with no state change.
    pub fn confirm(&mut self, name: &str, handle: &str, value: VoteValue) -> ConfirmOutcome {
        if self.completed {
            return ConfirmOutcome::Rejected;
        }

        if !self.squad.iter().any(|p| p.handle == handle) {
            self.squad
                .push(Player::new(name.to_string(), handle.to_string()));
        }
        if let Some(player) = self.squad.iter_mut().find(|p| p.handle == handle) {
            match value {
                VoteValue::Kind(kind) => player.confirmation = kind,
                VoteValue::AddOn(delta) => player.apply_add_on(delta),
            }
        }

        assert_match_invariants(self);
        ConfirmOutcome::Applied
    }

    /// Terminal transition; calling it again is a no-op.
    pub fn complete(&mut self) {
        self.completed = true;
    }

    /// Aggregate the squad into per-kind sections and totals. Pure; callable
    /// any number of times, including after completion.
    pub fn stats(&self) -> MatchStats {
        let sections = Confirmation::ALL
            .iter()
            .map(|&kind| StatsSection {
                kind,
                players: self
                    .squad
                    .iter()
                    .filter(|p| p.confirmation == kind)
                    .cloned()
                    .collect(),
            })
            .collect();

        let with_me: u32 = self.squad.iter().map(|p| p.add_on).sum();
        let voted = self
            .squad
            .iter()
            .filter(|p| p.confirmation != Confirmation::Undecided)
            .count();
        let going = self
            .squad
            .iter()
            .filter(|p| p.confirmation == Confirmation::PRIMARY)
            .count() as u32;

        MatchStats {
            sections,
            total: Totals {
                voted,
                with_me,
                all: with_me + going,
            },
        }
    }
}

/// Aggregated vote state, one section per confirmation kind
#[derive(Debug, Clone)]
pub struct MatchStats {
    pub sections: Vec<StatsSection>,
    pub total: Totals,
}

/// Players of one confirmation kind, in first-confirmation order
#[derive(Debug, Clone)]
pub struct StatsSection {
    pub kind: Confirmation,
    pub players: Vec<Player>,
}

#[derive(Debug, Clone, Copy)]
pub struct Totals {
    /// Players who picked a side; undecided counts as not voted
    pub voted: usize,
    /// Extra guests declared across the squad
    pub with_me: u32,
    /// Headcount estimate: guests plus players marked going
    pub all: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_match() -> Match {
        Match::new(42, Utc::now())
    }

    fn kind(k: Confirmation) -> VoteValue {
        VoteValue::Kind(k)
    }

    #[test]
    fn parse_classifies_kinds_and_deltas() {
        assert_eq!(
            VoteValue::parse("going").unwrap(),
            VoteValue::Kind(Confirmation::Going)
        );
        assert_eq!(VoteValue::parse("+1").unwrap(), VoteValue::AddOn(1));
        assert_eq!(VoteValue::parse("-1").unwrap(), VoteValue::AddOn(-1));
        assert!(matches!(
            VoteValue::parse("maybe later"),
            Err(Error::UnrecognizedConfirmation(_))
        ));
    }

    #[test]
    fn first_confirmation_creates_player() {
        let mut m = open_match();
        m.confirm("Alice", "alice", kind(Confirmation::Going));

        assert_eq!(m.squad.len(), 1);
        assert_eq!(m.squad[0].confirmation, Confirmation::Going);
        assert_eq!(m.squad[0].add_on, 0);
    }

    #[test]
    fn squad_keeps_first_confirmation_order() {
        let mut m = open_match();
        m.confirm("Bob", "bob", kind(Confirmation::Going));
        m.confirm("Alice", "alice", kind(Confirmation::NotGoing));
        m.confirm("Bob", "bob", kind(Confirmation::NotGoing));

        let handles: Vec<_> = m.squad.iter().map(|p| p.handle.as_str()).collect();
        assert_eq!(handles, ["bob", "alice"]);
    }

    #[test]
    fn repeated_confirmation_is_idempotent() {
        let mut m = open_match();
        m.confirm("Alice", "alice", kind(Confirmation::Going));
        let once = m.squad.clone();

        m.confirm("Alice", "alice", kind(Confirmation::Going));
        assert_eq!(m.squad, once);
    }

    #[test]
    fn add_on_never_goes_negative() {
        let mut m = open_match();
        m.confirm("Bob", "bob", VoteValue::AddOn(-1));
        assert_eq!(m.squad[0].add_on, 0);

        m.confirm("Bob", "bob", VoteValue::AddOn(2));
        m.confirm("Bob", "bob", VoteValue::AddOn(-5));
        assert_eq!(m.squad[0].add_on, 0);
    }

    #[test]
    fn completed_match_rejects_confirmations() {
        let mut m = open_match();
        m.confirm("Alice", "alice", kind(Confirmation::Going));
        m.complete();

        let outcome = m.confirm("Bob", "bob", kind(Confirmation::Going));
        assert_eq!(outcome, ConfirmOutcome::Rejected);
        assert_eq!(m.squad.len(), 1);
    }

    #[test]
    fn complete_is_idempotent() {
        let mut m = open_match();
        m.complete();
        m.complete();
        assert!(m.completed);
    }

    #[test]
    fn stats_counts_guests_and_goers() {
        let mut m = open_match();
        m.confirm("Alice", "alice", kind(Confirmation::Going));
        m.confirm("Bob", "bob", kind(Confirmation::Going));
        m.confirm("Bob", "bob", VoteValue::AddOn(1));
        m.confirm("Bob", "bob", VoteValue::AddOn(1));
        m.confirm("Carol", "carol", kind(Confirmation::NotGoing));

        let stats = m.stats();
        assert_eq!(stats.total.with_me, 2);
        assert_eq!(stats.total.voted, 3);
        assert_eq!(stats.total.all, 4);

        assert_eq!(stats.sections[0].kind, Confirmation::Going);
        assert_eq!(stats.sections[0].players.len(), 2);
        assert_eq!(stats.sections[1].players.len(), 1);
        assert_eq!(stats.sections[2].players.len(), 0);
    }

    #[test]
    fn undecided_player_counts_as_not_voted() {
        let mut m = open_match();
        // only ever pressed +1, confirmation stays at the default
        m.confirm("Dave", "dave", VoteValue::AddOn(1));

        let stats = m.stats();
        assert_eq!(stats.total.voted, 0);
        assert_eq!(stats.total.with_me, 1);
        assert_eq!(stats.total.all, 1);
    }

    #[test]
    fn headcount_identity_holds() {
        let mut m = open_match();
        m.confirm("Alice", "alice", kind(Confirmation::Going));
        m.confirm("Alice", "alice", VoteValue::AddOn(3));
        m.confirm("Bob", "bob", kind(Confirmation::Undecided));
        m.confirm("Carol", "carol", kind(Confirmation::NotGoing));
        m.confirm("Carol", "carol", VoteValue::AddOn(1));

        let stats = m.stats();
        let going = stats.sections[0].players.len() as u32;
        assert_eq!(stats.total.all, stats.total.with_me + going);
    }

    #[test]
    fn stats_readable_after_completion() {
        let mut m = open_match();
        m.confirm("Alice", "alice", kind(Confirmation::Going));
        m.complete();

        assert_eq!(m.stats().total.all, 1);
    }
}
