//! Team orchestration over the storage and clock boundaries
//!
//! The coordinator decides intent (materialize a match, fold a vote in) and
//! leaves race-freedom to the storage layer's conditional insert. Per-event
//! failures are absorbed here or by the caller; only construction errors
//! (a bad schedule) propagate as hard failures.

use std::collections::HashMap;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::events::{ConfirmationEvent, MatchSnapshot};
use crate::models::{Confirmation, ConfirmOutcome, Match, Schedule, Team};
use crate::storage::Storage;

/// A season match below this headcount is treated as a kickabout and not
/// counted in appearance stats.
const MATCH_MIN_HEADCOUNT: u32 = 8;

pub struct Coordinator<S, C> {
    storage: S,
    clock: C,
}

/// Result of a next-match request
#[derive(Debug)]
pub struct MatchOutcome {
    pub current: Match,
    pub is_new: bool,
}

/// Appearance counts across a team's completed matches
#[derive(Debug, Clone)]
pub struct SeasonStats {
    pub matches_counted: usize,
    pub players: Vec<PlayerAppearances>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerAppearances {
    pub name: String,
    pub appearances: u32,
}

impl<S: Storage, C: Clock> Coordinator<S, C> {
    pub fn new(storage: S, clock: C) -> Self {
        Self { storage, clock }
    }

    /// Find the team for a chat, registering it on first contact.
    pub fn ensure_team(&self, chat_id: i64, name: &str, schedule: Schedule) -> Result<Team> {
        if let Some(team) = self.storage.find_team_by_chat(chat_id)? {
            return Ok(team);
        }
        let team = Team::new(chat_id, name.to_string(), schedule);
        self.storage.create_team(&team)?;
        info!(chat_id, team = %team.name, "Registered new team");
        Ok(team)
    }

    /// Replace a team's schedule. Matches scheduled under the old slots are
    /// no longer valid and are completed on the spot.
    pub fn set_schedule(&self, chat_id: i64, spec: &str) -> Result<Team> {
        let schedule = Schedule::parse(spec)?;
        let mut team = self
            .storage
            .find_team_by_chat(chat_id)?
            .ok_or_else(|| Error::NotFound(format!("no team for chat {chat_id}")))?;

        self.storage.update_team_schedule(chat_id, &schedule)?;
        for mut stale in self.storage.open_matches(chat_id)? {
            stale.complete();
            self.storage.save_match(&stale)?;
        }
        info!(chat_id, slots = schedule.slots().len(), "Schedule replaced");

        team.schedule = schedule;
        Ok(team)
    }

    /// Resolve the team's next occurrence, materializing a new match when the
    /// persisted one is stale.
    ///
    /// Two updates racing a schedule boundary can both decide to create; the
    /// storage's (team, date) uniqueness lets only one insert through. The
    /// loser re-reads the surviving row instead of producing a duplicate.
    pub fn next_match(&self, chat_id: i64) -> Result<MatchOutcome> {
        let team = self
            .storage
            .find_team_by_chat(chat_id)?
            .ok_or_else(|| Error::NotFound(format!("no team for chat {chat_id}")))?;

        let latest = self.storage.find_latest_match(chat_id)?;
        let decision = team.next_match(latest, self.clock.now());
        if !decision.is_new {
            return Ok(MatchOutcome {
                current: decision.current,
                is_new: false,
            });
        }

        if let Some(mut retired) = decision.retired {
            retired.complete();
            self.storage.save_match(&retired)?;
            debug!(match_id = %retired.id, "Retired superseded match");
        }

        match self.storage.create_match(&decision.current) {
            Ok(()) => {
                info!(chat_id, match_id = %decision.current.id, date = %decision.current.date, "Match scheduled");
                Ok(MatchOutcome {
                    current: decision.current,
                    is_new: true,
                })
            }
            Err(Error::MatchAlreadyScheduled { .. }) => {
                warn!(chat_id, "Lost match creation race, re-reading");
                let current = self
                    .storage
                    .find_latest_match(chat_id)?
                    .ok_or_else(|| Error::NotFound(format!("match vanished for chat {chat_id}")))?;
                Ok(MatchOutcome {
                    current,
                    is_new: false,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Fold one confirmation into its match.
    ///
    /// The dedup gate runs before anything else: an update id seen within the
    /// retention window is dropped with no mutation and no re-render. Votes
    /// for completed or unknown matches are absorbed the same way. Returns a
    /// snapshot for rendering only when state actually changed.
    pub fn apply_confirmation(&self, event: &ConfirmationEvent) -> Result<Option<MatchSnapshot>> {
        if self.storage.seen(&event.update_id)? {
            debug!(update_id = %event.update_id, "Dropping duplicate confirmation");
            return Ok(None);
        }

        let Some(mut m) = self.storage.find_match(event.match_id)? else {
            warn!(match_id = %event.match_id, "Confirmation for unknown match");
            return Ok(None);
        };
        if m.team_id != event.chat_id {
            warn!(match_id = %m.id, chat_id = event.chat_id, "Vote addressed to another team's match");
            return Ok(None);
        }

        let outcome = m.confirm(&event.player_name, &event.player_handle, event.value);
        if outcome == ConfirmOutcome::Rejected {
            info!(match_id = %m.id, handle = %event.player_handle, "Vote for completed match ignored");
            return Ok(None);
        }

        self.storage.save_match(&m)?;
        self.storage.record(&event.update_id, event.timestamp)?;
        Ok(Some(MatchSnapshot::of(&m)))
    }

    /// Bind the posted summary message to its match.
    pub fn link_message(&self, match_id: Uuid, message_ref: i64) -> Result<()> {
        let Some(mut m) = self.storage.find_match(match_id)? else {
            return Err(Error::NotFound(format!("match {match_id}")));
        };
        m.message_ref = Some(message_ref);
        self.storage.save_match(&m)
    }

    /// Appearances per player over the team's completed matches. Matches
    /// below the minimum headcount do not count.
    pub fn season_stats(&self, chat_id: i64) -> Result<SeasonStats> {
        let mut counts: HashMap<String, (String, u32)> = HashMap::new();
        let mut matches_counted = 0;

        for m in self.storage.list_completed_matches(chat_id)? {
            if m.stats().total.all < MATCH_MIN_HEADCOUNT {
                continue;
            }
            matches_counted += 1;
            for p in m.squad.iter().filter(|p| p.confirmation == Confirmation::PRIMARY) {
                let entry = counts
                    .entry(p.handle.clone())
                    .or_insert_with(|| (p.name.clone(), 0));
                entry.1 += 1;
            }
        }

        let mut players: Vec<PlayerAppearances> = counts
            .into_values()
            .map(|(name, appearances)| PlayerAppearances { name, appearances })
            .collect();
        players.sort_by(|l, r| {
            r.appearances
                .cmp(&l.appearances)
                .then_with(|| l.name.cmp(&r.name))
        });

        Ok(SeasonStats {
            matches_counted,
            players,
        })
    }

    /// Retention sweep for the processed-update log.
    pub fn purge_expired_confirmations(&self) -> Result<u64> {
        self.storage.purge_expired(self.clock.now())
    }
}
