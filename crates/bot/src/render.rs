//! Rendering match summaries, keyboards, and service replies

use matchday_core::{Confirmation, MatchSnapshot, SeasonStats};
use matchday_net::Button;
use rand::seq::SliceRandom;

use crate::inbound::CallbackData;

const GREETINGS: &[&str] = &[
    "Let's play!",
    "New season, same legs.",
    "Boots on - registration is open.",
];

/// Greeting posted when a team registers
pub fn greeting() -> String {
    let mut rng = rand::thread_rng();
    GREETINGS
        .choose(&mut rng)
        .copied()
        .unwrap_or(GREETINGS[0])
        .to_string()
}

/// Vote summary posted for a match and edited in place after each vote
pub fn match_summary(snapshot: &MatchSnapshot) -> String {
    let mut out = format!(
        "Registration is open for {}\n",
        snapshot.date.format("%a %d.%m @ %H:%M")
    );
    out.push_str(&format!(
        "Squad: going {} | voted {}\n",
        snapshot.stats.total.all, snapshot.stats.total.voted
    ));

    for section in &snapshot.stats.sections {
        if section.kind == Confirmation::Undecided {
            continue;
        }
        out.push_str(&format!(
            "\n{} [{}]:\n",
            section.kind.label(),
            section.players.len()
        ));
        for (i, player) in section.players.iter().enumerate() {
            if player.add_on > 0 {
                out.push_str(&format!("  {}. {} (+{})\n", i + 1, player.name, player.add_on));
            } else {
                out.push_str(&format!("  {}. {}\n", i + 1, player.name));
            }
        }
    }

    out
}

/// Vote keyboard: one row of attendance kinds, one row of guest deltas
pub fn vote_keyboard(snapshot: &MatchSnapshot) -> Vec<Vec<Button>> {
    let kinds = snapshot
        .kinds
        .iter()
        .map(|kind| Button {
            label: kind.label().to_string(),
            data: CallbackData::encode(snapshot.match_id, kind.as_str()),
        })
        .collect();

    let deltas = ["+1", "-1"]
        .iter()
        .map(|delta| Button {
            label: delta.to_string(),
            data: CallbackData::encode(snapshot.match_id, delta),
        })
        .collect();

    vec![kinds, deltas]
}

/// Season appearance table
pub fn season_stats(stats: &SeasonStats) -> String {
    if stats.matches_counted == 0 {
        return "No completed matches this season yet.".to_string();
    }

    let mut out = format!("Season so far: {} matches\n", stats.matches_counted);
    for (i, player) in stats.players.iter().enumerate() {
        out.push_str(&format!(
            "  {}. {} - {}\n",
            i + 1,
            player.name,
            player.appearances
        ));
    }
    out
}

pub fn schedule_updated() -> &'static str {
    "Schedule updated. Run /nextmatch to open registration."
}

pub fn invalid_schedule() -> &'static str {
    "That schedule did not parse. Expected day;HH:MM entries, e.g. 2;19:00,5;10:30"
}

pub fn no_team() -> &'static str {
    "No team registered here yet. Run /newteam first."
}

pub fn oops() -> &'static str {
    "Oops, something went wrong. Try again later."
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use matchday_core::{Match, VoteValue};

    fn snapshot() -> MatchSnapshot {
        let mut m = Match::new(42, Utc.with_ymd_and_hms(2025, 8, 5, 9, 0, 0).unwrap());
        m.confirm("Alice", "alice", VoteValue::Kind(Confirmation::Going));
        m.confirm("Bob", "bob", VoteValue::Kind(Confirmation::Going));
        m.confirm("Bob", "bob", VoteValue::AddOn(2));
        m.confirm("Carol", "carol", VoteValue::Kind(Confirmation::NotGoing));
        MatchSnapshot::of(&m)
    }

    #[test]
    fn summary_lists_voters_with_guests() {
        let text = match_summary(&snapshot());

        assert!(text.contains("Tue 05.08 @ 09:00"));
        assert!(text.contains("Squad: going 4 | voted 3"));
        assert!(text.contains("Going [2]:"));
        assert!(text.contains("2. Bob (+2)"));
        assert!(text.contains("NOT going [1]:"));
        assert!(text.contains("1. Carol"));
        assert!(!text.contains("Undecided"));
    }

    #[test]
    fn keyboard_has_kind_and_delta_rows() {
        let snapshot = snapshot();
        let keyboard = vote_keyboard(&snapshot);

        assert_eq!(keyboard.len(), 2);
        assert_eq!(keyboard[0].len(), 3);
        assert_eq!(keyboard[1].len(), 2);
        assert!(keyboard[0][0].data.contains(&snapshot.match_id.to_string()));
        assert!(keyboard[1][0].data.contains("+1"));
    }

    #[test]
    fn season_table_sorts_by_rank() {
        let stats = SeasonStats {
            matches_counted: 3,
            players: vec![
                matchday_core::PlayerAppearances {
                    name: "Alice".into(),
                    appearances: 3,
                },
                matchday_core::PlayerAppearances {
                    name: "Bob".into(),
                    appearances: 1,
                },
            ],
        };

        let text = season_stats(&stats);
        assert!(text.contains("3 matches"));
        assert!(text.contains("1. Alice - 3"));
        assert!(text.contains("2. Bob - 1"));
    }

    #[test]
    fn empty_season_has_a_message() {
        let stats = SeasonStats {
            matches_counted: 0,
            players: Vec::new(),
        };
        assert!(season_stats(&stats).contains("No completed matches"));
    }

    #[test]
    fn greeting_is_one_of_the_variants() {
        assert!(GREETINGS.contains(&greeting().as_str()));
    }
}
