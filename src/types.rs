use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fmt,
    sync::{Arc, Mutex},
};

use crate::admin::SeasonAdmin;

// ── Constants ──────────────────────────────────────────────────────────

pub const MAX_SEASON_MODERATORS: usize = 8;
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

// ── Shared state type aliases ──────────────────────────────────────────

pub type SharedAdmin<S> = Arc<Mutex<SeasonAdmin<S>>>;

// ── App config ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub data_dir: String,
    pub bind_addr: String,
    pub static_dir: String,
}

// ── Roster types ───────────────────────────────────────────────────────

/// Comparison key for participant and moderator names: trimmed, case-folded.
pub fn name_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// A participant. An empty name marks an unresolved ("TBD") bracket slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u32>,
}

impl Player {
    pub fn new(name: impl Into<String>, seed: Option<u32>) -> Self {
        Player { name: name.into(), seed }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Player::new(name, None)
    }

    pub fn is_tbd(&self) -> bool {
        self.name.is_empty()
    }

    /// Roster names are unique ignoring case.
    pub fn same_name(&self, other: &str) -> bool {
        name_key(&self.name) == name_key(other)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Moderator {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month2: Option<String>,
}

// ── Bracket types ──────────────────────────────────────────────────────

/// Stages of the single-elimination bracket, in play order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Round {
    #[serde(rename = "Round 1")]
    Round1,
    Quarterfinals,
    Semifinals,
    Finals,
}

impl Round {
    pub const ORDER: [Round; 4] = [
        Round::Round1,
        Round::Quarterfinals,
        Round::Semifinals,
        Round::Finals,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Round::Round1 => "Round 1",
            Round::Quarterfinals => "Quarterfinals",
            Round::Semifinals => "Semifinals",
            Round::Finals => "Finals",
        }
    }

    /// Accepts a round label (any case) or its 1-based stage number.
    pub fn parse(raw: &str) -> Option<Round> {
        let trimmed = raw.trim();
        if let Ok(stage) = trimmed.parse::<usize>() {
            return stage.checked_sub(1).and_then(|idx| Round::ORDER.get(idx).copied());
        }
        Round::ORDER
            .iter()
            .copied()
            .find(|round| round.label().eq_ignore_ascii_case(trimmed))
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub match_number: u32,
    pub player1: Player,
    pub player2: Player,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<String>,
}

impl Match {
    pub fn new(match_number: u32, player1: Player, player2: Player) -> Self {
        Match {
            match_number,
            player1,
            player2,
            winner: None,
        }
    }

    /// True when `name` is the non-empty occupant of either slot.
    pub fn has_occupant(&self, name: &str) -> bool {
        !name.is_empty() && (self.player1.name == name || self.player2.name == name)
    }
}

/// Round label -> matches, serialized as `{ "Round 1": [...], ... }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bracket {
    rounds: BTreeMap<Round, Vec<Match>>,
}

impl Bracket {
    pub fn new() -> Self {
        Bracket::default()
    }

    pub fn matches(&self, round: Round) -> &[Match] {
        self.rounds.get(&round).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn set_round(&mut self, round: Round, matches: Vec<Match>) {
        self.rounds.insert(round, matches);
    }

    pub fn find_match(&self, round: Round, match_number: u32) -> Option<&Match> {
        self.matches(round).iter().find(|m| m.match_number == match_number)
    }

    pub fn find_match_mut(&mut self, round: Round, match_number: u32) -> Option<&mut Match> {
        self.rounds
            .get_mut(&round)?
            .iter_mut()
            .find(|m| m.match_number == match_number)
    }

    pub fn has_matches(&self) -> bool {
        self.rounds.values().any(|matches| !matches.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_parse_accepts_labels_and_stage_numbers() {
        assert_eq!(Round::parse("Round 1"), Some(Round::Round1));
        assert_eq!(Round::parse("semifinals"), Some(Round::Semifinals));
        assert_eq!(Round::parse(" 4 "), Some(Round::Finals));
        assert_eq!(Round::parse("0"), None);
        assert_eq!(Round::parse("5"), None);
        assert_eq!(Round::parse("Round of 16"), None);
    }

    #[test]
    fn test_bracket_json_shape() {
        let mut bracket = Bracket::new();
        let mut first = Match::new(1, Player::new("Ana", Some(1)), Player::named("Ben"));
        first.winner = Some("Ana".to_string());
        bracket.set_round(Round::Round1, vec![first]);
        bracket.set_round(Round::Finals, Vec::new());

        let value = serde_json::to_value(&bracket).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "Round 1": [{
                    "matchNumber": 1,
                    "player1": { "name": "Ana", "seed": 1 },
                    "player2": { "name": "Ben" },
                    "winner": "Ana"
                }],
                "Finals": []
            })
        );

        let parsed: Bracket = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, bracket);
    }

    #[test]
    fn test_same_name_ignores_case_and_padding() {
        let ana = Player::named("Ana");
        assert!(ana.same_name("ana"));
        assert!(ana.same_name("  ANA "));
        assert!(!ana.same_name("Anabel"));
        assert_eq!(name_key(" Mia "), name_key("mia"));
    }

    #[test]
    fn test_has_occupant_ignores_tbd_slots() {
        let m = Match::new(1, Player::named("Ana"), Player::named(""));
        assert!(m.has_occupant("Ana"));
        assert!(!m.has_occupant(""));
        assert!(!m.has_occupant("ana"));
    }
}
