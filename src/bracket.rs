//! Bracket engine: seeds Round 1 from a roster and derives every later round
//! from recorded winners.
//!
//! Every mutation goes through [`propagate`], which rebuilds the Quarterfinals,
//! Semifinals and Finals from scratch. Downstream winners survive a rebuild
//! only while they still occupy a slot of the rebuilt match.

use crate::types::{Bracket, Match, Player, Round};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WinnerUpdate {
  Set,
  Cleared,
  NotFound,
}

/// Pairs participants positionally (1v2, 3v4, ...). A trailing odd
/// participant gets no match.
pub fn seed_round1(participants: &[Player]) -> Bracket {
  let matches = participants
    .chunks_exact(2)
    .enumerate()
    .map(|(idx, pair)| Match::new(idx as u32 + 1, pair[0].clone(), pair[1].clone()))
    .collect();
  let mut bracket = Bracket::new();
  bracket.set_round(Round::Round1, matches);
  propagate(&bracket)
}

/// Sets, toggles off or clears a match winner and returns the recomputed
/// bracket. Passing the already-recorded winner clears it.
///
/// A winner that is not one of the match's players is rejected and the
/// input bracket is left as it was.
pub fn set_winner(
  bracket: &Bracket,
  round: Round,
  match_number: u32,
  winner: Option<&str>,
) -> Result<(Bracket, WinnerUpdate), String> {
  // Stored later rounds may not match their feeders yet; validate against
  // the slots a rebuild would produce.
  let mut next = propagate(bracket);
  let Some(found) = next.find_match_mut(round, match_number) else {
    return Ok((bracket.clone(), WinnerUpdate::NotFound));
  };

  let update = match winner.filter(|name| !name.is_empty()) {
    Some(name) if found.winner.as_deref() != Some(name) => {
      if !found.has_occupant(name) {
        return Err(format!(
          "{name} is not a player in {round} match {match_number} ({} vs {})",
          slot_label(&found.player1),
          slot_label(&found.player2),
        ));
      }
      found.winner = Some(name.to_string());
      WinnerUpdate::Set
    }
    _ => {
      found.winner = None;
      WinnerUpdate::Cleared
    }
  };

  Ok((propagate(&next), update))
}

/// Rebuilds every round after Round 1 from the round before it.
pub fn propagate(bracket: &Bracket) -> Bracket {
  let mut next = bracket.clone();

  let mut first = next.matches(Round::Round1).to_vec();
  if !first.is_empty() {
    first.sort_by_key(|m| m.match_number);
    next.set_round(Round::Round1, first);
  }

  for stage in Round::ORDER.windows(2) {
    let (current, following) = (stage[0], stage[1]);
    let rebuilt = next_round_matches(next.matches(current), next.matches(following));
    next.set_round(following, rebuilt);
  }
  next
}

fn next_round_matches(current: &[Match], existing: &[Match]) -> Vec<Match> {
  if current.len() < 2 {
    return Vec::new();
  }
  current
    .chunks_exact(2)
    .enumerate()
    .map(|(idx, pair)| {
      let match_number = idx as u32 + 1;
      let mut rebuilt = Match::new(match_number, advancing_player(&pair[0]), advancing_player(&pair[1]));
      rebuilt.winner = existing
        .iter()
        .find(|m| m.match_number == match_number)
        .and_then(|m| m.winner.as_deref())
        .filter(|name| rebuilt.has_occupant(name))
        .map(str::to_string);
      rebuilt
    })
    .collect()
}

fn advancing_player(source: &Match) -> Player {
  Player::named(source.winner.clone().unwrap_or_default())
}

fn slot_label(player: &Player) -> &str {
  if player.is_tbd() {
    "TBD"
  } else {
    &player.name
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn players(names: &[&str]) -> Vec<Player> {
    names.iter().map(|name| Player::named(*name)).collect()
  }

  fn slots(m: &Match) -> (&str, &str) {
    (m.player1.name.as_str(), m.player2.name.as_str())
  }

  fn win(bracket: &Bracket, round: Round, match_number: u32, name: &str) -> Bracket {
    set_winner(bracket, round, match_number, Some(name)).unwrap().0
  }

  #[test]
  fn test_seed_pairs_positionally() {
    let bracket = seed_round1(&players(&["A", "B", "C", "D"]));
    let round1 = bracket.matches(Round::Round1);
    assert_eq!(round1.len(), 2);
    assert_eq!(round1[0].match_number, 1);
    assert_eq!(slots(&round1[0]), ("A", "B"));
    assert_eq!(round1[1].match_number, 2);
    assert_eq!(slots(&round1[1]), ("C", "D"));
    assert!(round1.iter().all(|m| m.winner.is_none()));
  }

  #[test]
  fn test_seed_drops_trailing_odd_participant() {
    let bracket = seed_round1(&players(&["A", "B", "C", "D", "E"]));
    let round1 = bracket.matches(Round::Round1);
    assert_eq!(round1.len(), 2);
    assert!(round1.iter().all(|m| !m.has_occupant("E")));
  }

  #[test]
  fn test_seed_keeps_roster_seeds_in_round1() {
    let roster = vec![Player::new("A", Some(2)), Player::new("B", Some(1))];
    let bracket = seed_round1(&roster);
    let first = &bracket.matches(Round::Round1)[0];
    assert_eq!(first.player1, Player::new("A", Some(2)));
    assert_eq!(first.player2, Player::new("B", Some(1)));
  }

  #[test]
  fn test_single_match_cascade_clears_downstream() {
    let mut bracket = seed_round1(&players(&["A", "B", "C", "D"]));
    let only_first = bracket.matches(Round::Round1)[..1].to_vec();
    bracket.set_round(Round::Round1, only_first);
    bracket.set_round(
      Round::Semifinals,
      vec![Match::new(1, Player::named("X"), Player::named("Y"))],
    );

    let propagated = propagate(&bracket);
    assert_eq!(propagated.matches(Round::Round1).len(), 1);
    assert!(propagated.matches(Round::Quarterfinals).is_empty());
    assert!(propagated.matches(Round::Semifinals).is_empty());
    assert!(propagated.matches(Round::Finals).is_empty());
  }

  #[test]
  fn test_empty_bracket_propagates_to_empty_rounds() {
    let propagated = propagate(&Bracket::new());
    assert!(!propagated.has_matches());
    assert!(propagated.matches(Round::Round1).is_empty());
  }

  #[test]
  fn test_winners_advance_without_a_winner() {
    let bracket = seed_round1(&players(&["A", "B", "C", "D"]));
    let bracket = win(&bracket, Round::Round1, 1, "A");
    let bracket = win(&bracket, Round::Round1, 2, "C");

    let quarters = bracket.matches(Round::Quarterfinals);
    assert_eq!(quarters.len(), 1);
    assert_eq!(slots(&quarters[0]), ("A", "C"));
    assert_eq!(quarters[0].winner, None);
    assert!(bracket.matches(Round::Semifinals).is_empty());
  }

  #[test]
  fn test_partial_results_leave_tbd_slot() {
    let bracket = seed_round1(&players(&["A", "B", "C", "D"]));
    let bracket = win(&bracket, Round::Round1, 2, "D");

    let quarters = bracket.matches(Round::Quarterfinals);
    assert_eq!(slots(&quarters[0]), ("", "D"));
    assert!(quarters[0].player1.is_tbd());
  }

  #[test]
  fn test_stale_downstream_winner_is_invalidated() {
    let bracket = seed_round1(&players(&["A", "B", "C", "D"]));
    let bracket = win(&bracket, Round::Round1, 1, "A");
    let bracket = win(&bracket, Round::Round1, 2, "C");
    let bracket = win(&bracket, Round::Quarterfinals, 1, "A");
    assert_eq!(bracket.matches(Round::Quarterfinals)[0].winner.as_deref(), Some("A"));

    let bracket = win(&bracket, Round::Round1, 1, "B");
    let quarters = bracket.matches(Round::Quarterfinals);
    assert_eq!(slots(&quarters[0]), ("B", "C"));
    assert_eq!(quarters[0].winner, None);
  }

  #[test]
  fn test_downstream_winner_survives_unrelated_change() {
    let bracket = seed_round1(&players(&["A", "B", "C", "D"]));
    let bracket = win(&bracket, Round::Round1, 1, "A");
    let bracket = win(&bracket, Round::Round1, 2, "C");
    let bracket = win(&bracket, Round::Quarterfinals, 1, "C");

    // Re-running propagation (e.g. after a no-op edit) keeps C.
    let bracket = propagate(&bracket);
    assert_eq!(bracket.matches(Round::Quarterfinals)[0].winner.as_deref(), Some("C"));
  }

  #[test]
  fn test_same_winner_twice_toggles_off() {
    let bracket = seed_round1(&players(&["A", "B", "C", "D"]));
    let (bracket, first) = set_winner(&bracket, Round::Round1, 1, Some("A")).unwrap();
    assert_eq!(first, WinnerUpdate::Set);
    let (bracket, second) = set_winner(&bracket, Round::Round1, 1, Some("A")).unwrap();
    assert_eq!(second, WinnerUpdate::Cleared);
    assert_eq!(bracket.find_match(Round::Round1, 1).unwrap().winner, None);
  }

  #[test]
  fn test_null_or_empty_winner_clears() {
    let bracket = seed_round1(&players(&["A", "B", "C", "D"]));
    let bracket = win(&bracket, Round::Round1, 1, "B");

    let (cleared, update) = set_winner(&bracket, Round::Round1, 1, None).unwrap();
    assert_eq!(update, WinnerUpdate::Cleared);
    assert_eq!(cleared.find_match(Round::Round1, 1).unwrap().winner, None);

    let (cleared, _) = set_winner(&bracket, Round::Round1, 1, Some("")).unwrap();
    assert_eq!(cleared.find_match(Round::Round1, 1).unwrap().winner, None);
  }

  #[test]
  fn test_switching_winner_replaces_it() {
    let bracket = seed_round1(&players(&["A", "B", "C", "D"]));
    let bracket = win(&bracket, Round::Round1, 1, "A");
    let (bracket, update) = set_winner(&bracket, Round::Round1, 1, Some("B")).unwrap();
    assert_eq!(update, WinnerUpdate::Set);
    assert_eq!(bracket.find_match(Round::Round1, 1).unwrap().winner.as_deref(), Some("B"));
  }

  #[test]
  fn test_unknown_match_is_a_noop() {
    let bracket = seed_round1(&players(&["A", "B", "C", "D"]));
    let (after, update) = set_winner(&bracket, Round::Round1, 9, Some("A")).unwrap();
    assert_eq!(update, WinnerUpdate::NotFound);
    assert_eq!(after, bracket);

    let (after, update) = set_winner(&bracket, Round::Finals, 1, Some("A")).unwrap();
    assert_eq!(update, WinnerUpdate::NotFound);
    assert_eq!(after, bracket);
  }

  #[test]
  fn test_winner_outside_match_is_rejected() {
    let bracket = seed_round1(&players(&["A", "B", "C", "D"]));
    let err = set_winner(&bracket, Round::Round1, 1, Some("C")).unwrap_err();
    assert!(err.contains("Round 1 match 1"), "{err}");
    assert_eq!(bracket.find_match(Round::Round1, 1).unwrap().winner, None);
  }

  #[test]
  fn test_tbd_match_cannot_get_a_winner() {
    let bracket = seed_round1(&players(&["A", "B", "C", "D"]));
    let bracket = win(&bracket, Round::Round1, 1, "A");
    assert!(set_winner(&bracket, Round::Quarterfinals, 1, Some("C")).is_err());
    let (after, update) = set_winner(&bracket, Round::Quarterfinals, 1, Some("")).unwrap();
    assert_eq!(update, WinnerUpdate::Cleared);
    assert_eq!(after.matches(Round::Quarterfinals)[0].winner, None);
  }

  #[test]
  fn test_winner_checked_against_rebuilt_slots() {
    let bracket = seed_round1(&players(&["A", "B", "C", "D"]));
    let mut bracket = win(&win(&bracket, Round::Round1, 1, "A"), Round::Round1, 2, "C");
    // Quarterfinal slots saved out of step with Round 1.
    bracket.set_round(
      Round::Quarterfinals,
      vec![Match::new(1, Player::named("X"), Player::named("C"))],
    );

    assert!(set_winner(&bracket, Round::Quarterfinals, 1, Some("X")).is_err());

    let (next, update) = set_winner(&bracket, Round::Quarterfinals, 1, Some("A")).unwrap();
    assert_eq!(update, WinnerUpdate::Set);
    let quarter = next.find_match(Round::Quarterfinals, 1).unwrap();
    assert_eq!(slots(quarter), ("A", "C"));
    assert_eq!(quarter.winner.as_deref(), Some("A"));
  }

  #[test]
  fn test_stored_empty_winner_never_advances_as_preserved() {
    let mut bracket = seed_round1(&players(&["A", "B", "C", "D"]));
    let mut quarter = Match::new(1, Player::named(""), Player::named(""));
    quarter.winner = Some(String::new());
    bracket.set_round(Round::Quarterfinals, vec![quarter]);

    let propagated = propagate(&bracket);
    assert_eq!(propagated.matches(Round::Quarterfinals)[0].winner, None);
  }

  #[test]
  fn test_pairing_follows_match_number_not_storage_order() {
    let mut bracket = Bracket::new();
    let mut second = Match::new(2, Player::named("C"), Player::named("D"));
    second.winner = Some("D".to_string());
    let mut first = Match::new(1, Player::named("A"), Player::named("B"));
    first.winner = Some("B".to_string());
    bracket.set_round(Round::Round1, vec![second, first]);

    let propagated = propagate(&bracket);
    assert_eq!(propagated.matches(Round::Round1)[0].match_number, 1);
    assert_eq!(slots(&propagated.matches(Round::Quarterfinals)[0]), ("B", "D"));
  }

  #[test]
  fn test_propagate_is_idempotent() {
    let names = ["A", "B", "C", "D", "E", "F", "G", "H"];
    let mut samples = vec![Bracket::new(), seed_round1(&players(&names[..3]))];

    let mut bracket = seed_round1(&players(&names));
    samples.push(bracket.clone());
    for (number, name) in [(1, "A"), (2, "D"), (3, "E"), (4, "H")] {
      bracket = win(&bracket, Round::Round1, number, name);
      samples.push(bracket.clone());
    }
    bracket = win(&bracket, Round::Quarterfinals, 1, "D");
    samples.push(bracket.clone());

    // Hand-edited downstream data that propagation has to repair.
    let mut skewed = bracket.clone();
    let mut bogus = Match::new(1, Player::named("Z"), Player::named("Y"));
    bogus.winner = Some("Z".to_string());
    skewed.set_round(Round::Semifinals, vec![bogus.clone(), bogus]);
    samples.push(skewed);

    for sample in samples {
      let once = propagate(&sample);
      assert_eq!(propagate(&once), once);
    }
  }

  #[test]
  fn test_full_bracket_plays_out() {
    let bracket = seed_round1(&players(&["A", "B", "C", "D", "E", "F", "G", "H"]));
    assert_eq!(bracket.matches(Round::Round1).len(), 4);

    let mut bracket = bracket;
    for (number, name) in [(1, "A"), (2, "C"), (3, "F"), (4, "H")] {
      bracket = win(&bracket, Round::Round1, number, name);
    }
    bracket = propagate(&bracket);

    let quarters = bracket.matches(Round::Quarterfinals);
    assert_eq!(quarters.len(), 2);
    assert_eq!(slots(&quarters[0]), ("A", "C"));
    assert_eq!(slots(&quarters[1]), ("F", "H"));

    bracket = win(&bracket, Round::Quarterfinals, 1, "C");
    bracket = win(&bracket, Round::Quarterfinals, 2, "F");
    let semis = bracket.matches(Round::Semifinals);
    assert_eq!(semis.len(), 1);
    assert_eq!(slots(&semis[0]), ("C", "F"));

    bracket = win(&bracket, Round::Semifinals, 1, "F");
    // One semifinal cannot feed a pair, so the finals stay empty.
    assert!(bracket.matches(Round::Finals).is_empty());
  }

  #[test]
  fn test_sixteen_players_reach_a_final() {
    let names: Vec<String> = (1..=16).map(|n| format!("P{n}")).collect();
    let roster: Vec<Player> = names.iter().map(|name| Player::named(name.as_str())).collect();
    let mut bracket = seed_round1(&roster);
    assert_eq!(bracket.matches(Round::Round1).len(), 8);

    // Player 1 of every match wins all the way through.
    for round in [Round::Round1, Round::Quarterfinals, Round::Semifinals] {
      let picks: Vec<(u32, String)> = bracket
        .matches(round)
        .iter()
        .map(|m| (m.match_number, m.player1.name.clone()))
        .collect();
      for (number, name) in picks {
        bracket = win(&bracket, round, number, &name);
      }
    }

    assert_eq!(bracket.matches(Round::Quarterfinals).len(), 4);
    assert_eq!(bracket.matches(Round::Semifinals).len(), 2);
    let finals = bracket.matches(Round::Finals);
    assert_eq!(finals.len(), 1);
    assert_eq!(slots(&finals[0]), ("P1", "P9"));
    assert_eq!(finals[0].winner, None);

    bracket = win(&bracket, Round::Finals, 1, "P9");
    assert_eq!(bracket.find_match(Round::Finals, 1).unwrap().winner.as_deref(), Some("P9"));
  }
}
