use crate::bracket::{self, WinnerUpdate};
use crate::store::SeasonStore;
use crate::types::{name_key, Bracket, Moderator, Player, Round, SeasonMeta, MAX_SEASON_MODERATORS};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum AdminError {
    /// The command was understood but refused; nothing was written.
    #[error("{0}")]
    Rejected(String),

    #[error("{0}")]
    Storage(String),
}

impl From<String> for AdminError {
    fn from(message: String) -> Self {
        AdminError::Storage(message)
    }
}

/// Season administration on top of a [`SeasonStore`].
///
/// Every command loads what it needs, changes it and writes it back whole.
/// Commands aimed at something that does not exist report `false` (or
/// [`WinnerUpdate::NotFound`]) instead of failing.
pub struct SeasonAdmin<S> {
    store: S,
}

impl<S: SeasonStore> SeasonAdmin<S> {
    pub fn new(store: S) -> Self {
        SeasonAdmin { store }
    }

    // ── Seasons ────────────────────────────────────────────────────────

    /// Newest first.
    pub fn seasons(&self) -> Result<Vec<String>, AdminError> {
        Ok(self.store.seasons()?)
    }

    /// Registers a season and starts it with an empty bracket.
    pub fn add_season(&mut self, season: &str) -> Result<bool, AdminError> {
        let mut seasons = self.store.seasons()?;
        if seasons.iter().any(|s| s == season) {
            return Ok(false);
        }
        seasons.push(season.to_string());
        sort_newest_first(&mut seasons);
        self.store.save_seasons(&seasons)?;
        self.store.save_bracket(season, &Bracket::new())?;
        info!("Season {season} created");
        Ok(true)
    }

    /// Drops a season from the list. Its bracket and rosters stay on disk.
    pub fn remove_season(&mut self, season: &str) -> Result<bool, AdminError> {
        let mut seasons = self.store.seasons()?;
        let before = seasons.len();
        seasons.retain(|s| s != season);
        if seasons.len() == before {
            return Ok(false);
        }
        sort_newest_first(&mut seasons);
        self.store.save_seasons(&seasons)?;
        info!("Season {season} removed from list");
        Ok(true)
    }

    pub fn season_meta(&self, season: &str) -> Result<SeasonMeta, AdminError> {
        Ok(self.store.season_meta(season)?)
    }

    pub fn update_season_meta(&mut self, season: &str, meta: SeasonMeta) -> Result<(), AdminError> {
        self.store.save_season_meta(season, &meta)?;
        Ok(())
    }

    // ── Bracket ────────────────────────────────────────────────────────

    pub fn bracket(&self, season: &str) -> Result<Bracket, AdminError> {
        Ok(self.store.load_bracket(season)?)
    }

    /// Reseeds Round 1 from the season roster in insertion order, replacing
    /// every recorded result.
    pub fn regenerate_bracket(&mut self, season: &str) -> Result<Bracket, AdminError> {
        let participants = self.store.season_participants(season)?;
        let bracket = bracket::seed_round1(&participants);
        self.store.save_bracket(season, &bracket)?;
        if participants.len() % 2 == 1 {
            if let Some(left_out) = participants.last() {
                info!("Season {season}: {} has no Round 1 opponent and sits out", left_out.name);
            }
        }
        info!(
            "Season {season}: bracket seeded with {} Round 1 matches",
            bracket.matches(Round::Round1).len()
        );
        Ok(bracket)
    }

    /// `round` is a round label or stage number. Unknown rounds and matches
    /// are no-ops.
    pub fn set_winner(
        &mut self,
        season: &str,
        round: &str,
        match_number: u32,
        winner: Option<&str>,
    ) -> Result<WinnerUpdate, AdminError> {
        let Some(round) = Round::parse(round) else {
            debug!("Season {season}: ignoring winner for unknown round {round:?}");
            return Ok(WinnerUpdate::NotFound);
        };
        let current = self.store.load_bracket(season)?;
        let (next, update) = bracket::set_winner(&current, round, match_number, winner).map_err(|e| {
            warn!("Season {season}: {e}");
            AdminError::Rejected(e)
        })?;
        match update {
            WinnerUpdate::NotFound => {
                debug!("Season {season}: no {round} match {match_number}");
            }
            WinnerUpdate::Set => {
                self.store.save_bracket(season, &next)?;
                info!(
                    "Season {season}: {round} match {match_number} won by {}",
                    winner.unwrap_or_default()
                );
            }
            WinnerUpdate::Cleared => {
                self.store.save_bracket(season, &next)?;
                info!("Season {season}: {round} match {match_number} winner cleared");
            }
        }
        Ok(update)
    }

    // ── Season participants ────────────────────────────────────────────

    pub fn season_participants(&self, season: &str) -> Result<Vec<Player>, AdminError> {
        Ok(self.store.season_participants(season)?)
    }

    /// Appends a player to the season roster and reseeds the bracket.
    ///
    /// Players already in the global roster join under their roster spelling
    /// and seed; unknown players are added to the global roster first.
    pub fn add_season_participant(&mut self, season: &str, player: Player) -> Result<bool, AdminError> {
        let mut participants = self.store.season_participants(season)?;
        if participants.iter().any(|p| p.same_name(&player.name)) {
            debug!("Season {season}: {} already entered", player.name);
            return Ok(false);
        }

        let mut roster = self.store.global_participants()?;
        let entrant = match roster.iter().find(|p| p.same_name(&player.name)) {
            Some(existing) => existing.clone(),
            None => {
                roster.push(player.clone());
                sort_players(&mut roster);
                self.store.save_global_participants(&roster)?;
                player
            }
        };

        info!("Season {season}: {} entered", entrant.name);
        participants.push(entrant);
        self.store.save_season_participants(season, &participants)?;
        self.regenerate_bracket(season)?;
        Ok(true)
    }

    pub fn remove_season_participant(&mut self, season: &str, name: &str) -> Result<bool, AdminError> {
        let mut participants = self.store.season_participants(season)?;
        let before = participants.len();
        participants.retain(|p| !p.same_name(name));
        if participants.len() == before {
            return Ok(false);
        }
        self.store.save_season_participants(season, &participants)?;
        info!("Season {season}: {name} withdrawn");
        self.regenerate_bracket(season)?;
        Ok(true)
    }

    // ── Global participants ────────────────────────────────────────────

    pub fn global_participants(&self) -> Result<Vec<Player>, AdminError> {
        let mut roster = self.store.global_participants()?;
        sort_players(&mut roster);
        Ok(roster)
    }

    pub fn add_global_participant(&mut self, player: Player) -> Result<bool, AdminError> {
        let mut roster = self.store.global_participants()?;
        if roster.iter().any(|p| p.same_name(&player.name)) {
            return Ok(false);
        }
        info!("Participant {} registered", player.name);
        roster.push(player);
        sort_players(&mut roster);
        self.store.save_global_participants(&roster)?;
        Ok(true)
    }

    /// Season rosters keep their copy of the player.
    pub fn remove_global_participant(&mut self, name: &str) -> Result<bool, AdminError> {
        let mut roster = self.store.global_participants()?;
        let before = roster.len();
        roster.retain(|p| !p.same_name(name));
        if roster.len() == before {
            return Ok(false);
        }
        self.store.save_global_participants(&roster)?;
        info!("Participant {name} unregistered");
        Ok(true)
    }

    // ── Moderators ─────────────────────────────────────────────────────

    pub fn global_moderators(&self) -> Result<Vec<Moderator>, AdminError> {
        let mut list = self.store.global_moderators()?;
        sort_moderators(&mut list);
        Ok(list)
    }

    pub fn add_global_moderator(&mut self, name: &str) -> Result<bool, AdminError> {
        let mut list = self.store.global_moderators()?;
        if !insert_moderator(&mut list, name) {
            return Ok(false);
        }
        self.store.save_global_moderators(&list)?;
        info!("Moderator {name} registered");
        Ok(true)
    }

    pub fn remove_global_moderator(&mut self, name: &str) -> Result<bool, AdminError> {
        let mut list = self.store.global_moderators()?;
        if !remove_moderator(&mut list, name) {
            return Ok(false);
        }
        self.store.save_global_moderators(&list)?;
        info!("Moderator {name} unregistered");
        Ok(true)
    }

    pub fn season_moderators(&self, season: &str) -> Result<Vec<Moderator>, AdminError> {
        Ok(self.store.season_moderators(season)?)
    }

    /// At most [`MAX_SEASON_MODERATORS`] per season; extra adds are ignored.
    pub fn add_season_moderator(&mut self, season: &str, name: &str) -> Result<bool, AdminError> {
        let mut list = self.store.season_moderators(season)?;
        if list.len() >= MAX_SEASON_MODERATORS && !list.iter().any(|m| name_key(&m.name) == name_key(name)) {
            debug!("Season {season}: moderator limit reached, {name} not added");
            return Ok(false);
        }
        if !insert_moderator(&mut list, name) {
            return Ok(false);
        }
        self.store.save_season_moderators(season, &list)?;
        info!("Season {season}: moderator {name} added");
        Ok(true)
    }

    pub fn remove_season_moderator(&mut self, season: &str, name: &str) -> Result<bool, AdminError> {
        let mut list = self.store.season_moderators(season)?;
        if !remove_moderator(&mut list, name) {
            return Ok(false);
        }
        self.store.save_season_moderators(season, &list)?;
        info!("Season {season}: moderator {name} removed");
        Ok(true)
    }
}

fn sort_newest_first(seasons: &mut [String]) {
    seasons.sort_by(|a, b| b.cmp(a));
}

fn compare_names(a: &str, b: &str) -> std::cmp::Ordering {
    name_key(a).cmp(&name_key(b)).then_with(|| a.cmp(b))
}

fn sort_players(players: &mut [Player]) {
    players.sort_by(|a, b| compare_names(&a.name, &b.name));
}

fn sort_moderators(list: &mut [Moderator]) {
    list.sort_by(|a, b| compare_names(&a.name, &b.name));
}

fn insert_moderator(list: &mut Vec<Moderator>, name: &str) -> bool {
    if list.iter().any(|m| name_key(&m.name) == name_key(name)) {
        return false;
    }
    list.push(Moderator { name: name.to_string() });
    sort_moderators(list);
    true
}

fn remove_moderator(list: &mut Vec<Moderator>, name: &str) -> bool {
    let before = list.len();
    list.retain(|m| name_key(&m.name) != name_key(name));
    list.len() != before
}
