use crate::config::is_safe_season_name;
use crate::types::{Bracket, Moderator, Player, SeasonMeta};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

/// Persistence for seasons, rosters and brackets.
///
/// Reads of anything never written come back empty. Brackets are only ever
/// written whole.
pub trait SeasonStore {
    fn seasons(&self) -> Result<Vec<String>, String>;
    fn save_seasons(&mut self, seasons: &[String]) -> Result<(), String>;

    fn load_bracket(&self, season: &str) -> Result<Bracket, String>;
    fn save_bracket(&mut self, season: &str, bracket: &Bracket) -> Result<(), String>;

    fn season_meta(&self, season: &str) -> Result<SeasonMeta, String>;
    fn save_season_meta(&mut self, season: &str, meta: &SeasonMeta) -> Result<(), String>;

    fn season_participants(&self, season: &str) -> Result<Vec<Player>, String>;
    fn save_season_participants(&mut self, season: &str, players: &[Player]) -> Result<(), String>;

    fn season_moderators(&self, season: &str) -> Result<Vec<Moderator>, String>;
    fn save_season_moderators(&mut self, season: &str, moderators: &[Moderator]) -> Result<(), String>;

    fn global_participants(&self) -> Result<Vec<Player>, String>;
    fn save_global_participants(&mut self, players: &[Player]) -> Result<(), String>;

    fn global_moderators(&self) -> Result<Vec<Moderator>, String>;
    fn save_global_moderators(&mut self, moderators: &[Moderator]) -> Result<(), String>;
}

// ── JSON files ─────────────────────────────────────────────────────────

/// Layout under `root`:
/// `seasons.json`, `participants.json`, `moderators.json` and, per season,
/// `seasons/<season>.json` plus `-meta`, `-participants`, `-moderators`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        JsonFileStore { root: root.into() }
    }

    fn seasons_list_path(&self) -> PathBuf {
        self.root.join("seasons.json")
    }

    fn season_file(&self, season: &str, suffix: &str) -> Result<PathBuf, String> {
        if !is_safe_season_name(season) {
            return Err(format!("Invalid season name: {season:?}"));
        }
        Ok(self.root.join("seasons").join(format!("{season}{suffix}.json")))
    }
}

fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T, String> {
    if !path.is_file() {
        return Ok(T::default());
    }
    let data = fs::read_to_string(path).map_err(|e| format!("read {}: {e}", path.display()))?;
    serde_json::from_str(&data).map_err(|e| format!("parse {}: {e}", path.display()))
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| format!("create dir {}: {e}", parent.display()))?;
    }
    let payload = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    let tmp = tmp_path(path);
    fs::write(&tmp, payload).map_err(|e| format!("write {}: {e}", tmp.display()))?;
    fs::rename(&tmp, path).map_err(|e| format!("rename {} to {}: {e}", tmp.display(), path.display()))
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

impl SeasonStore for JsonFileStore {
    fn seasons(&self) -> Result<Vec<String>, String> {
        read_json(&self.seasons_list_path())
    }

    fn save_seasons(&mut self, seasons: &[String]) -> Result<(), String> {
        write_json(&self.seasons_list_path(), seasons)
    }

    fn load_bracket(&self, season: &str) -> Result<Bracket, String> {
        read_json(&self.season_file(season, "")?)
    }

    fn save_bracket(&mut self, season: &str, bracket: &Bracket) -> Result<(), String> {
        write_json(&self.season_file(season, "")?, bracket)
    }

    fn season_meta(&self, season: &str) -> Result<SeasonMeta, String> {
        read_json(&self.season_file(season, "-meta")?)
    }

    fn save_season_meta(&mut self, season: &str, meta: &SeasonMeta) -> Result<(), String> {
        write_json(&self.season_file(season, "-meta")?, meta)
    }

    fn season_participants(&self, season: &str) -> Result<Vec<Player>, String> {
        read_json(&self.season_file(season, "-participants")?)
    }

    fn save_season_participants(&mut self, season: &str, players: &[Player]) -> Result<(), String> {
        write_json(&self.season_file(season, "-participants")?, players)
    }

    fn season_moderators(&self, season: &str) -> Result<Vec<Moderator>, String> {
        read_json(&self.season_file(season, "-moderators")?)
    }

    fn save_season_moderators(&mut self, season: &str, moderators: &[Moderator]) -> Result<(), String> {
        write_json(&self.season_file(season, "-moderators")?, moderators)
    }

    fn global_participants(&self) -> Result<Vec<Player>, String> {
        read_json(&self.root.join("participants.json"))
    }

    fn save_global_participants(&mut self, players: &[Player]) -> Result<(), String> {
        write_json(&self.root.join("participants.json"), players)
    }

    fn global_moderators(&self) -> Result<Vec<Moderator>, String> {
        read_json(&self.root.join("moderators.json"))
    }

    fn save_global_moderators(&mut self, moderators: &[Moderator]) -> Result<(), String> {
        write_json(&self.root.join("moderators.json"), moderators)
    }
}

// ── In memory ──────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemoryStore {
    seasons: Vec<String>,
    brackets: HashMap<String, Bracket>,
    metas: HashMap<String, SeasonMeta>,
    season_participants: HashMap<String, Vec<Player>>,
    season_moderators: HashMap<String, Vec<Moderator>>,
    participants: Vec<Player>,
    moderators: Vec<Moderator>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SeasonStore for MemoryStore {
    fn seasons(&self) -> Result<Vec<String>, String> {
        Ok(self.seasons.clone())
    }

    fn save_seasons(&mut self, seasons: &[String]) -> Result<(), String> {
        self.seasons = seasons.to_vec();
        Ok(())
    }

    fn load_bracket(&self, season: &str) -> Result<Bracket, String> {
        Ok(self.brackets.get(season).cloned().unwrap_or_default())
    }

    fn save_bracket(&mut self, season: &str, bracket: &Bracket) -> Result<(), String> {
        self.brackets.insert(season.to_string(), bracket.clone());
        Ok(())
    }

    fn season_meta(&self, season: &str) -> Result<SeasonMeta, String> {
        Ok(self.metas.get(season).cloned().unwrap_or_default())
    }

    fn save_season_meta(&mut self, season: &str, meta: &SeasonMeta) -> Result<(), String> {
        self.metas.insert(season.to_string(), meta.clone());
        Ok(())
    }

    fn season_participants(&self, season: &str) -> Result<Vec<Player>, String> {
        Ok(self.season_participants.get(season).cloned().unwrap_or_default())
    }

    fn save_season_participants(&mut self, season: &str, players: &[Player]) -> Result<(), String> {
        self.season_participants.insert(season.to_string(), players.to_vec());
        Ok(())
    }

    fn season_moderators(&self, season: &str) -> Result<Vec<Moderator>, String> {
        Ok(self.season_moderators.get(season).cloned().unwrap_or_default())
    }

    fn save_season_moderators(&mut self, season: &str, moderators: &[Moderator]) -> Result<(), String> {
        self.season_moderators.insert(season.to_string(), moderators.to_vec());
        Ok(())
    }

    fn global_participants(&self) -> Result<Vec<Player>, String> {
        Ok(self.participants.clone())
    }

    fn save_global_participants(&mut self, players: &[Player]) -> Result<(), String> {
        self.participants = players.to_vec();
        Ok(())
    }

    fn global_moderators(&self) -> Result<Vec<Moderator>, String> {
        Ok(self.moderators.clone())
    }

    fn save_global_moderators(&mut self, moderators: &[Moderator]) -> Result<(), String> {
        self.moderators = moderators.to_vec();
        Ok(())
    }
}
