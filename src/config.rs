use crate::types::*;
use chrono::NaiveDate;
use std::{
    env,
    fs,
    path::{Component, Path, PathBuf},
};

pub fn repo_root() -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

pub fn resolve_repo_path(raw: &str) -> PathBuf {
  let path = PathBuf::from(raw);
  if path.is_absolute() {
    path
  } else {
    repo_root().join(path)
  }
}

pub fn config_path() -> PathBuf {
  repo_root().join("config.json")
}

pub fn env_default(key: &str) -> Option<String> {
  env::var(key)
    .ok()
    .map(|value| value.trim().to_string())
    .filter(|value| !value.is_empty())
}

pub fn apply_env_defaults(mut config: AppConfig) -> AppConfig {
  if config.data_dir.trim().is_empty() {
    config.data_dir = env_default("BRACKET_DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.to_string());
  }
  if config.bind_addr.trim().is_empty() {
    config.bind_addr = env_default("BRACKET_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
  }
  if config.static_dir.trim().is_empty() {
    if let Some(value) = env_default("BRACKET_STATIC_DIR") {
      config.static_dir = value;
    }
  }
  config
}

pub fn load_config_inner() -> Result<AppConfig, String> {
  load_config_from(&config_path())
}

pub fn load_config_from(path: &Path) -> Result<AppConfig, String> {
  if !path.is_file() {
    return Ok(apply_env_defaults(AppConfig::default()));
  }
  let data = fs::read_to_string(path).map_err(|e| format!("read config {}: {e}", path.display()))?;
  let config =
    serde_json::from_str::<AppConfig>(&data).map_err(|e| format!("parse config {}: {e}", path.display()))?;
  Ok(apply_env_defaults(config))
}

pub fn data_dir(config: &AppConfig) -> PathBuf {
  resolve_repo_path(config.data_dir.trim())
}

pub fn static_dir(config: &AppConfig) -> Option<PathBuf> {
  let trimmed = config.static_dir.trim();
  if trimmed.is_empty() {
    return None;
  }
  Some(resolve_repo_path(trimmed))
}

pub fn load_env_file() {
  let env_path = repo_root().join(".env");
  if !env_path.is_file() {
    return;
  }
  let contents = match fs::read_to_string(&env_path) {
    Ok(data) => data,
    Err(_) => return,
  };
  for line in contents.lines() {
    if let Some((key, value)) = parse_env_line(line) {
      if env::var_os(&key).is_none() {
        env::set_var(key, value);
      }
    }
  }
}

pub fn parse_env_line(line: &str) -> Option<(String, String)> {
  let trimmed = line.trim();
  if trimmed.is_empty() || trimmed.starts_with('#') {
    return None;
  }
  let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
  let (key, raw_value) = trimmed.split_once('=')?;
  let key = key.trim();
  if key.is_empty() {
    return None;
  }
  let mut value = raw_value.trim();
  if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
    value = &value[1..value.len() - 1];
  } else if value.starts_with('\'') && value.ends_with('\'') && value.len() >= 2 {
    value = &value[1..value.len() - 1];
  } else if let Some(idx) = value.find('#') {
    value = value[..idx].trim_end();
  }
  Some((key.to_string(), value.to_string()))
}

/// Season names double as file names under the data dir.
pub fn is_safe_season_name(raw: &str) -> bool {
  let trimmed = raw.trim();
  if trimmed.is_empty() || trimmed != raw {
    return false;
  }
  let mut components = Path::new(trimmed).components();
  matches!(
    (components.next(), components.next()),
    (Some(Component::Normal(_)), None)
  ) && !trimmed.contains(|c| c == '/' || c == '\\')
}

/// Accepts `YYYY-MM`.
pub fn is_valid_month(raw: &str) -> bool {
  let trimmed = raw.trim();
  trimmed.len() == 7 && NaiveDate::parse_from_str(&format!("{trimmed}-01"), "%Y-%m-%d").is_ok()
}

pub fn log_env_warnings(config: &AppConfig) {
  let mut warnings = Vec::new();

  if let Some(dir) = static_dir(config) {
    if !dir.is_dir() {
      warnings.push(format!("Static dir {} does not exist, UI files will not be served", dir.display()));
    }
  }
  let data = data_dir(config);
  if data.exists() && !data.is_dir() {
    warnings.push(format!("Data dir {} is not a directory, season writes will fail", data.display()));
  }

  for msg in warnings {
    tracing::warn!("{}", msg);
  }
}
