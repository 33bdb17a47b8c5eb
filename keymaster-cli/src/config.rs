use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Catalog database location; defaults to `keymaster.db` in the
    /// config dir when unset.
    pub db_path: Option<PathBuf>,
    /// Directory holding the persisted search history
    pub history_dir: Option<PathBuf>,
    /// Debounce delay for interactive search, in milliseconds
    pub debounce_ms: Option<u64>,
}

pub fn config_dir() -> PathBuf {
    if let Some(bd) = directories::BaseDirs::new() {
        bd.config_dir().join("keymaster")
    } else {
        PathBuf::from("./.config/keymaster")
    }
}

pub fn settings_path() -> PathBuf {
    config_dir().join("config.toml")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if let Ok(s) = std::fs::read_to_string(&path) {
        toml::from_str(&s).unwrap_or_default()
    } else {
        Settings::default()
    }
}

pub fn db_path(settings: &Settings, cli_override: Option<PathBuf>) -> PathBuf {
    cli_override
        .or_else(|| settings.db_path.clone())
        .unwrap_or_else(|| config_dir().join("keymaster.db"))
}

pub fn history_dir(settings: &Settings, cli_override: Option<PathBuf>) -> PathBuf {
    cli_override
        .or_else(|| settings.history_dir.clone())
        .unwrap_or_else(config_dir)
}
