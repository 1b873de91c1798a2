// Configuración del proceso, leída de variables de entorno (y `.env` si existe).

use std::env;
use std::path::PathBuf;

use crate::algorithm::{MatchOptions, DEFAULT_SUBJECT_MATCH_TYPES};

pub const DEFAULT_BIND: &str = "127.0.0.1:8080";
pub const DEFAULT_DB_PATH: &str = "data/degreeaudit.db";
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// `DEGREEAUDIT_BIND`
    pub bind: String,
    /// `DEGREEAUDIT_DB_PATH`; `sqlite://` and `file://` prefixes are stripped.
    pub db_path: PathBuf,
    /// `DEGREEAUDIT_SUBJECT_MATCH_TYPES`, comma separated.
    pub subject_match_program_types: Vec<String>,
    /// `DEGREEAUDIT_LOG`, an `EnvFilter` directive.
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            bind: DEFAULT_BIND.to_string(),
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            subject_match_program_types: DEFAULT_SUBJECT_MATCH_TYPES.iter().map(|s| s.to_string()).collect(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

// carga .env si está presente
fn load_dotenv() {
    let _ = dotenv::dotenv();
}

impl AppConfig {
    pub fn from_env() -> Self {
        load_dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. Empty values fall back to defaults.
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = AppConfig::default();

        let subject_match_program_types = match get("DEGREEAUDIT_SUBJECT_MATCH_TYPES") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            None => defaults.subject_match_program_types,
        };

        AppConfig {
            bind: get("DEGREEAUDIT_BIND").unwrap_or(defaults.bind),
            db_path: get("DEGREEAUDIT_DB_PATH").map(|p| db_path_from(&p)).unwrap_or(defaults.db_path),
            subject_match_program_types,
            log_filter: get("DEGREEAUDIT_LOG").unwrap_or(defaults.log_filter),
        }
    }

    pub fn match_options(&self) -> MatchOptions {
        MatchOptions {
            matched_at: None,
            subject_match_program_types: self.subject_match_program_types.clone(),
        }
    }
}

/// Accepts a plain path or a `sqlite://` / `file://` URL.
pub fn db_path_from(raw: &str) -> PathBuf {
    let stripped = raw
        .strip_prefix("sqlite://")
        .or_else(|| raw.strip_prefix("file://"))
        .unwrap_or(raw);
    PathBuf::from(stripped)
}
