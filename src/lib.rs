//! Fantasy Premier League data sync
//!
//! Pulls the official FPL bootstrap snapshot, keeps a local SQLite store of
//! teams and players, and stitches FPL identities onto locally named players
//! through a cascade of name-matching heuristics.

pub mod data;
pub mod matching;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// FPL team identifier (1..=20 in a normal season)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeamId(pub i64);

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Team({})", self.0)
    }
}

/// Row id of a player in the local store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub i64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Player({})", self.0)
    }
}

/// FPL "element" id, the API's identifier for a player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub i64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Element({})", self.0)
    }
}

/// Playing position as used by FPL
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Position {
    Goalkeeper,
    Defender,
    Midfielder,
    Forward,
}

impl Position {
    pub fn code(&self) -> &'static str {
        match self {
            Position::Goalkeeper => "GKP",
            Position::Defender => "DEF",
            Position::Midfielder => "MID",
            Position::Forward => "FWD",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_uppercase().as_str() {
            "GKP" | "GK" => Some(Position::Goalkeeper),
            "DEF" => Some(Position::Defender),
            "MID" => Some(Position::Midfielder),
            "FWD" | "FW" => Some(Position::Forward),
            _ => None,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A Premier League team as stored locally
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub short_name: String,
    pub code: i64,
    pub strength: i64,
}

/// A locally stored player
///
/// `name` is free text entered or imported by hand, so it rarely matches the
/// FPL naming convention exactly. `team_id` and `fpl_element_id` are filled
/// in by a sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub position: Option<Position>,
    pub team: Option<String>,
    pub team_id: Option<TeamId>,
    pub fpl_element_id: Option<ElementId>,
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum FplError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("FPL API returned {status} for {url}")]
    Api { status: u16, url: String },

    #[error("Offline mode: {0}")]
    Offline(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Player not found with ID: {0}")]
    PlayerNotFound(PlayerId),

    #[error("Team not found with ID: {0}")]
    TeamNotFound(TeamId),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FplError {
    /// Transport failures, rate limiting and server errors are worth retrying
    pub fn is_retryable(&self) -> bool {
        match self {
            FplError::Http(_) => true,
            FplError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, FplError>;

/// Application configuration loaded from fplsync.toml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub data: DataConfig,
    pub api: ApiConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    pub database_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    /// Directory for cached bootstrap snapshots
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Report matches without writing them back
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data: DataConfig {
                database_path: "data/fpl.db".to_string(),
            },
            api: ApiConfig {
                base_url: "https://fantasy.premierleague.com/api".to_string(),
                user_agent: "fplsync/0.1".to_string(),
                timeout_secs: 30,
                max_attempts: 3,
                cache_dir: None,
            },
            sync: SyncConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            FplError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| FplError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| FplError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fplsync.toml");
        let path = path.to_str().unwrap();

        let mut config = Config::default();
        config.api.cache_dir = Some("cache".to_string());
        config.sync.dry_run = true;
        config.save(path).unwrap();

        let loaded = Config::load(path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_without_sync_section() {
        let toml = r#"
            [data]
            database_path = "x.db"

            [api]
            base_url = "http://localhost"
            user_agent = "test"
            timeout_secs = 5
            max_attempts = 1
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(!config.sync.dry_run);
        assert_eq!(config.api.cache_dir, None);
    }

    #[test]
    fn test_missing_config_is_config_error() {
        let err = Config::load("/nonexistent/fplsync.toml").unwrap_err();
        assert!(matches!(err, FplError::Config(_)));
    }

    #[test]
    fn test_retryable_errors() {
        let api = |status| FplError::Api {
            status,
            url: "http://localhost/bootstrap-static/".to_string(),
        };
        assert!(api(503).is_retryable());
        assert!(api(429).is_retryable());
        assert!(!api(404).is_retryable());
        assert!(!FplError::Offline("no cache".to_string()).is_retryable());
        assert!(!FplError::Config("bad".to_string()).is_retryable());
    }

    #[test]
    fn test_position_codes() {
        assert_eq!(Position::from_code("gkp"), Some(Position::Goalkeeper));
        assert_eq!(Position::from_code("FWD"), Some(Position::Forward));
        assert_eq!(Position::from_code("striker"), None);
        assert_eq!(Position::Midfielder.to_string(), "MID");
    }
}
