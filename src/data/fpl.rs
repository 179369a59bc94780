//! Client for the FPL `bootstrap-static` endpoint
//!
//! The bootstrap payload carries every team and every player ("element") for
//! the current season. Responses can be cached on disk for offline runs.

use crate::matching::CatalogRecord;
use crate::{ElementId, FplError, Result, TeamId};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const BOOTSTRAP_FILE: &str = "bootstrap-static.json";

/// Team entry of the bootstrap payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiTeam {
    pub id: i64,
    pub name: String,
    pub short_name: String,
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub strength: i64,
}

/// Player entry of the bootstrap payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiElement {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub second_name: String,
    #[serde(default)]
    pub web_name: String,
    pub team: i64,
}

/// The parts of `bootstrap-static` this crate uses
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bootstrap {
    #[serde(default)]
    pub teams: Vec<ApiTeam>,
    #[serde(default)]
    pub elements: Vec<ApiElement>,
}

impl Bootstrap {
    /// Parse a saved snapshot
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Elements as catalog records, in API order
    pub fn catalog(&self) -> Vec<CatalogRecord> {
        self.elements
            .iter()
            .map(|e| CatalogRecord {
                id: ElementId(e.id),
                first_name: e.first_name.clone(),
                last_name: e.second_name.clone(),
                display_name: e.web_name.clone(),
                team: TeamId(e.team),
            })
            .collect()
    }

    pub fn team(&self, id: TeamId) -> Option<&ApiTeam> {
        self.teams.iter().find(|t| t.id == id.0)
    }
}

/// Blocking FPL API client
pub struct FplClient {
    client: reqwest::blocking::Client,
    base_url: String,
    max_attempts: u32,
    /// Optional cache directory for bootstrap snapshots
    cache_dir: Option<PathBuf>,
    /// If true, only use cache (no network requests)
    offline_only: bool,
}

impl FplClient {
    pub fn new(api: &crate::ApiConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(api.user_agent.as_str())
            .timeout(std::time::Duration::from_secs(api.timeout_secs))
            .build()?;

        let mut fpl = FplClient {
            client,
            base_url: api.base_url.trim_end_matches('/').to_string(),
            max_attempts: api.max_attempts.max(1),
            cache_dir: None,
            offline_only: false,
        };
        if let Some(dir) = &api.cache_dir {
            fpl = fpl.with_cache(dir);
        }
        Ok(fpl)
    }

    /// Create client with a cache directory
    pub fn with_cache<P: AsRef<Path>>(mut self, cache_dir: P) -> Self {
        self.cache_dir = Some(cache_dir.as_ref().to_path_buf());
        self
    }

    /// Set offline-only mode (no network requests, cache must exist)
    pub fn offline_only(mut self, offline: bool) -> Self {
        self.offline_only = offline;
        self
    }

    fn bootstrap_url(&self) -> String {
        format!("{}/bootstrap-static/", self.base_url)
    }

    fn cache_path(&self) -> Option<PathBuf> {
        self.cache_dir.as_ref().map(|dir| dir.join(BOOTSTRAP_FILE))
    }

    fn load_from_cache(&self) -> Option<String> {
        let path = self.cache_path()?;
        if path.exists() {
            log::debug!("Loading from cache: {}", path.display());
            std::fs::read_to_string(&path).ok()
        } else {
            None
        }
    }

    fn save_to_cache(&self, body: &str) -> Result<()> {
        if let Some(path) = self.cache_path() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, body)?;
            log::debug!("Saved to cache: {}", path.display());
        }
        Ok(())
    }

    /// Fetch the bootstrap snapshot, preferring a cached copy
    pub fn fetch_bootstrap(&self) -> Result<Bootstrap> {
        if let Some(body) = self.load_from_cache() {
            match serde_json::from_str(&body) {
                Ok(bootstrap) => return Ok(bootstrap),
                Err(e) if self.offline_only => return Err(e.into()),
                Err(e) => log::warn!("Ignoring unreadable cached snapshot: {}", e),
            }
        }

        if self.offline_only {
            return Err(FplError::Offline(match self.cache_path() {
                Some(path) => format!("no cached snapshot at {}", path.display()),
                None => "no cache directory configured".to_string(),
            }));
        }

        let url = self.bootstrap_url();
        log::info!("Fetching {}", url);
        let body = with_retry(|| self.get_text(&url), self.max_attempts)?;
        let bootstrap: Bootstrap = serde_json::from_str(&body)?;
        self.save_to_cache(&body)?;

        log::info!(
            "Fetched {} teams and {} players",
            bootstrap.teams.len(),
            bootstrap.elements.len()
        );
        Ok(bootstrap)
    }

    fn get_text(&self, url: &str) -> Result<String> {
        let resp = self.client.get(url).send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FplError::Api {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(resp.text()?)
    }
}

/// Retry an operation with exponential backoff
///
/// Only errors for which [`FplError::is_retryable`] holds are retried.
pub fn with_retry<T, F>(mut operation: F, max_attempts: u32) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let mut attempt = 0;
    loop {
        match operation() {
            Ok(result) => return Ok(result),
            Err(e) if e.is_retryable() && attempt + 1 < max_attempts => {
                log::warn!("Attempt {} failed: {}", attempt + 1, e);
                let delay = std::time::Duration::from_millis(100 * 2u64.pow(attempt));
                std::thread::sleep(delay);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
