//! Application configuration management.
//!
//! Holds the service location and the cache/sync timings handed to every
//! controller. Stored at `~/.config/forensia/config.json`; a missing file
//! means defaults. `FORENSIA_API_URL` overrides the stored base URL.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::controller::ControllerSettings;

/// Application name used for config directory paths
const APP_NAME: &str = "forensia";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000/api";
pub const API_URL_ENV: &str = "FORENSIA_API_URL";
pub const TOKEN_ENV: &str = "FORENSIA_TOKEN";

const DEFAULT_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_SYNC_INTERVAL_SECS: u64 = 30;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub cache_ttl_secs: Option<u64>,
    pub sync_interval_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    /// Case the user last worked on, remembered between runs.
    pub last_case_id: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Record the case the user is working on. Returns whether it changed, so
    /// callers only rewrite the file when needed.
    pub fn remember_case(&mut self, case_id: &str) -> bool {
        let case_id = case_id.trim();
        if case_id.is_empty() || self.last_case_id.as_deref() == Some(case_id) {
            return false;
        }
        self.last_case_id = Some(case_id.to_string());
        true
    }

    /// Base URL from the environment, then the file, then the default.
    pub fn api_base_url(&self) -> String {
        self.resolve_base_url(std::env::var(API_URL_ENV).ok())
    }

    fn resolve_base_url(&self, from_env: Option<String>) -> String {
        from_env
            .filter(|url| !url.trim().is_empty())
            .or_else(|| self.api_base_url.clone())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
    }

    /// A zero timeout would fail every request, so it means the default.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .filter(|v| *v > 0)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    /// Zero values fall back to the defaults. A zero TTL would turn the cache
    /// off and a zero interval would spin the sync loop.
    pub fn controller_settings(&self) -> ControllerSettings {
        let secs = |value: Option<u64>, default: u64| {
            Duration::from_secs(value.filter(|v| *v > 0).unwrap_or(default))
        };
        ControllerSettings {
            ttl: secs(self.cache_ttl_secs, DEFAULT_CACHE_TTL_SECS),
            sync_interval: secs(self.sync_interval_secs, DEFAULT_SYNC_INTERVAL_SECS),
        }
    }
}
