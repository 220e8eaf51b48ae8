//! Application configuration management.
//!
//! This module handles loading and saving the application configuration,
//! which includes the API endpoint, request timeout, preferred credential
//! storage and last used username.
//!
//! Configuration is stored at `~/.config/vantage/config.json`.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "vantage";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Backend origin used when nothing is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Path prefix shared by every API route
pub const DEFAULT_API_PREFIX: &str = "/api/v1";

/// Exchange timeout in seconds.
/// Image comparison and YOLO jobs can run for a long time before responding.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Environment override for the backend origin
pub const BASE_URL_ENV: &str = "VANTAGE_BASE_URL";

/// Fixed settings for every exchange made by an `ApiClient`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_prefix: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_prefix: DEFAULT_API_PREFIX.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    /// Absolute URL for a path relative to the API prefix.
    pub fn url_for(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let prefix = self.api_prefix.trim_matches('/');
        let path = path.trim_start_matches('/');
        match (prefix.is_empty(), path.is_empty()) {
            (true, true) => base.to_string(),
            (true, false) => format!("{}/{}", base, path),
            (false, true) => format!("{}/{}", base, prefix),
            (false, false) => format!("{}/{}/{}", base, prefix, path),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Keyring,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub base_url: Option<String>,
    pub api_prefix: Option<String>,
    pub timeout_secs: Option<u64>,
    pub last_username: Option<String>,
    pub storage: Option<StorageBackend>,
    pub log_dir: Option<PathBuf>,
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

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.storage.unwrap_or_default()
    }

    /// Client settings from this config, with `VANTAGE_BASE_URL` taking
    /// precedence over the file.
    pub fn client_config(&self) -> ClientConfig {
        self.client_config_with(std::env::var(BASE_URL_ENV).ok())
    }

    fn client_config_with(&self, base_url_override: Option<String>) -> ClientConfig {
        let defaults = ClientConfig::default();
        ClientConfig {
            base_url: base_url_override
                .filter(|url| !url.is_empty())
                .or_else(|| self.base_url.clone())
                .unwrap_or(defaults.base_url),
            api_prefix: self.api_prefix.clone().unwrap_or(defaults.api_prefix),
            timeout: self
                .timeout_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }
}
