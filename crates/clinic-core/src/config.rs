//! Application configuration management.
//!
//! This module handles loading and saving the client configuration: backend
//! and media server URLs, the request timeout, where session tokens are
//! persisted and the last username used to log in.
//!
//! Configuration is stored at `~/.config/clinic-admin/config.json`. The
//! `CLINIC_API_BASE_URL`, `CLINIC_MEDIA_BASE_URL` and `CLINIC_TOKEN_BACKEND`
//! environment variables override the file.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::auth::{FileBackend, KeyringBackend, TokenStore};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "clinic-admin";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const DEFAULT_API_BASE_URL: &str = "http://38.38.251.86:8000/api";
pub const DEFAULT_MEDIA_BASE_URL: &str = "http://38.38.251.86:8001";

/// Overall HTTP request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

const ENV_API_BASE_URL: &str = "CLINIC_API_BASE_URL";
const ENV_MEDIA_BASE_URL: &str = "CLINIC_MEDIA_BASE_URL";
const ENV_TOKEN_BACKEND: &str = "CLINIC_TOKEN_BACKEND";

/// Where session tokens are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenBackendKind {
    /// JSON file in the cache directory
    #[default]
    File,
    /// OS keychain
    Keyring,
}

impl FromStr for TokenBackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "file" => Ok(TokenBackendKind::File),
            "keyring" | "keychain" => Ok(TokenBackendKind::Keyring),
            other => Err(anyhow::anyhow!("Unknown token backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub media_base_url: String,
    pub request_timeout_secs: u64,
    pub token_backend: TokenBackendKind,
    pub last_username: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            media_base_url: DEFAULT_MEDIA_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            token_backend: TokenBackendKind::default(),
            last_username: None,
        }
    }
}

impl Config {
    /// Load the config file (defaults when absent), then apply environment
    /// overrides.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Invalid config file {}", path.display()))?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(ENV_API_BASE_URL) {
            self.api_base_url = url;
        }
        if let Ok(url) = std::env::var(ENV_MEDIA_BASE_URL) {
            self.media_base_url = url;
        }
        if let Ok(kind) = std::env::var(ENV_TOKEN_BACKEND) {
            match kind.parse() {
                Ok(kind) => self.token_backend = kind,
                Err(e) => warn!(error = %e, "Ignoring {}", ENV_TOKEN_BACKEND),
            }
        }
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

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Open the token store selected by `token_backend`.
    pub fn open_token_store(&self) -> Result<TokenStore> {
        Ok(match self.token_backend {
            TokenBackendKind::File => TokenStore::open(FileBackend::new(self.cache_dir()?)),
            TokenBackendKind::Keyring => TokenStore::open(KeyringBackend::new()),
        })
    }
}
