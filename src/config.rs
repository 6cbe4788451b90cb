//! Configuration loading.
//!
//! Values are resolved with the following precedence:
//! 1. Environment variables (`PLAYHEAD_*`)
//! 2. Config file (`<home>/config.toml`, home defaulting to `~/.playhead`)
//! 3. Defaults

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::remote::RetryPolicy;

const ENV_HOME: &str = "PLAYHEAD_HOME";
const ENV_CLIENT_ID: &str = "PLAYHEAD_CLIENT_ID";
const ENV_CLIENT_SECRET: &str = "PLAYHEAD_CLIENT_SECRET";
const ENV_REDIRECT_URL: &str = "PLAYHEAD_REDIRECT_URL";

/// Main configuration struct.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// OAuth application credentials for the streaming provider.
    pub provider: ProviderConfig,

    /// Where session and slot data live.
    pub storage: StorageConfig,

    /// Bounded-retry policy applied to every remote call.
    pub retry: RetryPolicy,
}

/// Credentials and redirect target registered with the provider.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Where the provider sends the user back after authorization. Its path
    /// component is the callback route the auth gate recognizes.
    pub redirect_url: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_url: "http://127.0.0.1:8080/auth/callback".to_string(),
        }
    }
}

/// Storage locations, all rooted in the app home directory.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub home: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            home: default_home(),
        }
    }
}

fn default_home() -> PathBuf {
    match env::var(ENV_HOME) {
        Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir.trim()),
        _ => {
            let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".playhead")
        }
    }
}

impl Config {
    /// Load configuration from `<home>/config.toml` (if present) and the
    /// environment.
    pub fn load() -> Result<Self> {
        let mut config = match fs::read_to_string(default_home().join("config.toml")) {
            Ok(raw) => Self::parse(&raw)?,
            Err(_) => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Load configuration from an explicit file plus the environment.
    pub fn load_from(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let mut config = Self::parse(&raw)?;
        config.apply_env();
        Ok(config)
    }

    fn parse(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw).context("failed to parse config file")?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(v) = env::var(ENV_CLIENT_ID) {
            self.provider.client_id = v.trim().to_string();
        }
        if let Ok(v) = env::var(ENV_CLIENT_SECRET) {
            self.provider.client_secret = v.trim().to_string();
        }
        if let Ok(v) = env::var(ENV_REDIRECT_URL) {
            self.provider.redirect_url = v.trim().to_string();
        }
        if let Ok(v) = env::var(ENV_HOME) {
            if !v.trim().is_empty() {
                self.storage.home = PathBuf::from(v.trim());
            }
        }
    }

    /// Path of the persisted CLI session.
    pub fn session_path(&self) -> PathBuf {
        self.storage.home.join("session.json")
    }

    /// Path of the SQLite slot store.
    pub fn db_path(&self) -> PathBuf {
        self.storage.home.join("slots.db")
    }

    /// The path component of the redirect URL; requests hitting it are
    /// dispatched to the callback handler rather than redirected.
    pub fn callback_path(&self) -> String {
        match reqwest::Url::parse(&self.provider.redirect_url) {
            Ok(url) => url.path().to_string(),
            Err(_) => "/auth/callback".to_string(),
        }
    }

    /// Fail early when the provider credentials are missing.
    pub fn require_credentials(&self) -> Result<()> {
        if self.provider.client_id.is_empty() || self.provider.client_secret.is_empty() {
            anyhow::bail!(
                "provider credentials not configured; set {} and {} or fill in config.toml",
                ENV_CLIENT_ID,
                ENV_CLIENT_SECRET
            );
        }
        Ok(())
    }
}
