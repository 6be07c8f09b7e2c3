//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use tl_client::Client;
use tl_db::Database;

const DEFAULT_API_URL: &str = "http://localhost:8000/api";
const DEFAULT_RANGE_DAYS: u32 = 7;

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the remote time log store.
    pub api_url: String,
    /// Bearer token for the store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Path to the local preference database.
    pub database_path: PathBuf,
    /// Days covered by `list` and `summary` when no range is given.
    pub range_days: u32,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_url", &self.api_url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("database_path", &self.database_path)
            .field("range_days", &self.range_days)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token: None,
            database_path: data_dir.join("tl.db"),
            range_days: DEFAULT_RANGE_DAYS,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // TL_API_URL, TL_TOKEN, ...
        figment = figment.merge(Env::prefixed("TL_"));

        figment.extract()
    }

    /// Builds a store client, failing when no token is configured.
    pub fn client(&self) -> anyhow::Result<Client> {
        let token = self
            .token
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| anyhow::anyhow!("missing store token (set TL_TOKEN or token in config.toml)"))?;
        Client::new(&self.api_url, token).context("failed to create store client")
    }

    /// Opens the preference database, creating its directory if needed.
    pub fn open_database(&self) -> anyhow::Result<Database> {
        if let Some(parent) = self.database_path.parent() {
            std::fs::create_dir_all(parent).context("failed to create database directory")?;
        }
        Database::open(&self.database_path)
            .with_context(|| format!("failed to open {}", self.database_path.display()))
    }
}

/// Returns the platform-specific config directory for tl.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("tl"))
}

/// Returns the platform-specific data directory for tl.
///
/// On Linux: `~/.local/share/tl`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("tl"))
}
