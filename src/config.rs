use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};

use crate::client::{JournalClient, DEFAULT_URL};

const APP_NAME: &str = "slot-journal";
const CONFIG_FILE: &str = "config.json";

/// Settings shared by the server and the CLI client.
///
/// Read from `<config dir>/slot-journal/config.json`; `SLOT_JOURNAL_*`
/// environment variables override the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JournalConfig {
    /// Port the HTTP API listens on.
    pub port: u16,
    /// SQLite file. Falls back to the platform data directory when unset.
    pub db_path: Option<PathBuf>,
    /// Base URL the client talks to.
    pub server_url: String,
    pub api_key: Option<String>,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            db_path: None,
            server_url: DEFAULT_URL.to_string(),
            api_key: None,
        }
    }
}

impl JournalConfig {
    /// Load configuration from the user's config directory and the
    /// environment. Returns defaults if the file is missing or unreadable.
    pub fn load() -> Self {
        let file = match config_path().and_then(|path| Self::load_from(&path)) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config, using defaults: {:#}", e);
                Self::default()
            }
        };
        file.with_overrides(|name| std::env::var(name).ok())
    }

    /// Read a config file. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config = serde_json::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// Apply `SLOT_JOURNAL_*` overrides read through `lookup`.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup("SLOT_JOURNAL_URL") {
            self.server_url = url;
        }
        if let Some(key) = lookup("SLOT_JOURNAL_API_KEY").filter(|k| !k.is_empty()) {
            self.api_key = Some(key);
        }
        if let Some(port) = lookup("SLOT_JOURNAL_PORT") {
            match port.parse() {
                Ok(port) => self.port = port,
                Err(_) => tracing::warn!("Ignoring invalid SLOT_JOURNAL_PORT: {}", port),
            }
        }
        if let Some(path) = lookup("SLOT_JOURNAL_DB") {
            self.db_path = Some(PathBuf::from(path));
        }
        self
    }

    pub fn client(&self) -> JournalClient {
        JournalClient::new(&self.server_url, self.api_key.clone())
    }
}

pub fn config_path() -> Result<PathBuf> {
    let mut path =
        config_dir().ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    path.push(APP_NAME);
    path.push(CONFIG_FILE);
    Ok(path)
}
