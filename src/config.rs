use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{Context, Result, anyhow};

use crate::fetcher::DEFAULT_ENDPOINT;

pub const DEFAULT_TITLE: &str = "EPS Secretaria Digital";
pub const ENDPOINT_ENV: &str = "SECRETARIA_ENDPOINT";

/// On-disk settings. Every field is optional; absent fields fall back to defaults.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serialize_submissions: Option<bool>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from the default location, or defaults if nothing is there.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("secretaria").join("config.json"))
    }
}

/// Values given on the command line or in the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub endpoint: Option<String>,
    pub serialize_submissions: bool,
}

/// Effective settings after layering overrides on the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub endpoint: String,
    pub title: String,
    pub request_timeout: Option<Duration>,
    pub serialize_submissions: bool,
}

impl Settings {
    pub fn resolve(config: Config, overrides: Overrides) -> Self {
        let endpoint = overrides
            .endpoint
            .filter(|e| !e.trim().is_empty())
            .or(config.endpoint)
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

        Self {
            endpoint,
            title: config.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            request_timeout: config
                .request_timeout_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
            serialize_submissions: overrides.serialize_submissions
                || config.serialize_submissions.unwrap_or(false),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::resolve(Config::new(), Overrides::default())
    }
}
