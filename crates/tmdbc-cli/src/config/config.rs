//! `AppConfig` struct and TOML read/write.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tmdbc_api::Scheme;

/// Default response language.
const DEFAULT_LANGUAGE: &str = "de";

/// Default fallback language.
const DEFAULT_FALLBACK_LANGUAGE: &str = "en";

/// Top-level application configuration.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// TMDB connection settings.
    #[serde(default)]
    pub tmdb: TmdbConfig,
}

/// TMDB connection configuration.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TmdbConfig {
    /// API key. Overridden by the `TMDB_API_KEY` environment variable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Language requested by default.
    #[serde(default = "default_language")]
    pub default_language: String,
    /// Language requested when a localized field is empty.
    #[serde(default = "default_fallback_language")]
    pub fallback_language: String,
    /// URL scheme (`http` or `https`).
    #[serde(default)]
    pub scheme: Scheme,
}

fn default_language() -> String {
    String::from(DEFAULT_LANGUAGE)
}

fn default_fallback_language() -> String {
    String::from(DEFAULT_FALLBACK_LANGUAGE)
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_language: default_language(),
            fallback_language: default_fallback_language(),
            scheme: Scheme::default(),
        }
    }
}

impl TmdbConfig {
    /// Picks the API key: a non-empty `env_key` wins over the config file.
    #[must_use]
    pub fn resolve_api_key(&self, env_key: Option<String>) -> Option<String> {
        env_key
            .filter(|key| !key.is_empty())
            .or_else(|| self.api_key.clone().filter(|key| !key.is_empty()))
    }
}

impl AppConfig {
    /// Loads config from a TOML file. Returns default if file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Saves config to a TOML file, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directory creation or file write fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("failed to serialize config to TOML")?;
        std::fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
    }
}
