//! Application configuration
//!
//! Loads from `<data dir>/config.toml`. A missing or unreadable file falls
//! back to defaults; `GEMINI_API_KEY` overrides the stored key.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use gonggan_ai::{DEFAULT_IMAGE_MODEL, DEFAULT_TEXT_MODEL, HISTORY_LIMIT};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::paths;

pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GongganConfig {
    /// Model used for chat replies
    pub text_model: String,
    /// Model used for chat images and the image studio
    pub image_model: String,
    /// Trailing messages sent as history with each reply
    pub history_limit: usize,
    /// Where exported archives go; defaults to `<data dir>/exports`
    pub export_dir: Option<PathBuf>,
    pub gemini: GeminiConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

impl Default for GongganConfig {
    fn default() -> Self {
        Self {
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            history_limit: HISTORY_LIMIT,
            export_dir: None,
            gemini: GeminiConfig::default(),
        }
    }
}

impl GongganConfig {
    /// Load from the default path and apply environment overrides.
    pub fn load() -> Self {
        let config = match paths::config_path() {
            Ok(path) => Self::load_from_path(&path),
            Err(e) => {
                warn!(error = %e, "Could not resolve config path, using defaults");
                Self::default()
            }
        };
        config.with_api_key_override(std::env::var(GEMINI_API_KEY_ENV).ok())
    }

    pub fn load_from_path(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        let parsed = std::fs::read_to_string(path)
            .map_err(anyhow::Error::from)
            .and_then(|content| toml::from_str::<Self>(&content).map_err(anyhow::Error::from));
        match parsed {
            Ok(config) => match config.validate() {
                Ok(()) => config,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Invalid config, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Unreadable config, using defaults");
                Self::default()
            }
        }
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        self.validate().context("Invalid configuration")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))
    }

    /// A non-blank key from the environment replaces the stored one.
    pub fn with_api_key_override(mut self, key: Option<String>) -> Self {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.gemini.api_key = Some(key);
        }
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.history_limit == 0 || self.history_limit > HISTORY_LIMIT {
            return Err(anyhow::anyhow!(
                "History limit must be between 1 and {}",
                HISTORY_LIMIT
            ));
        }

        if self.text_model.trim().is_empty() {
            return Err(anyhow::anyhow!("Text model must not be empty"));
        }

        if self.image_model.trim().is_empty() {
            return Err(anyhow::anyhow!("Image model must not be empty"));
        }

        Ok(())
    }

    pub fn export_dir(&self) -> Result<PathBuf> {
        match &self.export_dir {
            Some(dir) => Ok(dir.clone()),
            None => paths::default_exports_dir(),
        }
    }
}
