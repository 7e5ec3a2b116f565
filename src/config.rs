use anyhow::{Context, Result};
use crate::geo::EtaModel;
use crate::playback::{PlaybackConfig, DEFAULT_RATE_MS};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Persistent application settings
///
/// Only startup preferences live here; playback position is never saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub rate_ms: u64,
    pub eta_model: EtaModel,
    pub auto_play: bool,
    pub json_output: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            rate_ms: DEFAULT_RATE_MS,
            eta_model: EtaModel::default(),
            auto_play: false,
            json_output: false,
        }
    }
}

impl AppSettings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("routeplay").join("settings.json"))
    }

    /// Load from the default location, falling back to defaults
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path).unwrap_or_else(|e| {
                warn!("Ignoring settings file: {:#}", e);
                Self::default()
            }),
            _ => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let settings: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        if settings.rate_ms == 0 {
            anyhow::bail!("rate_ms must be greater than 0 in {}", path.display());
        }
        debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Save to the default location
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path().context("No config directory on this platform")?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
    }

    pub fn playback_config(&self) -> PlaybackConfig {
        PlaybackConfig {
            rate_ms: self.rate_ms,
            eta_model: self.eta_model,
        }
    }
}
