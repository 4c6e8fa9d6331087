//! Remembered user settings.
//!
//! Currently just the last download directory, so the next run can omit
//! `--directory`. Stored as JSON under `~/.earthpullr-rs/`. Everything here
//! is best-effort: a missing or unreadable file falls back to defaults and a
//! failed save only logs.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub download_path: Option<PathBuf>,
}

/// Default location of the settings file: `~/.earthpullr-rs/settings.json`.
/// Falls back to a relative path when no home directory can be resolved.
pub fn default_settings_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".earthpullr-rs")
        .join("settings.json")
}

impl UserSettings {
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(path = %path.display(), "Failed to read user settings: {e}");
                return Self::default();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(path = %path.display(), "Failed to parse user settings: {e}");
                Self::default()
            }
        }
    }

    /// Write the settings, creating the parent directory if needed.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let serialized = serde_json::to_vec_pretty(self)?;
        std::fs::write(path, serialized)
    }
}
