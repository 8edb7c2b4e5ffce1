//! Persisted user settings (`~/.sharpen.json`).
//!
//! A missing or unreadable settings file is never an error: the defaults
//! apply (target C# 12, safe rules only, no backups).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sharpen_core::LanguageLevel;
use tracing::{debug, warn};

use crate::selection::RuleSelection;

/// File name of the settings file in the user's home directory
pub const SETTINGS_FILE_NAME: &str = ".sharpen.json";

/// Settings-related errors
#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    #[error("Could not determine the home directory")]
    NoHomeDirectory,

    #[error("Failed to write settings to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Numeric C# version, e.g. `"12"`
    pub target_version: String,
    pub safe_only: bool,
    pub backup_enabled: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub disabled_rules: Vec<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub working_path: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            target_version: LanguageLevel::default().ordinal().to_string(),
            safe_only: true,
            backup_enabled: false,
            disabled_rules: Vec::new(),
            working_path: String::new(),
        }
    }
}

impl Settings {
    /// `~/.sharpen.json`, if a home directory is known
    pub fn default_path() -> Option<PathBuf> {
        std::env::var_os("HOME")
            .or_else(|| std::env::var_os("USERPROFILE"))
            .filter(|home| !home.is_empty())
            .map(|home| PathBuf::from(home).join(SETTINGS_FILE_NAME))
    }

    /// Load from the default location, falling back to defaults
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load from `path`, falling back to defaults when the file is missing
    /// or malformed
    pub fn load_from(path: &Path) -> Self {
        let data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "No settings file, using defaults");
                return Self::default();
            }
        };
        match serde_json::from_str(&data) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring malformed settings file");
                Self::default()
            }
        }
    }

    /// Save to the default location
    pub fn save(&self) -> Result<PathBuf, SettingsError> {
        let path = Self::default_path().ok_or(SettingsError::NoHomeDirectory)?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save as pretty-printed JSON
    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        let data = serde_json::to_string_pretty(self)?;
        fs::write(path, data).map_err(|source| SettingsError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Saved settings");
        Ok(())
    }

    /// The configured target level; unknown versions mean C# 12
    pub fn target_level(&self) -> LanguageLevel {
        self.target_version.parse().unwrap_or_default()
    }

    pub fn set_target_level(&mut self, level: LanguageLevel) {
        self.target_version = level.ordinal().to_string();
    }

    pub fn is_rule_disabled(&self, name: &str) -> bool {
        self.disabled_rules.iter().any(|r| r == name)
    }

    pub fn set_rule_disabled(&mut self, name: &str, disabled: bool) {
        if disabled {
            if !self.is_rule_disabled(name) {
                self.disabled_rules.push(name.to_string());
            }
        } else {
            self.disabled_rules.retain(|r| r != name);
        }
    }

    /// The directory a session starts in, if one was saved
    pub fn working_path(&self) -> Option<PathBuf> {
        (!self.working_path.is_empty()).then(|| PathBuf::from(&self.working_path))
    }

    /// Rule selection described by these settings
    pub fn selection(&self) -> RuleSelection {
        RuleSelection::new(self.target_level(), self.safe_only)
            .with_disabled(self.disabled_rules.iter().cloned())
    }
}
