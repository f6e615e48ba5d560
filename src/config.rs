//! Configuration loading from TOML files
//!
//! Every section and key is optional; anything left out falls back to the
//! layout the field team uses (`logger-data/` in, `parsed-data/` out).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;
use tracing::warn;

use crate::contacts::{ContactWindow, DEFAULT_WINDOW_MINUTES};
use crate::placement::PlacementRule;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContactsConfig {
    /// Maximum minutes between two triggers that still counts as a contact
    pub window_minutes: f64,
}

impl Default for ContactsConfig {
    fn default() -> Self {
        Self {
            window_minutes: DEFAULT_WINDOW_MINUTES,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    pub rule: PlacementRule,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub animals: PathBuf,
    pub placements: PathBuf,
    pub foreign_tags: PathBuf,
    pub logger_numbers: PathBuf,
    pub logger_dir: PathBuf,
    pub triggers: PathBuf,
    pub contacts: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            animals: PathBuf::from("logger-data/MouseIDTrappingData.csv"),
            placements: PathBuf::from("logger-data/EWYT_Project_Logger_Movements.csv"),
            foreign_tags: PathBuf::from("logger-data/DifferentTags.txt"),
            logger_numbers: PathBuf::from("logger-data/LoggerNumbers.txt"),
            logger_dir: PathBuf::from("logger-data"),
            triggers: PathBuf::from("parsed-data/Triggers.csv"),
            contacts: PathBuf::from("parsed-data/Contacts.csv"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub contacts: ContactsConfig,
    pub placement: PlacementConfig,
    pub paths: PathsConfig,
}

impl Config {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&raw)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        config.window()?;
        Ok(config)
    }

    /// Loads `path` if it exists, otherwise returns defaults. A file that
    /// exists but does not parse is still an error.
    pub fn load_from_path(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            warn!(config_file = %path.display(), "config_not_found_using_defaults");
            Ok(Self::default())
        }
    }

    pub fn window(&self) -> anyhow::Result<ContactWindow> {
        Ok(ContactWindow::from_minutes(self.contacts.window_minutes)?)
    }
}
