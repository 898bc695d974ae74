use std::{
    ops::Not,
    path::{Path, PathBuf},
};

use chrono::NaiveTime;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{
    alarm::{ChimeStyle, Days, DEFAULT_SNOOZE_MINUTES},
    error::PersistenceError,
    format,
    storage::FileStore,
};

pub const APP_NAME: &str = "roosty_clockwork";

/// Persisted as the dark mode flag, `Dark` is `true`.
#[derive(Debug, Serialize, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Dark,
    #[default]
    Light,
}

impl Not for Theme {
    type Output = Self;

    fn not(self) -> Self::Output {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Dark => "dark",
            Self::Light => "light",
        })
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// where the alarms, laps and dark mode flag are kept
    pub data_dir: Option<PathBuf>,
    /// what a new alarm starts at in the editor
    #[serde(with = "format::hh_mm")]
    pub default_time: NaiveTime,
    pub default_days: Days,
    pub default_chime: ChimeStyle,
    pub default_snooze_minutes: u32,
    /// played when a countdown runs out
    pub timer_chime: ChimeStyle,
    /// preset countdowns in seconds
    pub timer_presets: Vec<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: None,
            default_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
            default_days: Days::WEEKDAYS,
            default_chime: ChimeStyle::default(),
            default_snooze_minutes: DEFAULT_SNOOZE_MINUTES,
            timer_chime: ChimeStyle::default(),
            timer_presets: vec![60, 180, 300, 600, 900, 1800],
        }
    }
}

impl Config {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Falls back to the defaults when the file is missing or unreadable.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        let config = match std::fs::read_to_string(path) {
            Ok(config) => config,
            Err(e) => {
                debug!("no config at {}: {e}", path.display());
                return Self::default();
            }
        };
        toml::from_str(&config).unwrap_or_else(|e| {
            warn!("couldn't parse config file {}: {e}", path.display());
            Self::default()
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), PersistenceError> {
        let config = toml::to_string(self).map_err(|source| PersistenceError::Encode {
            key: "config",
            source,
        })?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| PersistenceError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, config).map_err(|source| PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    fn project_dirs() -> Result<directories::ProjectDirs, PersistenceError> {
        directories::ProjectDirs::from("", "", APP_NAME).ok_or(PersistenceError::NoDataDir)
    }

    pub fn config_path() -> Result<PathBuf, PersistenceError> {
        let mut path = Self::project_dirs()?.config_dir().to_path_buf();
        path.push("config.toml");
        Ok(path)
    }

    pub fn is_config_present() -> bool {
        Self::config_path().is_ok_and(|path| path.exists())
    }

    pub fn data_dir(&self) -> Result<PathBuf, PersistenceError> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(Self::project_dirs()?.data_dir().to_path_buf()),
        }
    }

    pub fn sounds_path(&self) -> Result<PathBuf, PersistenceError> {
        let mut path = self.data_dir()?;
        path.push("sounds");
        Ok(path)
    }

    /// The on-disk store for this configuration.
    pub fn open_store(&self) -> Result<FileStore, PersistenceError> {
        Ok(FileStore::new(self.data_dir()?))
    }
}
