//! Persistence of the three records the clock keeps between sessions:
//! the alarms, the stopwatch laps and the dark mode flag.
//!
//! Writes are whole-record and synchronous. A failed write never fails the
//! operation that caused it, it is logged and kept until the controller
//! collects it with [`Persistence::take_failure`]. Reads fall back to the
//! empty state when a record is missing or unreadable.

use std::{
    collections::HashMap,
    fs, io,
    path::PathBuf,
};

use log::{debug, error, warn};
use serde::{Deserialize, Serialize};

use crate::{alarm::Alarms, config::Theme, error::PersistenceError};

pub const KEY_ALARMS: &str = "alarms.toml";
pub const KEY_LAPS: &str = "laps.toml";
pub const KEY_DARK_MODE: &str = "dark_mode";

/// Key-value backend. Values are opaque text.
pub trait Store {
    /// `Ok(None)` when nothing was ever written under `key`.
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    fn write(&mut self, key: &str, value: &str) -> Result<(), PersistenceError>;
}

/// One file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn io_error(path: PathBuf) -> impl FnOnce(io::Error) -> PersistenceError {
        move |source| PersistenceError::Io { path, source }
    }
}

impl Store for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let path = self.dir.join(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::io_error(path)(e)),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        fs::create_dir_all(&self.dir).map_err(Self::io_error(self.dir.clone()))?;
        let path = self.dir.join(key);
        // write next to the record and rename so a crash never leaves half a file
        let tmp = self.dir.join(format!("{key}.tmp"));
        fs::write(&tmp, value).map_err(Self::io_error(tmp.clone()))?;
        fs::rename(&tmp, &path).map_err(Self::io_error(path))
    }
}

/// Keeps records for the lifetime of the value only.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    records: HashMap<String, String>,
    read_only: bool,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that refuses every write, like a browser store over quota.
    #[must_use]
    pub fn read_only() -> Self {
        Self {
            records: HashMap::new(),
            read_only: true,
        }
    }

    #[must_use]
    pub fn with_record(mut self, key: &str, value: &str) -> Self {
        self.records.insert(key.to_string(), value.to_string());
        self
    }
}

impl Store for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        Ok(self.records.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), PersistenceError> {
        if self.read_only {
            return Err(PersistenceError::Rejected(key.to_string()));
        }
        self.records.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Default)]
struct AlarmsRecord {
    #[serde(default)]
    alarms: Alarms,
}

#[derive(Serialize, Deserialize, Default)]
struct LapsRecord {
    #[serde(default)]
    laps: Vec<u64>,
}

/// Typed access to the clock's records on top of a [`Store`].
pub struct Persistence {
    store: Box<dyn Store>,
    failure: Option<PersistenceError>,
}

impl std::fmt::Debug for Persistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Persistence")
            .field("failure", &self.failure)
            .finish_non_exhaustive()
    }
}

impl Persistence {
    pub fn new(store: impl Store + 'static) -> Self {
        Self {
            store: Box::new(store),
            failure: None,
        }
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.store.read(key) {
            Ok(value) => value,
            Err(e) => {
                warn!("couldn't read {key}, starting empty: {e}");
                None
            }
        }
    }

    fn write(&mut self, key: &'static str, encoded: Result<String, toml::ser::Error>) {
        let result = encoded
            .map_err(|source| PersistenceError::Encode { key, source })
            .and_then(|value| self.store.write(key, &value));
        match result {
            Ok(()) => debug!("saved {key}"),
            Err(e) => {
                error!("couldn't save {key}: {e}");
                self.failure = Some(e);
            }
        }
    }

    /// The most recent write failure since the last call, if any.
    pub fn take_failure(&mut self) -> Option<PersistenceError> {
        self.failure.take()
    }

    #[must_use]
    pub fn load_alarms(&self) -> Alarms {
        self.read(KEY_ALARMS)
            .and_then(|raw| match toml::from_str::<AlarmsRecord>(&raw) {
                Ok(record) => Some(record.alarms),
                Err(e) => {
                    warn!("ignoring corrupt alarm record: {e}");
                    None
                }
            })
            .filter(|alarms| {
                alarms.iter().all(|alarm| match alarm.settings().validate() {
                    Ok(_) => true,
                    Err(e) => {
                        warn!("ignoring alarm record, {} is invalid: {e}", alarm.id);
                        false
                    }
                })
            })
            .unwrap_or_default()
    }

    pub fn save_alarms(&mut self, alarms: &Alarms) {
        let record = AlarmsRecord {
            alarms: alarms.clone(),
        };
        self.write(KEY_ALARMS, toml::to_string(&record));
    }

    #[must_use]
    pub fn load_laps(&self) -> Vec<u64> {
        self.read(KEY_LAPS)
            .and_then(|raw| match toml::from_str::<LapsRecord>(&raw) {
                Ok(record) => Some(record.laps),
                Err(e) => {
                    warn!("ignoring corrupt lap record: {e}");
                    None
                }
            })
            .unwrap_or_default()
    }

    pub fn save_laps(&mut self, laps: &[u64]) {
        let record = LapsRecord {
            laps: laps.to_vec(),
        };
        self.write(KEY_LAPS, toml::to_string(&record));
    }

    /// The dark mode flag, stored as the text `true` or `false`.
    #[must_use]
    pub fn load_theme(&self) -> Theme {
        match self.read(KEY_DARK_MODE).as_deref().map(str::trim) {
            Some("true") => Theme::Dark,
            Some("false") | None => Theme::Light,
            Some(other) => {
                warn!("ignoring corrupt dark mode flag `{other}`");
                Theme::default()
            }
        }
    }

    pub fn save_theme(&mut self, theme: Theme) {
        self.write(KEY_DARK_MODE, Ok((theme == Theme::Dark).to_string()));
    }
}
