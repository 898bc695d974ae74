use std::{io, path::PathBuf};

use thiserror::Error;

use crate::alarm::AlarmId;

/// Everything that can go wrong in the clock.
/// None of these are fatal, callers surface them as a notice and carry on.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("no alarm with id {0}")]
    NotFound(AlarmId),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Bad user input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please select at least one day")]
    NoDays,

    #[error("invalid day `{0}`, expected 0 (Sunday) to 6 (Saturday)")]
    InvalidDay(String),

    #[error("invalid time `{0}`")]
    InvalidTime(String),

    #[error("Please set a valid time")]
    NonPositiveDuration,

    #[error("invalid duration `{0}`")]
    InvalidDuration(String),

    #[error("snooze must be at least one minute")]
    ZeroSnooze,

    #[error("unknown chime `{0}`")]
    UnknownChime(String),
}

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("couldn't access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("couldn't serialize {key}: {source}")]
    Encode {
        key: &'static str,
        #[source]
        source: toml::ser::Error,
    },

    #[error("couldn't find a data directory")]
    NoDataDir,

    #[error("store rejected write of {0}")]
    Rejected(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
