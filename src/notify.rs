use std::{fmt, time::Duration};

/// How a notice should be styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

impl Level {
    /// How long a notice stays up before dismissing itself.
    #[must_use]
    pub const fn duration(self) -> Duration {
        match self {
            Self::Success => Duration::from_millis(2500),
            Self::Error => Duration::from_millis(3500),
            Self::Info | Self::Warning => Duration::from_millis(3000),
        }
    }
}

/// A transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: Level,
    pub message: String,
}

impl Notice {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = match self.level {
            Level::Info => "i",
            Level::Success => "✓",
            Level::Warning => "⚠",
            Level::Error => "✗",
        };
        write!(f, "{marker} {}", self.message)
    }
}
