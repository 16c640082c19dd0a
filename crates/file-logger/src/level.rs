//! Log severity levels

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Severity of a log entry.
///
/// Lower ordinal means higher severity. A logger whose threshold is `Info`
/// writes `Error`, `Warning` and `Info` entries and skips `Debug`.
#[repr(u8)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    /// Error level
    Error = 0,
    /// Warning level
    Warning = 1,
    /// Info level
    Info = 2,
    /// Debug level
    #[default]
    Debug = 3,
}

impl Level {
    /// Most severe level
    pub const MIN: Self = Self::Error;

    /// Least severe level
    pub const MAX: Self = Self::Debug;

    /// All levels, most severe first
    pub const ALL: [Self; 4] = [Self::Error, Self::Warning, Self::Info, Self::Debug];

    /// Name written to the log file
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Error => "Error",
            Self::Warning => "Warning",
            Self::Info => "Info",
            Self::Debug => "Debug",
        }
    }

    /// Numeric ordinal of this level
    #[must_use]
    pub const fn ordinal(self) -> u8 {
        self as u8
    }

    /// Convert an ordinal back into a level
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLevel`] if `ordinal` is greater than 3.
    pub fn from_ordinal(ordinal: u8) -> Result<Self> {
        match ordinal {
            0 => Ok(Self::Error),
            1 => Ok(Self::Warning),
            2 => Ok(Self::Info),
            3 => Ok(Self::Debug),
            other => Err(Error::InvalidLevel(other)),
        }
    }

    /// Whether an entry at `self` passes a `threshold`
    #[inline]
    #[must_use]
    pub const fn passes(self, threshold: Self) -> bool {
        self.ordinal() <= threshold.ordinal()
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for Level {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        Self::from_ordinal(value)
    }
}

impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|level| level.name() == s)
            .ok_or_else(|| Error::Parse(format!("unknown level name: {s}")))
    }
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::ERROR => Self::Error,
            tracing::Level::WARN => Self::Warning,
            tracing::Level::INFO => Self::Info,
            tracing::Level::DEBUG | tracing::Level::TRACE => Self::Debug,
        }
    }
}
