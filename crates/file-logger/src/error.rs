//! Error types for file-based logging

use std::io;
use std::path::PathBuf;

/// Result type for file logger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during file logging
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Failed to open or create the log file for appending
    #[error("Failed to open log file at {path}: {source}")]
    FileOpen {
        /// The path that failed to open
        path: PathBuf,
        /// The underlying error
        source: io::Error,
    },

    /// Failed to start the writer thread
    #[error("Failed to create log writer thread: {0}")]
    ThreadCreation(io::Error),

    /// Failed to rotate log file
    #[error("Failed to rotate log file: {0}")]
    Rotation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    InvalidConfiguration(String),

    /// Level ordinal outside the defined range
    #[error("Log level {0} is out of range (expected 0..=3)")]
    InvalidLevel(u8),

    /// A log line did not match the on-disk format
    #[error("Failed to parse log line: {0}")]
    Parse(String),

    /// Archive enumeration pattern could not be built
    #[error("Invalid archive pattern: {0}")]
    Pattern(String),
}
