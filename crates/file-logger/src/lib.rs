//! Asynchronous file logger with pooled records and size-based rotation
//!
//! Producers on any thread format entries into records borrowed from a fixed
//! pool and queue them for a single writer thread. The writer appends each
//! entry to the active file as
//!
//! ```text
//! [2024-03-09 07:05:03.021 main.rs:42 Info] Hello, world count(7)
//! ```
//!
//! and, once the file grows past its size limit, renames it to
//! `<stem>YYYYMMDDHHmmssSSS.<ext>` keeping a bounded number of generations.
//!
//! ```no_run
//! use proven_file_logger::{FileLogger, Level, log_info};
//!
//! let logger = FileLogger::create("logs/app.log", 8192, 10)?;
//! logger.set_level(Level::Info);
//! log_info!(logger, "Hello, {} count({})", "world", 7);
//! logger.shutdown();
//! # Ok::<(), proven_file_logger::Error>(())
//! ```
//!
//! Logging never fails and never touches the disk on the caller's thread.
//! When every record is in use the caller waits for the writer to return
//! one. Shutdown (explicit or on drop) writes everything already queued.

#![warn(missing_docs, unreachable_pub)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod format;
mod layer;
mod level;
mod logger;
mod macros;
mod pool;
mod record;
mod rotation;
mod sink;
mod writer;

pub use config::{FileLoggerConfig, FileLoggerConfigBuilder, MAX_GENERATIONS};
pub use error::{Error, Result};
pub use format::{LINE_ENDING, ParsedLine, TIMESTAMP_FORMAT, parse_line, write_record};
pub use layer::FileLoggerLayer;
pub use level::Level;
pub use logger::FileLogger;
pub use pool::{DEFAULT_POOL_CAPACITY, PoolStats};
pub use record::{
    FILE_NAME_BLOCK, LogRecord, MESSAGE_BLOCK, MESSAGE_GROW_BLOCK, basename, block_round,
};
pub use rotation::{
    ARCHIVE_TIMESTAMP_FORMAT, RotationOutcome, Rotator, archive_path, collect_archives,
    prune_count,
};
pub use sink::ActiveFile;
