//! Producer-facing logger handle

use crate::config::FileLoggerConfig;
use crate::error::{Error, Result};
use crate::level::Level;
use crate::pool::{PoolStats, RecordPool};
use crate::record::{FILE_NAME_BLOCK, LogRecord, MESSAGE_BLOCK, basename, block_round};
use crate::rotation::Rotator;
use crate::sink::ActiveFile;
use crate::writer::{Shared, WriterLoop, WriterTiming};
use parking_lot::Mutex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, warn};

const WRITER_THREAD_NAME: &str = "file-logger-writer";

/// Asynchronous, size-rotated file logger.
///
/// Producers format entries into pooled records and hand them to a single
/// writer thread. Calling [`FileLogger::log`] never performs I/O; it blocks
/// only while every pooled record is in use.
///
/// Dropping the logger runs [`FileLogger::shutdown`].
#[derive(Debug)]
pub struct FileLogger {
    shared: Arc<Shared>,
    path: PathBuf,
    backpressure_delay: Duration,
    shutdown_poll: Duration,
    writer: Mutex<Option<JoinHandle<()>>>,
}

impl FileLogger {
    /// Start a logger with default tuning.
    ///
    /// `generation_limit` is the number of archives kept beside the active
    /// file and must lie in `0..=100`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] for a generation limit outside
    /// `0..=100`, [`Error::FileOpen`] if the file cannot be opened for
    /// appending and [`Error::ThreadCreation`] if the writer cannot start.
    pub fn create(
        path: impl Into<PathBuf>,
        max_file_size: u64,
        generation_limit: i32,
    ) -> Result<Self> {
        let generation_limit = u32::try_from(generation_limit).map_err(|_| {
            Error::InvalidConfiguration(format!(
                "generation limit {generation_limit} is outside 0..={}",
                crate::config::MAX_GENERATIONS
            ))
        })?;

        Self::with_config(
            FileLoggerConfig::builder(path)
                .max_file_size(max_file_size)
                .generation_limit(generation_limit)
                .build(),
        )
    }

    /// Start a logger from a full configuration
    ///
    /// # Errors
    ///
    /// See [`FileLogger::create`].
    pub fn with_config(config: FileLoggerConfig) -> Result<Self> {
        config.validate()?;

        let file = ActiveFile::open(&config.path)?;
        let shared = Arc::new(Shared::new(
            RecordPool::new(config.pool_capacity),
            config.level,
        ));
        let rotator = Rotator::new(
            config.max_file_size,
            config.generation_limit,
            config.rotation_settle,
        );
        let timing = WriterTiming {
            write_pause: config.write_pause,
            idle_pause: config.idle_pause,
            rotation_retry_interval: config.rotation_retry_interval,
        };

        let writer = WriterLoop::new(Arc::clone(&shared), file, rotator, timing);
        let handle = thread::Builder::new()
            .name(WRITER_THREAD_NAME.to_string())
            .spawn(move || writer.run())
            .map_err(Error::ThreadCreation)?;

        debug!(
            path = %config.path.display(),
            max_file_size = config.max_file_size,
            generation_limit = config.generation_limit,
            pool_capacity = config.pool_capacity,
            "file logger created"
        );

        Ok(Self {
            shared,
            path: config.path,
            backpressure_delay: config.backpressure_delay,
            shutdown_poll: config.shutdown_poll,
            writer: Mutex::new(Some(handle)),
        })
    }

    /// Change the output threshold. Takes effect for entries the writer has
    /// not yet dequeued.
    pub fn set_level(&self, level: Level) {
        self.shared.set_threshold(level);
    }

    /// Change the output threshold by ordinal
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLevel`] if `ordinal` is not in `0..=3`. The
    /// threshold is left unchanged in that case.
    pub fn set_level_ordinal(&self, ordinal: u8) -> Result<()> {
        self.set_level(Level::from_ordinal(ordinal)?);
        Ok(())
    }

    /// Current output threshold
    #[must_use]
    pub fn level(&self) -> Level {
        self.shared.threshold()
    }

    /// Path of the active log file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Pool occupancy snapshot
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.shared.pool.stats()
    }

    /// Submit one entry.
    ///
    /// `file` may be a full source path; only its basename is kept. Blocks
    /// while the pool is exhausted. After shutdown the entry is discarded.
    pub fn log(&self, file: &str, line: u32, level: Level, args: fmt::Arguments<'_>) {
        let file_name = basename(file);
        let message_hint = args.as_str().map_or(0, str::len);

        let Some(record) = self.shared.pool.acquire_blocking(
            block_round(file_name.len(), FILE_NAME_BLOCK),
            block_round(message_hint, MESSAGE_BLOCK),
            self.backpressure_delay,
        ) else {
            warn!(path = %self.path.display(), "log entry discarded after shutdown");
            return;
        };

        let mut lease = Lease {
            pool: &self.shared.pool,
            record: Some(record),
        };
        if let Some(record) = lease.record.as_mut() {
            record.fill(file_name, line, level, args);
        }
        lease.submit();
    }

    /// Block until every queued entry has been handed to the writer
    pub fn flush_pending(&self) {
        while !self.shared.pool.wait_drained(self.shutdown_poll) {
            if !self.writer_alive() {
                warn!(path = %self.path.display(), "log writer is not running, queue will not drain");
                return;
            }
        }
    }

    /// Drain pending entries, stop the writer and close the file.
    ///
    /// Idempotent. Entries logged concurrently with shutdown are written if
    /// their record was taken before the pool stopped.
    pub fn shutdown(&self) {
        let Some(handle) = self.writer.lock().take() else {
            return;
        };

        while !self.shared.pool.wait_drained(self.shutdown_poll) {
            if handle.is_finished() {
                break;
            }
        }
        self.shared.pool.stop();

        if let Err(e) = handle.join() {
            error!(path = %self.path.display(), "log writer thread panicked: {:?}", e);
        }
    }

    fn writer_alive(&self) -> bool {
        self.writer
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for FileLogger {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// A record taken from the pool that goes back to it unless submitted.
struct Lease<'a> {
    pool: &'a RecordPool,
    record: Option<LogRecord>,
}

impl Lease<'_> {
    fn submit(mut self) {
        if let Some(record) = self.record.take() {
            self.pool.enqueue(record);
        }
    }
}

impl Drop for Lease<'_> {
    fn drop(&mut self) {
        if let Some(record) = self.record.take() {
            self.pool.release(record);
        }
    }
}
