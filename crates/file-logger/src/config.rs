//! Configuration for the file logger

use crate::error::{Error, Result};
use crate::level::Level;
use crate::pool::DEFAULT_POOL_CAPACITY;
use std::path::PathBuf;
use std::time::Duration;

/// Largest accepted generation limit
pub const MAX_GENERATIONS: u32 = 100;

/// Configuration for a [`crate::FileLogger`]
#[derive(Debug, Clone)]
pub struct FileLoggerConfig {
    /// Path of the active log file
    pub path: PathBuf,
    /// Size in bytes above which the active file is rotated
    pub max_file_size: u64,
    /// Number of archived generations to keep (0..=100)
    pub generation_limit: u32,
    /// Initial output threshold
    pub level: Level,
    /// Number of pooled records; fixed for the lifetime of the logger
    pub pool_capacity: usize,
    /// How long a producer waits for a free record before retrying
    pub backpressure_delay: Duration,
    /// Pause between two writes in the drain phase
    pub write_pause: Duration,
    /// How long the writer idles when the queue is empty
    pub idle_pause: Duration,
    /// How often shutdown re-checks that the queue has drained
    pub shutdown_poll: Duration,
    /// Pause between closing the active file and renaming it
    pub rotation_settle: Duration,
    /// Minimum time before retrying a rotation that failed
    pub rotation_retry_interval: Duration,
}

impl Default for FileLoggerConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("logs/app.log"),
            max_file_size: 10 * 1024 * 1024, // 10 MB
            generation_limit: 10,
            level: Level::Debug,
            pool_capacity: DEFAULT_POOL_CAPACITY,
            backpressure_delay: Duration::from_millis(100),
            write_pause: Duration::from_millis(1),
            idle_pause: Duration::from_millis(50),
            shutdown_poll: Duration::from_millis(300),
            rotation_settle: Duration::from_millis(500),
            rotation_retry_interval: Duration::from_secs(30),
        }
    }
}

impl FileLoggerConfig {
    /// Create a builder writing to `path`
    pub fn builder(path: impl Into<PathBuf>) -> FileLoggerConfigBuilder {
        FileLoggerConfigBuilder::new(path)
    }

    /// Check that the configuration can be used to start a logger
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfiguration`] if the generation limit is
    /// above [`MAX_GENERATIONS`], the pool is empty or the path is empty.
    pub fn validate(&self) -> Result<()> {
        if self.generation_limit > MAX_GENERATIONS {
            return Err(Error::InvalidConfiguration(format!(
                "generation limit {} is outside 0..={MAX_GENERATIONS}",
                self.generation_limit
            )));
        }
        if self.pool_capacity == 0 {
            return Err(Error::InvalidConfiguration(
                "pool capacity must be at least 1".to_string(),
            ));
        }
        if self.path.as_os_str().is_empty() {
            return Err(Error::InvalidConfiguration(
                "log file path is empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for [`FileLoggerConfig`]
#[derive(Debug, Clone)]
pub struct FileLoggerConfigBuilder {
    config: FileLoggerConfig,
}

impl FileLoggerConfigBuilder {
    /// Start from the defaults with the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            config: FileLoggerConfig {
                path: path.into(),
                ..FileLoggerConfig::default()
            },
        }
    }

    /// Set the rotation threshold in bytes
    #[must_use]
    pub const fn max_file_size(mut self, bytes: u64) -> Self {
        self.config.max_file_size = bytes;
        self
    }

    /// Set how many archived generations to keep
    #[must_use]
    pub const fn generation_limit(mut self, limit: u32) -> Self {
        self.config.generation_limit = limit;
        self
    }

    /// Set the initial output threshold
    #[must_use]
    pub const fn level(mut self, level: Level) -> Self {
        self.config.level = level;
        self
    }

    /// Set the number of pooled records
    #[must_use]
    pub const fn pool_capacity(mut self, capacity: usize) -> Self {
        self.config.pool_capacity = capacity;
        self
    }

    /// Set the producer retry delay when the pool is exhausted
    #[must_use]
    pub const fn backpressure_delay(mut self, delay: Duration) -> Self {
        self.config.backpressure_delay = delay;
        self
    }

    /// Set the pause between writes
    #[must_use]
    pub const fn write_pause(mut self, pause: Duration) -> Self {
        self.config.write_pause = pause;
        self
    }

    /// Set the idle wait of the writer
    #[must_use]
    pub const fn idle_pause(mut self, pause: Duration) -> Self {
        self.config.idle_pause = pause;
        self
    }

    /// Set the shutdown drain polling interval
    #[must_use]
    pub const fn shutdown_poll(mut self, poll: Duration) -> Self {
        self.config.shutdown_poll = poll;
        self
    }

    /// Set the pause between closing and renaming during rotation
    #[must_use]
    pub const fn rotation_settle(mut self, pause: Duration) -> Self {
        self.config.rotation_settle = pause;
        self
    }

    /// Set how long to wait before retrying a failed rotation
    #[must_use]
    pub const fn rotation_retry_interval(mut self, interval: Duration) -> Self {
        self.config.rotation_retry_interval = interval;
        self
    }

    /// Finish building
    #[must_use]
    pub fn build(self) -> FileLoggerConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FileLoggerConfig::default();
        assert_eq!(config.pool_capacity, 256);
        assert_eq!(config.level, Level::Debug);
        assert_eq!(config.backpressure_delay, Duration::from_millis(100));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_pattern() {
        let config = FileLoggerConfig::builder("/tmp/x.log")
            .max_file_size(8192)
            .generation_limit(3)
            .level(Level::Info)
            .write_pause(Duration::ZERO)
            .build();

        assert_eq!(config.path, PathBuf::from("/tmp/x.log"));
        assert_eq!(config.max_file_size, 8192);
        assert_eq!(config.generation_limit, 3);
        assert_eq!(config.level, Level::Info);
        assert_eq!(config.write_pause, Duration::ZERO);
    }

    #[test]
    fn test_generation_limit_bounds() {
        for limit in [0, 1, 100] {
            let config = FileLoggerConfig::builder("a.log")
                .generation_limit(limit)
                .build();
            assert!(config.validate().is_ok(), "limit {limit}");
        }

        let config = FileLoggerConfig::builder("a.log")
            .generation_limit(101)
            .build();
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_zero_pool_rejected() {
        let config = FileLoggerConfig::builder("a.log").pool_capacity(0).build();
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidConfiguration(_))
        ));
    }
}
