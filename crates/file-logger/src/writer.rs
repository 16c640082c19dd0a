//! Background writer thread

use crate::level::Level;
use crate::pool::RecordPool;
use crate::rotation::Rotator;
use crate::sink::ActiveFile;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// State shared between a [`crate::FileLogger`] handle and its writer thread
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) pool: RecordPool,
    threshold: AtomicU8,
}

impl Shared {
    pub(crate) fn new(pool: RecordPool, threshold: Level) -> Self {
        Self {
            pool,
            threshold: AtomicU8::new(threshold.ordinal()),
        }
    }

    pub(crate) fn threshold(&self) -> Level {
        // Only valid ordinals are ever stored
        Level::from_ordinal(self.threshold.load(Ordering::Relaxed)).unwrap_or_default()
    }

    pub(crate) fn set_threshold(&self, level: Level) {
        self.threshold.store(level.ordinal(), Ordering::Relaxed);
    }
}

/// Pauses used by the writer loop
#[derive(Debug, Clone, Copy)]
pub(crate) struct WriterTiming {
    pub(crate) write_pause: Duration,
    pub(crate) idle_pause: Duration,
    pub(crate) rotation_retry_interval: Duration,
}

/// Drains the pending queue into the active file until the logger stops.
#[derive(Debug)]
pub(crate) struct WriterLoop {
    shared: Arc<Shared>,
    file: ActiveFile,
    rotator: Rotator,
    timing: WriterTiming,
    dirty: bool,
    written: u64,
    skipped: u64,
    rotation_blocked_until: Option<Instant>,
    reopen_failing: bool,
}

impl WriterLoop {
    pub(crate) const fn new(
        shared: Arc<Shared>,
        file: ActiveFile,
        rotator: Rotator,
        timing: WriterTiming,
    ) -> Self {
        Self {
            shared,
            file,
            rotator,
            timing,
            dirty: false,
            written: 0,
            skipped: 0,
            rotation_blocked_until: None,
            reopen_failing: false,
        }
    }

    /// Run until the pool is stopped and every lent record has come back
    pub(crate) fn run(mut self) {
        debug!(path = %self.file.path().display(), "log writer started");

        loop {
            self.drain();

            if self.pool().is_finished() {
                break;
            }
            self.idle();
        }

        if let Err(e) = self.file.close() {
            error!(path = %self.file.path().display(), error = %e, "failed to close log file");
        }
        info!(
            path = %self.file.path().display(),
            written = self.written,
            skipped = self.skipped,
            "log writer stopped"
        );
    }

    fn pool(&self) -> &RecordPool {
        &self.shared.pool
    }

    /// Runs before every dequeue so sustained load cannot postpone rotation.
    fn check_rotation(&mut self) {
        if !self.file.is_open() && !self.reopen() {
            return;
        }

        if let Some(until) = self.rotation_blocked_until {
            if Instant::now() < until {
                return;
            }
            self.rotation_blocked_until = None;
        }

        if !self.rotator.needs_rotation(&self.file) {
            return;
        }

        match self.rotator.rotate(&mut self.file) {
            Ok(_) => self.dirty = false,
            Err(e) => {
                error!(
                    path = %self.file.path().display(),
                    error = %e,
                    retry_in = ?self.timing.rotation_retry_interval,
                    "log rotation failed"
                );
                self.block_rotation();
            }
        }
    }

    /// Reopening is retried on every cycle; only the first failure in a row
    /// is reported.
    fn reopen(&mut self) -> bool {
        match self.file.reopen() {
            Ok(()) => {
                if self.reopen_failing {
                    info!(path = %self.file.path().display(), "log file reopened");
                }
                self.reopen_failing = false;
                true
            }
            Err(e) => {
                if !self.reopen_failing {
                    error!(path = %self.file.path().display(), error = %e, "failed to reopen log file");
                }
                self.reopen_failing = true;
                false
            }
        }
    }

    fn block_rotation(&mut self) {
        self.rotation_blocked_until = Some(Instant::now() + self.timing.rotation_retry_interval);
    }

    fn drain(&mut self) {
        loop {
            self.check_rotation();
            let Some(record) = self.pool().dequeue() else {
                break;
            };
            let threshold = self.shared.threshold();

            if record.level().passes(threshold) {
                match self.file.write_record(&record) {
                    Ok(()) => {
                        self.dirty = true;
                        self.written += 1;
                    }
                    Err(e) => {
                        error!(
                            path = %self.file.path().display(),
                            error = %e,
                            "failed to write log entry"
                        );
                    }
                }
            } else {
                self.skipped += 1;
            }
            self.pool().release(record);

            if !self.timing.write_pause.is_zero() {
                thread::sleep(self.timing.write_pause);
            }
        }
    }

    fn idle(&mut self) {
        if self.dirty {
            if let Err(e) = self.file.sync() {
                error!(path = %self.file.path().display(), error = %e, "failed to sync log file");
            }
            self.dirty = false;
        }
        self.pool().wait_for_entry(self.timing.idle_pause);
    }
}
