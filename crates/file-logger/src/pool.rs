//! Fixed-capacity record pool and the hand-off queue to the writer
//!
//! The free list, the pending queue and the running flag live behind a single
//! mutex. Records move by value between the two lists and the thread that is
//! currently filling or writing them, so every record is owned by exactly one
//! of {free list, pending queue, in-flight holder} at any instant.

use crate::record::LogRecord;
use chrono::Local;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::time::Duration;
use tracing::warn;

/// Default number of records in a pool
pub const DEFAULT_POOL_CAPACITY: usize = 256;

/// Snapshot of pool occupancy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Total number of records owned by the pool
    pub capacity: usize,
    /// Records available to producers
    pub free: usize,
    /// Records waiting for the writer
    pub pending: usize,
    /// Records held by a producer or the writer
    pub in_flight: usize,
}

impl PoolStats {
    /// Whether the occupancy adds up to the pool capacity
    #[must_use]
    pub const fn is_consistent(&self) -> bool {
        self.free + self.pending + self.in_flight == self.capacity
    }
}

#[derive(Debug)]
struct PoolState {
    free: Vec<LogRecord>,
    pending: VecDeque<LogRecord>,
    in_flight: usize,
    running: bool,
}

/// Arena of reusable log records plus the FIFO of records ready to write.
#[derive(Debug)]
pub(crate) struct RecordPool {
    capacity: usize,
    state: Mutex<PoolState>,
    /// Signalled when a record returns to the free list
    record_freed: Condvar,
    /// Signalled when a record is queued for the writer
    entry_queued: Condvar,
    /// Signalled when the pending queue becomes empty
    drained: Condvar,
}

impl RecordPool {
    /// Allocate a pool holding `capacity` records
    #[must_use]
    pub(crate) fn new(capacity: usize) -> Self {
        let free = (0..capacity).map(|_| LogRecord::new()).collect();

        Self {
            capacity,
            state: Mutex::new(PoolState {
                free,
                pending: VecDeque::with_capacity(capacity),
                in_flight: 0,
                running: true,
            }),
            record_freed: Condvar::new(),
            entry_queued: Condvar::new(),
            drained: Condvar::new(),
        }
    }

    /// Take a free record sized for the given buffer lengths.
    ///
    /// Returns `None` when the free list is exhausted or the pool has been
    /// stopped.
    pub(crate) fn acquire(&self, file_name_len: usize, message_len: usize) -> Option<LogRecord> {
        let mut record = {
            let mut state = self.state.lock();
            if !state.running {
                return None;
            }
            let record = state.free.pop()?;
            state.in_flight += 1;
            record
        };

        record.clear(file_name_len, message_len);
        Some(record)
    }

    /// Take a free record, waiting up to `retry` at a time for one to be
    /// released.
    ///
    /// Only returns `None` once the pool has been stopped.
    pub(crate) fn acquire_blocking(
        &self,
        file_name_len: usize,
        message_len: usize,
        retry: Duration,
    ) -> Option<LogRecord> {
        let mut record = {
            let mut state = self.state.lock();
            loop {
                if !state.running {
                    return None;
                }
                if let Some(record) = state.free.pop() {
                    state.in_flight += 1;
                    break record;
                }
                self.record_freed.wait_for(&mut state, retry);
            }
        };

        record.clear(file_name_len, message_len);
        Some(record)
    }

    /// Return a record to the free list. Buffers keep their capacity.
    ///
    /// A record the pool never lent is dropped instead of growing the pool.
    pub(crate) fn release(&self, record: LogRecord) {
        let mut state = self.state.lock();
        if state.in_flight == 0 {
            drop(state);
            warn!("released a record the pool never lent");
            return;
        }
        state.in_flight -= 1;
        state.free.push(record);
        drop(state);

        self.record_freed.notify_one();
    }

    /// Stamp a filled record and append it to the tail of the pending queue.
    ///
    /// The timestamp is taken under the lock, so queue order and timestamp
    /// order agree.
    pub(crate) fn enqueue(&self, mut record: LogRecord) {
        let mut state = self.state.lock();
        if state.in_flight == 0 {
            drop(state);
            warn!("queued a record the pool never lent");
            return;
        }
        state.in_flight -= 1;
        record.timestamp = Local::now();
        state.pending.push_back(record);
        drop(state);

        self.entry_queued.notify_one();
    }

    /// Remove the oldest pending record
    pub(crate) fn dequeue(&self) -> Option<LogRecord> {
        let mut state = self.state.lock();
        let record = state.pending.pop_front()?;
        state.in_flight += 1;
        let now_empty = state.pending.is_empty();
        drop(state);

        if now_empty {
            self.drained.notify_all();
        }
        Some(record)
    }

    /// Wait up to `timeout` for an entry to be queued.
    ///
    /// Returns whether the pending queue is non-empty afterwards. Once the
    /// pool is stopped this only waits while a producer still holds a record.
    pub(crate) fn wait_for_entry(&self, timeout: Duration) -> bool {
        let mut state = self.state.lock();
        if state.pending.is_empty() && (state.running || state.in_flight > 0) {
            self.entry_queued.wait_for(&mut state, timeout);
        }
        !state.pending.is_empty()
    }

    /// Wait up to `timeout` for the pending queue to empty.
    ///
    /// Returns whether the queue is empty afterwards.
    pub(crate) fn wait_drained(&self, timeout: Duration) -> bool {
        let mut state = self.state.lock();
        if !state.pending.is_empty() {
            self.drained.wait_for(&mut state, timeout);
        }
        state.pending.is_empty()
    }

    /// Clear the running flag and wake every waiter
    pub(crate) fn stop(&self) {
        self.state.lock().running = false;

        self.record_freed.notify_all();
        self.entry_queued.notify_all();
        self.drained.notify_all();
    }

    /// Whether the pool is stopped and nothing is left to write.
    ///
    /// A record lent out before the stop may still be queued, so the pool is
    /// only finished once every record has come back.
    #[must_use]
    pub(crate) fn is_finished(&self) -> bool {
        let state = self.state.lock();
        !state.running && state.pending.is_empty() && state.in_flight == 0
    }

    /// Occupancy snapshot taken under the lock
    #[must_use]
    pub(crate) fn stats(&self) -> PoolStats {
        let state = self.state.lock();
        PoolStats {
            capacity: self.capacity,
            free: state.free.len(),
            pending: state.pending.len(),
            in_flight: state.in_flight,
        }
    }
}

impl Default for RecordPool {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_CAPACITY)
    }
}
