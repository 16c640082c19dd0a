//! Pooled log record with capacity-tracked buffers

use crate::level::Level;
use chrono::{DateTime, Local};
use std::fmt::{self, Write};

/// Block size used when sizing the file name buffer
pub const FILE_NAME_BLOCK: usize = 32;

/// Block size used when sizing the message buffer up front
pub const MESSAGE_BLOCK: usize = 256;

/// Block size used when a formatted message outgrows its buffer
pub const MESSAGE_GROW_BLOCK: usize = 8;

/// Round `len` up to a block boundary, always leaving at least half a block
/// of headroom.
#[inline]
#[must_use]
pub const fn block_round(len: usize, block: usize) -> usize {
    ((len + block / 2) / block + 1) * block
}

/// Strip any directory prefix from a source path
#[must_use]
pub fn basename(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// One log entry travelling between a producer and the writer.
///
/// Records are created once by the pool and reused. The `file_name` and
/// `message` buffers only ever grow: clearing a record keeps the allocation.
#[derive(Debug, Default)]
pub struct LogRecord {
    pub(crate) file_name: String,
    pub(crate) line: u32,
    pub(crate) level: Level,
    pub(crate) message: String,
    pub(crate) timestamp: DateTime<Local>,
}

impl LogRecord {
    /// Create an empty record with no allocated buffers
    #[must_use]
    pub fn new() -> Self {
        Self {
            level: Level::Info,
            ..Self::default()
        }
    }

    /// Reset the record and make sure both buffers hold at least the
    /// requested number of bytes.
    pub fn clear(&mut self, file_name_len: usize, message_len: usize) {
        self.file_name.clear();
        self.file_name.reserve_exact(file_name_len);
        self.line = 0;
        self.level = Level::Info;
        self.message.clear();
        self.message.reserve_exact(message_len);
    }

    /// Fill the record for a new entry. The capture time is set when the
    /// record is queued.
    pub fn fill(&mut self, file_name: &str, line: u32, level: Level, args: fmt::Arguments<'_>) {
        self.file_name.push_str(file_name);
        self.line = line;
        self.level = level;
        self.format_message(args);
    }

    /// Format `args` into the message buffer.
    ///
    /// The buffer is never grown mid-write. When the output does not fit, the
    /// buffer grows to the rounded required size and the message is
    /// formatted again.
    pub fn format_message(&mut self, args: fmt::Arguments<'_>) {
        loop {
            self.message.clear();
            let mut writer = CappedWriter {
                limit: self.message.capacity(),
                required: 0,
                buf: &mut self.message,
            };
            // Only a misbehaving Display impl can fail here; keep what was written.
            let _ = writer.write_fmt(args);
            let required = writer.required;

            if required <= self.message.capacity() {
                return;
            }

            self.message.clear();
            self.message
                .reserve_exact(block_round(required, MESSAGE_GROW_BLOCK));
        }
    }

    /// Basename of the source file
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Source line
    #[must_use]
    pub const fn line(&self) -> u32 {
        self.line
    }

    /// Severity
    #[must_use]
    pub const fn level(&self) -> Level {
        self.level
    }

    /// Formatted message
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Capture time
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    /// Allocated size of the file name buffer
    #[must_use]
    pub fn file_name_capacity(&self) -> usize {
        self.file_name.capacity()
    }

    /// Allocated size of the message buffer
    #[must_use]
    pub fn message_capacity(&self) -> usize {
        self.message.capacity()
    }
}

/// Writes into a `String` without ever reallocating it, counting how many
/// bytes the full output needs.
struct CappedWriter<'a> {
    buf: &'a mut String,
    limit: usize,
    required: usize,
}

impl Write for CappedWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let fits = self.required + s.len() <= self.limit;
        if fits && self.required == self.buf.len() {
            self.buf.push_str(s);
        }
        self.required += s.len();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_block_round() {
        assert_eq!(block_round(0, 32), 32);
        assert_eq!(block_round(15, 32), 32);
        assert_eq!(block_round(16, 32), 64);
        assert_eq!(block_round(8, 256), 256);
        assert_eq!(block_round(300, 8), 312);
    }

    #[test]
    fn test_basename() {
        assert_eq!(basename("app/main.ext"), "main.ext");
        assert_eq!(basename(r"C:\src\logger\main.cpp"), "main.cpp");
        assert_eq!(basename("a/b\\c/d.rs"), "d.rs");
        assert_eq!(basename("plain.rs"), "plain.rs");
        assert_eq!(basename("trailing/"), "");
    }

    #[test]
    fn test_clear_reserves_requested_capacity() {
        let mut record = LogRecord::new();
        record.clear(32, 256);

        assert!(record.file_name_capacity() >= 32);
        assert!(record.message_capacity() >= 256);
        assert!(record.file_name().is_empty());
        assert!(record.message().is_empty());
    }

    #[test]
    fn test_clear_never_shrinks() {
        let mut record = LogRecord::new();
        record.clear(64, 1024);
        let (name_cap, msg_cap) = (record.file_name_capacity(), record.message_capacity());

        record.clear(32, 256);

        assert_eq!(record.file_name_capacity(), name_cap);
        assert_eq!(record.message_capacity(), msg_cap);
    }

    #[test]
    fn test_fill_formats_message() {
        let mut record = LogRecord::new();
        record.clear(32, 256);
        record.fill(
            "main.ext",
            42,
            Level::Info,
            format_args!("Hello, {} count({})", "world", 7),
        );

        assert_eq!(record.file_name(), "main.ext");
        assert_eq!(record.line(), 42);
        assert_eq!(record.level(), Level::Info);
        assert_eq!(record.message(), "Hello, world count(7)");
    }

    #[test]
    fn test_oversized_message_grows_buffer() {
        let mut record = LogRecord::new();
        record.clear(32, 16);
        let long = "x".repeat(1000);

        record.format_message(format_args!("{long}!"));

        assert_eq!(record.message().len(), 1001);
        assert!(record.message_capacity() >= block_round(1001, MESSAGE_GROW_BLOCK));
        assert!(record.message().ends_with('!'));
    }

    #[test]
    fn test_message_that_fits_keeps_allocation() {
        let mut record = LogRecord::new();
        record.clear(32, 256);
        let before = record.message_capacity();

        record.format_message(format_args!("{}", "short"));

        assert_eq!(record.message_capacity(), before);
        assert_eq!(record.message(), "short");
    }

    proptest! {
        #[test]
        fn prop_block_round_leaves_headroom(
            len in 0usize..100_000,
            block in prop::sample::select(vec![FILE_NAME_BLOCK, MESSAGE_BLOCK, MESSAGE_GROW_BLOCK]),
        ) {
            let rounded = block_round(len, block);
            prop_assert_eq!(rounded % block, 0);
            prop_assert!(rounded - len > block / 2);
            prop_assert!(rounded - len <= block + block / 2);
        }
    }
}
