//! On-disk line format
//!
//! ```text
//! [YYYY-MM-DD HH:mm:ss.SSS <basename>:<line> <Level>] <message>\r\n
//! ```

use crate::error::{Error, Result};
use crate::level::Level;
use crate::record::LogRecord;
use chrono::NaiveDateTime;
use std::io::{self, Write};

/// Timestamp layout used inside a log line
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Line terminator written after every entry
pub const LINE_ENDING: &str = "\r\n";

/// Serialize one record as a log line
///
/// # Errors
///
/// Returns any error from the underlying writer.
pub fn write_record<W: Write>(out: &mut W, record: &LogRecord) -> io::Result<()> {
    write!(
        out,
        "[{} {}:{} {}] {}{}",
        record.timestamp().format(TIMESTAMP_FORMAT),
        record.file_name(),
        record.line(),
        record.level().name(),
        record.message(),
        LINE_ENDING,
    )
}

/// A log line parsed back into its parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    /// Capture time, millisecond precision
    pub timestamp: NaiveDateTime,
    /// Source file basename
    pub file_name: String,
    /// Source line
    pub line: u32,
    /// Severity
    pub level: Level,
    /// Message text
    pub message: String,
}

/// Parse a single line produced by [`write_record`].
///
/// A trailing `\r\n` or `\n` is accepted and stripped.
///
/// # Errors
///
/// Returns [`Error::Parse`] if the line does not match the format.
pub fn parse_line(line: &str) -> Result<ParsedLine> {
    let line = line
        .strip_suffix(LINE_ENDING)
        .or_else(|| line.strip_suffix('\n'))
        .unwrap_or(line);

    let rest = line
        .strip_prefix('[')
        .ok_or_else(|| Error::Parse(format!("missing '[': {line}")))?;

    // "YYYY-MM-DD HH:mm:ss.SSS" is always 23 bytes
    let (stamp, rest) = rest
        .split_at_checked(23)
        .ok_or_else(|| Error::Parse(format!("truncated timestamp: {line}")))?;
    let timestamp = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT)
        .map_err(|e| Error::Parse(format!("bad timestamp {stamp:?}: {e}")))?;

    let rest = rest
        .strip_prefix(' ')
        .ok_or_else(|| Error::Parse(format!("missing separator after timestamp: {line}")))?;
    let (header, message) = rest
        .split_once("] ")
        .ok_or_else(|| Error::Parse(format!("missing ']': {line}")))?;

    let (location, level) = header
        .rsplit_once(' ')
        .ok_or_else(|| Error::Parse(format!("missing level: {line}")))?;
    let (file_name, line_no) = location
        .rsplit_once(':')
        .ok_or_else(|| Error::Parse(format!("missing line number: {line}")))?;

    Ok(ParsedLine {
        timestamp,
        file_name: file_name.to_string(),
        line: line_no
            .parse()
            .map_err(|e| Error::Parse(format!("bad line number {line_no:?}: {e}")))?,
        level: level.parse()?,
        message: message.to_string(),
    })
}
