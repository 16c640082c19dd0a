//! The active log file owned by the writer thread

use crate::error::{Error, Result};
use crate::format::write_record;
use crate::record::LogRecord;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Append-only handle to the file currently receiving log lines.
///
/// The size is tracked locally so that buffered bytes count towards the
/// rotation threshold before they reach the disk.
#[derive(Debug)]
pub struct ActiveFile {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    size: u64,
}

impl ActiveFile {
    /// Open `path` for appending, creating it and its parent directories if
    /// needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileOpen`] if the file cannot be opened.
    pub fn open(path: &Path) -> Result<Self> {
        let file = open_append(path).map_err(|source| Error::FileOpen {
            path: path.to_path_buf(),
            source,
        })?;
        let size = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            writer: Some(BufWriter::new(file)),
            size,
        })
    }

    /// Path of the active file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current size including buffered bytes
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Whether a handle is currently open
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.writer.is_some()
    }

    /// Append one record as a log line
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails or the file is closed.
    pub fn write_record(&mut self, record: &LogRecord) -> io::Result<()> {
        let writer = self.writer_mut()?;
        let mut counter = CountingWriter {
            inner: writer,
            written: 0,
        };
        let result = write_record(&mut counter, record);
        let written = counter.written;
        self.size += written;
        result
    }

    /// Push buffered bytes to the OS and force them to stable storage
    ///
    /// # Errors
    ///
    /// Returns an error if flushing or syncing fails.
    pub fn sync(&mut self) -> io::Result<()> {
        if let Some(writer) = self.writer.as_mut() {
            writer.flush()?;
            writer.get_ref().sync_data()?;
        }
        Ok(())
    }

    /// Flush, sync and drop the handle
    ///
    /// # Errors
    ///
    /// Returns an error if the final flush or sync fails. The handle is
    /// dropped either way.
    pub fn close(&mut self) -> io::Result<()> {
        let result = self.sync();
        self.writer = None;
        result
    }

    /// Open a fresh handle at the original path
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileOpen`] if the file cannot be opened.
    pub fn reopen(&mut self) -> Result<()> {
        *self = Self::open(&self.path)?;
        Ok(())
    }

    /// Discard the contents of the file without closing it
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be truncated.
    pub fn truncate(&mut self) -> io::Result<()> {
        let writer = self.writer_mut()?;
        writer.flush()?;
        writer.get_ref().set_len(0)?;
        writer.get_ref().sync_all()?;
        self.size = 0;
        Ok(())
    }

    fn writer_mut(&mut self) -> io::Result<&mut BufWriter<File>> {
        self.writer
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "log file is closed"))
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

struct CountingWriter<'a, W: Write> {
    inner: &'a mut W,
    written: u64,
}

impl<W: Write> Write for CountingWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Level;
    use tempfile::TempDir;

    fn record(message: &str) -> LogRecord {
        let mut record = LogRecord::new();
        record.clear(32, 256);
        record.fill("sink.rs", 7, Level::Warning, format_args!("{message}"));
        record
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("logs").join("app.log");

        let file = ActiveFile::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(file.size(), 0);
        assert!(file.is_open());
    }

    #[test]
    fn test_open_appends_to_existing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        fs::write(&path, b"existing\r\n").unwrap();

        let mut file = ActiveFile::open(&path).unwrap();
        assert_eq!(file.size(), 10);

        file.write_record(&record("appended")).unwrap();
        file.close().unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("existing\r\n["));
        assert!(contents.ends_with("appended\r\n"));
    }

    #[test]
    fn test_size_tracks_buffered_bytes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let mut file = ActiveFile::open(&path).unwrap();

        file.write_record(&record("one")).unwrap();
        let buffered = file.size();
        assert!(buffered > 0);

        file.sync().unwrap();
        assert_eq!(fs::metadata(&path).unwrap().len(), buffered);
    }

    #[test]
    fn test_write_after_close_fails() {
        let dir = TempDir::new().unwrap();
        let mut file = ActiveFile::open(&dir.path().join("app.log")).unwrap();
        file.close().unwrap();

        assert!(!file.is_open());
        assert!(file.write_record(&record("late")).is_err());

        file.reopen().unwrap();
        assert!(file.write_record(&record("again")).is_ok());
    }

    #[test]
    fn test_truncate_discards_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let mut file = ActiveFile::open(&path).unwrap();
        file.write_record(&record("gone")).unwrap();

        file.truncate().unwrap();
        assert_eq!(file.size(), 0);
        assert_eq!(fs::metadata(&path).unwrap().len(), 0);
    }

    #[test]
    fn test_open_directory_fails() {
        let dir = TempDir::new().unwrap();
        let result = ActiveFile::open(dir.path());
        assert!(matches!(result, Err(Error::FileOpen { .. })));
    }
}
