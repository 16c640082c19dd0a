//! Size-triggered rotation of the active log file
//!
//! Archives live beside the active file and are named
//! `<stem>YYYYMMDDHHmmssSSS.<ext>`. Because the timestamp has a fixed width,
//! sorting archive names lexicographically also sorts them by age.

use crate::error::{Error, Result};
use crate::sink::ActiveFile;
use chrono::{DateTime, Local, TimeDelta};
use glob::{Pattern, glob};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Timestamp layout inserted into archive names
pub const ARCHIVE_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S%3f";

const ARCHIVE_TIMESTAMP_LEN: usize = 17;

// Bounded so a clock that does not advance cannot spin forever.
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Result of a successful rotation
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RotationOutcome {
    /// Archive the active file was renamed to. `None` when history is
    /// disabled and the file was truncated instead.
    pub archived: Option<PathBuf>,
    /// Archives deleted to respect the generation limit
    pub pruned: Vec<PathBuf>,
}

/// Decides when to rotate and performs the rotation.
#[derive(Debug, Clone)]
pub struct Rotator {
    max_file_size: u64,
    generation_limit: u32,
    settle: Duration,
}

impl Rotator {
    /// Create a rotator
    #[must_use]
    pub const fn new(max_file_size: u64, generation_limit: u32, settle: Duration) -> Self {
        Self {
            max_file_size,
            generation_limit,
            settle,
        }
    }

    /// Whether the file has grown past the threshold
    #[must_use]
    pub const fn needs_rotation(&self, file: &ActiveFile) -> bool {
        file.size() > self.max_file_size
    }

    /// Archive the active file and prune old generations.
    ///
    /// When this returns, `file` is open again at its original path unless
    /// reopening itself failed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Rotation`] if the archive cannot be created and
    /// [`Error::FileOpen`] if the file cannot be reopened afterwards.
    pub fn rotate(&self, file: &mut ActiveFile) -> Result<RotationOutcome> {
        let active = file.path().to_path_buf();
        let archives = collect_archives(&active)?;
        let doomed = prune_count(archives.len(), self.generation_limit);

        debug!(
            path = %active.display(),
            size = file.size(),
            archives = archives.len(),
            doomed,
            "rotating log file"
        );

        let mut outcome = RotationOutcome {
            archived: None,
            pruned: remove_archives(&archives[..doomed]),
        };

        if self.generation_limit == 0 {
            file.truncate()
                .map_err(|e| rotation_error("truncate", &active, &e))?;
            info!(path = %active.display(), "log file truncated, history disabled");
            return Ok(outcome);
        }

        let archive = next_archive_path(&active)?;

        if let Err(e) = file.close() {
            warn!(path = %active.display(), error = %e, "failed to sync log file before rotation");
        }
        thread::sleep(self.settle);

        if let Err(e) = fs::rename(&active, &archive) {
            let err = rotation_error("rename", &active, &e);
            file.reopen()?;
            return Err(err);
        }
        file.reopen()?;

        info!(
            path = %active.display(),
            archive = %archive.display(),
            pruned = outcome.pruned.len(),
            "log file rotated"
        );
        outcome.archived = Some(archive);
        Ok(outcome)
    }
}

/// How many of the oldest archives must go so that, once one more is added,
/// at most `generation_limit` remain.
#[must_use]
pub fn prune_count(existing: usize, generation_limit: u32) -> usize {
    let limit = generation_limit as usize;
    (existing + 1).saturating_sub(limit).min(existing)
}

/// Archive name for `active` stamped with `at`
///
/// # Errors
///
/// Returns [`Error::Rotation`] if `active` has no file name.
pub fn archive_path(active: &Path, at: DateTime<Local>) -> Result<PathBuf> {
    let (stem, ext) = split_name(active)?;
    let stamp = at.format(ARCHIVE_TIMESTAMP_FORMAT);
    let name = match ext {
        Some(ext) => format!("{stem}{stamp}.{ext}"),
        None => format!("{stem}{stamp}"),
    };
    Ok(active.with_file_name(name))
}

/// List the archives belonging to `active`, oldest first
///
/// # Errors
///
/// Returns [`Error::Pattern`] if the directory cannot be expressed as a glob
/// pattern and [`Error::Io`] if it cannot be read.
pub fn collect_archives(active: &Path) -> Result<Vec<PathBuf>> {
    let (stem, ext) = split_name(active)?;
    let dir = match active.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let dir = dir
        .to_str()
        .ok_or_else(|| Error::Pattern(format!("non UTF-8 directory: {}", dir.display())))?;

    let mut pattern = format!("{}/{}*", Pattern::escape(dir), Pattern::escape(&stem));
    if let Some(ext) = &ext {
        pattern.push('.');
        pattern.push_str(&Pattern::escape(ext));
    }

    let mut archives = Vec::new();
    for entry in glob(&pattern).map_err(|e| Error::Pattern(e.to_string()))? {
        let path = entry.map_err(glob::GlobError::into_error)?;
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if is_archive_name(name, &stem, ext.as_deref()) && path.is_file() {
            archives.push(path);
        }
    }

    archives.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(archives)
}

fn is_archive_name(name: &str, stem: &str, ext: Option<&str>) -> bool {
    let Some(rest) = name.strip_prefix(stem) else {
        return false;
    };
    let stamp = match ext {
        Some(ext) => rest
            .strip_suffix(ext)
            .and_then(|rest| rest.strip_suffix('.')),
        None => Some(rest),
    };
    stamp.is_some_and(|s| s.len() == ARCHIVE_TIMESTAMP_LEN && s.bytes().all(|b| b.is_ascii_digit()))
}

fn split_name(active: &Path) -> Result<(String, Option<String>)> {
    let stem = active
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| Error::Rotation(format!("no usable file name in {}", active.display())))?;
    let ext = active
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_string);
    Ok((stem.to_string(), ext))
}

fn next_archive_path(active: &Path) -> Result<PathBuf> {
    let mut at = Local::now();
    for _ in 0..MAX_NAME_ATTEMPTS {
        let candidate = archive_path(active, at)?;
        if !candidate.exists() {
            return Ok(candidate);
        }
        at += TimeDelta::milliseconds(1);
    }
    Err(Error::Rotation(format!(
        "no free archive name for {}",
        active.display()
    )))
}

fn remove_archives(archives: &[PathBuf]) -> Vec<PathBuf> {
    let mut removed = Vec::with_capacity(archives.len());
    for archive in archives {
        match fs::remove_file(archive) {
            Ok(()) => {
                debug!(archive = %archive.display(), "removed old log archive");
                removed.push(archive.clone());
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(archive = %archive.display(), error = %e, "failed to remove old log archive");
            }
        }
    }
    removed
}

fn rotation_error(step: &str, path: &Path, err: &io::Error) -> Error {
    Error::Rotation(format!("{step} of {} failed: {err}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::Level;
    use crate::record::LogRecord;
    use chrono::{NaiveDate, TimeZone};
    use tempfile::TempDir;

    fn fixed_time() -> DateTime<Local> {
        Local
            .from_local_datetime(
                &NaiveDate::from_ymd_opt(2024, 3, 9)
                    .unwrap()
                    .and_hms_milli_opt(7, 5, 3, 21)
                    .unwrap(),
            )
            .unwrap()
    }

    fn write_lines(file: &mut ActiveFile, count: usize) {
        for i in 0..count {
            let mut record = LogRecord::new();
            record.clear(32, 256);
            record.fill("rotation.rs", 1, Level::Info, format_args!("line {i}"));
            file.write_record(&record).unwrap();
        }
    }

    fn seed_archives(dir: &Path, count: usize) -> Vec<PathBuf> {
        (0..count)
            .map(|i| {
                let path = dir.join(format!("app2020010100000000{i}.log"));
                fs::write(&path, format!("archive {i}")).unwrap();
                path
            })
            .collect()
    }

    #[test]
    fn test_archive_path_naming() {
        let at = fixed_time();

        assert_eq!(
            archive_path(Path::new("logs/log.txt"), at).unwrap(),
            PathBuf::from("logs/log20240309070503021.txt")
        );
        assert_eq!(
            archive_path(Path::new("logs/journal"), at).unwrap(),
            PathBuf::from("logs/journal20240309070503021")
        );
        assert_eq!(
            archive_path(Path::new("app.v2.log"), at).unwrap(),
            PathBuf::from("app.v220240309070503021.log")
        );
    }

    #[test]
    fn test_prune_count() {
        assert_eq!(prune_count(0, 10), 0);
        assert_eq!(prune_count(9, 10), 0);
        assert_eq!(prune_count(10, 10), 1);
        assert_eq!(prune_count(12, 10), 3);
        assert_eq!(prune_count(5, 0), 5);
        assert_eq!(prune_count(0, 0), 0);
    }

    #[test]
    fn test_collect_archives_filters_and_sorts() {
        let dir = TempDir::new().unwrap();
        let active = dir.path().join("app.log");
        fs::write(&active, "active").unwrap();

        fs::write(dir.path().join("app20240102000000000.log"), "b").unwrap();
        fs::write(dir.path().join("app20240101000000000.log"), "a").unwrap();
        fs::write(dir.path().join("app-old.log"), "x").unwrap();
        fs::write(dir.path().join("app2024.log"), "x").unwrap();
        fs::write(dir.path().join("app20240101000000000.txt"), "x").unwrap();
        fs::write(dir.path().join("other20240101000000000.log"), "x").unwrap();

        let archives = collect_archives(&active).unwrap();
        let names: Vec<_> = archives
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();

        assert_eq!(
            names,
            vec!["app20240101000000000.log", "app20240102000000000.log"]
        );
    }

    #[test]
    fn test_collect_archives_escapes_metacharacters() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("run[1]");
        fs::create_dir_all(&nested).unwrap();
        let active = nested.join("app.log");
        fs::write(nested.join("app20240101000000000.log"), "a").unwrap();

        assert_eq!(collect_archives(&active).unwrap().len(), 1);
    }

    #[test]
    fn test_rotate_archives_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let mut file = ActiveFile::open(&path).unwrap();
        write_lines(&mut file, 20);
        file.sync().unwrap();
        let before = fs::read(&path).unwrap();

        let rotator = Rotator::new(64, 3, Duration::ZERO);
        assert!(rotator.needs_rotation(&file));

        let outcome = rotator.rotate(&mut file).unwrap();
        let archive = outcome.archived.unwrap();

        assert_eq!(fs::read(&archive).unwrap(), before);
        assert!(file.is_open());
        assert_eq!(file.size(), 0);
        assert_eq!(fs::metadata(&path).unwrap().len(), 0);
        assert!(!rotator.needs_rotation(&file));
    }

    #[test]
    fn test_rotate_prunes_oldest() {
        let dir = TempDir::new().unwrap();
        let seeded = seed_archives(dir.path(), 4);
        let path = dir.path().join("app.log");
        let mut file = ActiveFile::open(&path).unwrap();
        write_lines(&mut file, 5);

        let outcome = Rotator::new(1, 2, Duration::ZERO)
            .rotate(&mut file)
            .unwrap();

        assert_eq!(outcome.pruned, seeded[..3].to_vec());
        let remaining = collect_archives(&path).unwrap();
        assert_eq!(remaining.len(), 2);
        assert_eq!(remaining[0], seeded[3]);
        assert_eq!(Some(&remaining[1]), outcome.archived.as_ref());
    }

    #[test]
    fn test_rotate_without_history_truncates() {
        let dir = TempDir::new().unwrap();
        seed_archives(dir.path(), 2);
        let path = dir.path().join("app.log");
        let mut file = ActiveFile::open(&path).unwrap();
        write_lines(&mut file, 5);

        let outcome = Rotator::new(1, 0, Duration::ZERO)
            .rotate(&mut file)
            .unwrap();

        assert!(outcome.archived.is_none());
        assert_eq!(outcome.pruned.len(), 2);
        assert!(collect_archives(&path).unwrap().is_empty());
        assert_eq!(fs::metadata(&path).unwrap().len(), 0);
        assert!(file.is_open());
    }

    #[test]
    fn test_failed_rename_reopens_active_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let mut file = ActiveFile::open(&path).unwrap();
        write_lines(&mut file, 5);

        // Renaming a file that no longer exists fails
        fs::remove_file(&path).unwrap();

        let result = Rotator::new(1, 3, Duration::ZERO).rotate(&mut file);
        assert!(matches!(result, Err(Error::Rotation(_))));
        assert!(file.is_open());
        assert!(path.exists());
        write_lines(&mut file, 1);
    }
}
