//! Rotating file reporter

use super::Reporter;
use crate::format::{default_message_formatter, default_time_format, MessageFormatter, TimeFormat};
use crate::record::{LogRecord, RecordLevel};
use crate::{Error, Result};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// Maps a record's level and scope to a file base name (without `.log`)
pub type FileNameFn = Arc<dyn Fn(RecordLevel, Option<&str>) -> String + Send + Sync>;

/// File reporter configuration
#[derive(Clone)]
pub struct FileReporterOptions {
    /// Directory holding current and rotated files
    pub log_dir: PathBuf,

    /// Maximum size of one file in MB before rotation
    pub max_size_mb: f64,

    /// Number of numbered backups to keep
    pub max_backups: u32,

    pub time_format: TimeFormat,

    pub file_name: FileNameFn,

    pub formatter: MessageFormatter,
}

impl Default for FileReporterOptions {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("./logs"),
            max_size_mb: 1.0,
            max_backups: 50,
            time_format: default_time_format(),
            file_name: Arc::new(|_, _| "app".to_string()),
            formatter: default_message_formatter(),
        }
    }
}

impl FileReporterOptions {
    pub fn with_log_dir(mut self, log_dir: impl Into<PathBuf>) -> Self {
        self.log_dir = log_dir.into();
        self
    }

    pub fn with_max_size_mb(mut self, max_size_mb: f64) -> Self {
        self.max_size_mb = max_size_mb;
        self
    }

    pub fn with_max_backups(mut self, max_backups: u32) -> Self {
        self.max_backups = max_backups;
        self
    }

    pub fn with_time_format(mut self, time_format: TimeFormat) -> Self {
        self.time_format = time_format;
        self
    }

    pub fn with_file_name<F>(mut self, file_name: F) -> Self
    where
        F: Fn(RecordLevel, Option<&str>) -> String + Send + Sync + 'static,
    {
        self.file_name = Arc::new(file_name);
        self
    }

    pub fn with_formatter(mut self, formatter: MessageFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    /// Size limit in bytes, `max_size_mb * 2^20` truncated
    pub fn max_bytes(&self) -> u64 {
        if self.max_size_mb.is_finite() && self.max_size_mb > 0.0 {
            (self.max_size_mb * (1u64 << 20) as f64) as u64
        } else {
            0
        }
    }
}

/// An open log file and the number of bytes it holds
struct Bucket {
    file: File,
    size: u64,
}

#[derive(Default)]
struct FileState {
    /// (level, scope) -> base name
    names: HashMap<(RecordLevel, Option<String>), String>,
    /// base name -> open file
    buckets: HashMap<String, Bucket>,
}

/// Writes records to `<log_dir>/<name>.log`, rotating into
/// `<name>.1.log ..= <name>.<max_backups>.log` once the current file reaches
/// the size limit.
///
/// The size check happens before each write, so a file may exceed the limit
/// by up to one record before the next write rotates it.
pub struct FileReporter {
    log_dir: PathBuf,
    max_bytes: u64,
    max_backups: u32,
    time_format: TimeFormat,
    file_name: FileNameFn,
    formatter: MessageFormatter,
    state: Mutex<FileState>,
}

impl FileReporter {
    /// Create the reporter, creating the log directory if needed
    pub fn new(options: FileReporterOptions) -> Result<Self> {
        let max_bytes = options.max_bytes();

        if !options.log_dir.exists() {
            fs::create_dir_all(&options.log_dir)?;
        }

        debug!(
            scopelog.event = "file_reporter_created",
            log_dir = %options.log_dir.display(),
            max_bytes = max_bytes,
            max_backups = options.max_backups,
            "File reporter created"
        );

        Ok(Self {
            log_dir: options.log_dir,
            max_bytes,
            max_backups: options.max_backups,
            time_format: options.time_format,
            file_name: options.file_name,
            formatter: options.formatter,
            state: Mutex::new(FileState::default()),
        })
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Path of the current file for a base name
    pub fn current_path(&self, name: &str) -> PathBuf {
        self.log_dir.join(format!("{}.log", name))
    }

    /// Path of the `index`th backup for a base name
    pub fn backup_path(&self, name: &str, index: u32) -> PathBuf {
        self.log_dir.join(format!("{}.{}.log", name, index))
    }

    /// Number of files currently held open
    pub fn bucket_count(&self) -> usize {
        self.lock_state().buckets.len()
    }

    /// Flush every open file
    pub fn flush(&self) -> Result<()> {
        let mut state = self.lock_state();
        for bucket in state.buckets.values_mut() {
            bucket.file.flush()?;
        }
        Ok(())
    }

    fn lock_state(&self) -> MutexGuard<'_, FileState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn resolve_name(
        &self,
        state: &mut FileState,
        level: RecordLevel,
        scope: Option<&str>,
    ) -> String {
        let key = (level, scope.map(str::to_string));
        state
            .names
            .entry(key)
            .or_insert_with(|| (self.file_name)(level, scope))
            .clone()
    }

    /// Open `<name>.log` for appending and read its current size
    fn open_bucket(&self, name: &str) -> Result<Bucket> {
        let path = self.current_path(name);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        let size = match file.metadata() {
            Ok(metadata) => metadata.len(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => 0,
            Err(e) => return Err(e.into()),
        };

        debug!(
            scopelog.event = "log_file_opened",
            file_path = %path.display(),
            current_size = size,
            "Log file opened"
        );

        Ok(Bucket { file, size })
    }

    /// Shift backups up by one and move the current file to `<name>.1.log`
    ///
    /// The bucket's handle must already be closed.
    fn rotate(&self, name: &str) -> Result<()> {
        let current = self.current_path(name);

        if self.max_backups == 0 {
            if current.exists() {
                fs::remove_file(&current)?;
            }
            info!(
                scopelog.event = "log_discarded",
                file = %current.display(),
                "Log file discarded, no backups kept"
            );
            return Ok(());
        }

        for index in (1..self.max_backups).rev() {
            let source = self.backup_path(name, index);
            if source.exists() {
                move_file(&source, &self.backup_path(name, index + 1))?;
            }
        }

        let first_backup = self.backup_path(name, 1);
        if current.exists() {
            move_file(&current, &first_backup)?;
        }

        info!(
            scopelog.event = "log_rotated",
            old_file = %current.display(),
            new_file = %first_backup.display(),
            "Log file rotated"
        );

        Ok(())
    }

    fn write_record(&self, record: &LogRecord) -> Result<()> {
        let mut line = (self.formatter)(record, &self.time_format);
        line.push('\n');

        let mut state = self.lock_state();
        let name = self.resolve_name(&mut state, record.level, record.scope());

        // The bucket stays out of the map until the write succeeds, so a
        // failure anywhere below leaves nothing stale cached.
        let bucket = match state.buckets.remove(&name) {
            Some(bucket) => bucket,
            None => self.open_bucket(&name)?,
        };

        // An empty file never rotates, even when the limit rounds to zero
        let mut bucket = if bucket.size > 0 && bucket.size >= self.max_bytes {
            drop(bucket);
            self.rotate(&name)?;
            self.open_bucket(&name)?
        } else {
            bucket
        };

        bucket.file.write_all(line.as_bytes())?;
        bucket.size += line.len() as u64;

        state.buckets.insert(name, bucket);
        Ok(())
    }
}

fn move_file(from: &Path, to: &Path) -> Result<()> {
    fs::rename(from, to).map_err(|e| Error::Rotation {
        message: format!(
            "Failed to move {} to {}: {}",
            from.display(),
            to.display(),
            e
        ),
    })
}

impl Reporter for FileReporter {
    fn report(&self, record: &LogRecord) -> Result<()> {
        self.write_record(record)
    }
}
