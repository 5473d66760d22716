use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};

use crate::record::format_record;

/// File-name stem of the per-month log files.
pub const LOG_FILE_STEM: &str = "session-warden";

/// Errors that can occur during session log I/O.
#[derive(Debug, thiserror::Error)]
pub enum SessionLogError {
    #[error("failed to open session log file: {0}")]
    Open(std::io::Error),

    #[error("failed to append to session log: {0}")]
    Write(std::io::Error),
}

/// Name of the log file covering `date`'s calendar month.
pub fn month_file_name(date: NaiveDate) -> String {
    format!("{LOG_FILE_STEM}-{}.log", date.format("%Y-%m"))
}

/// Append-only writer producing one fixed-width record per call, one file
/// per calendar month.
///
/// Each call opens the current month's file in append mode and writes a
/// single newline-terminated record, relying on line-level append atomicity
/// — there is no cross-process locking, and concurrently written records
/// from other processes may interleave between calls.
pub struct SessionLogWriter {
    dir: PathBuf,
}

impl SessionLogWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the file the next [`append`](Self::append) would write to.
    pub fn current_path(&self) -> PathBuf {
        self.dir.join(month_file_name(Local::now().date_naive()))
    }

    /// Append one record.  An empty `host` is recorded as `localhost`.
    ///
    /// Failures are reported to the caller, which is expected to log them
    /// and carry on — a broken log file never alters an access decision.
    pub fn append(
        &self,
        service: &str,
        host: &str,
        login: &str,
        mode: &str,
        message: &str,
    ) -> Result<(), SessionLogError> {
        let now = Local::now();
        let path = self.dir.join(month_file_name(now.date_naive()));
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(SessionLogError::Open)?;

        let line = format_record(now, service, mode, login, host, message);
        file.write_all(line.as_bytes())
            .map_err(SessionLogError::Write)?;
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
