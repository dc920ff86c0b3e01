use std::fs::{File, OpenOptions, create_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use tracing::warn;

use crate::errors::ExecutionError;

/// Fixed file name of the append-only error log.
pub const ERROR_LOG_FILE: &str = "rowforge_errors.log";

/// Append-only sink for per-iteration error messages.
#[derive(Debug)]
pub struct ErrorLog {
    path: Option<PathBuf>,
    file: Mutex<Option<File>>,
}

impl ErrorLog {
    /// Open (or create) `<dir>/rowforge_errors.log` for appending.
    pub fn open(dir: &Path) -> Result<Self, ExecutionError> {
        create_dir_all(dir)?;
        let path = dir.join(ERROR_LOG_FILE);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path: Some(path),
            file: Mutex::new(Some(file)),
        })
    }

    /// A sink that only reports through tracing.
    pub fn disabled() -> Self {
        Self {
            path: None,
            file: Mutex::new(None),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn append(&self, message: &str) {
        let mut guard = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(file) = guard.as_mut() else {
            return;
        };

        let line = format!("{} {message}\n", Utc::now().to_rfc3339());
        if let Err(err) = file.write_all(line.as_bytes()) {
            warn!(event = "error_log_write_failed", error = %err);
        }
    }
}
