//! Append-only sink for row-level failures.
//!
//! Lines look like
//! `2024-05-01 10:12:03,481 - ERROR - Erreur sur la ligne ID 3 : float division by zero`.

use super::probe::RowFailure;
use crate::error::{Result, ResultExt as _};
use chrono::Local;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

/// Local timestamp layout of each line
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// Error log scoped to one pipeline run
#[derive(Debug)]
pub struct ErrorLog<W: Write> {
    writer: W,
    written: usize,
}

impl ErrorLog<File> {
    /// Open `path` for appending, creating it and its parent directory.
    ///
    /// # Errors
    ///
    /// Returns `Io` when the directory or file cannot be created.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create error log directory {}", parent.display())
            })?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open error log {}", path.display()))?;
        Ok(Self::new(file))
    }
}

impl<W: Write> ErrorLog<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    /// Append one line for `failure`.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the write fails.
    pub fn record(&mut self, failure: &RowFailure) -> Result<()> {
        tracing::error!("{failure}");
        writeln!(
            self.writer,
            "{} - ERROR - {failure}",
            Local::now().format(TIMESTAMP_FORMAT)
        )
        .context("Failed to append to error log")?;
        self.written += 1;
        Ok(())
    }

    /// Append every failure, then flush.
    ///
    /// # Errors
    ///
    /// Returns `Io` on the first failed write.
    pub fn record_all(&mut self, failures: &[RowFailure]) -> Result<()> {
        for failure in failures {
            self.record(failure)?;
        }
        self.writer.flush().context("Failed to flush error log")
    }

    /// Lines written through this handle
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
