//! Events emitted by the watcher service

use polars::prelude::DataFrame;
use std::path::PathBuf;

/// Watcher service state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherServiceState {
    Idle,
    Watching,
    Ingesting,
    Error,
}

impl std::fmt::Display for WatcherServiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Watching => write!(f, "watching"),
            Self::Ingesting => write!(f, "ingesting"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Notification sent to whoever consumes the stream (the console sink in the CLI)
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// Watching started on `folder`, batches go to `output_dir`
    Started { folder: PathBuf, output_dir: PathBuf },
    /// A CSV file appeared in the watched folder
    FileDetected { path: PathBuf },
    /// A file was read, enriched and written
    BatchWritten(BatchWritten),
    /// A file could not be turned into a batch
    BatchFailed { path: PathBuf, error: String },
    Stopped,
}

/// Payload of [`StreamEvent::BatchWritten`]
#[derive(Debug, Clone)]
pub struct BatchWritten {
    /// Sequence number of the batch within this watcher run
    pub batch_id: u64,
    pub source: PathBuf,
    pub output: PathBuf,
    pub frame: DataFrame,
}

impl BatchWritten {
    /// Console rendering: a `Batch: N` header followed by the table
    pub fn render(&self) -> String {
        format!(
            "-------------------------------------------\nBatch: {}\n-------------------------------------------\n{}",
            self.batch_id, self.frame
        )
    }
}
