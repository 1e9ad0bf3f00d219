//! Watcher service implementation
//!
//! Monitors a folder for new CSV files and turns each one into a micro-batch.
//!
//! The worker thread never waits on a file itself. Stability checks run on
//! short-lived threads that report back over a channel: one thread per
//! detected file, plus one thread walking the files present at start in name
//! order. Batches are written in the order files become stable.

use chrono::Local;
use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use super::batch;
use super::config::StreamConfig;
use super::events::{BatchWritten, StreamEvent, WatcherServiceState};
use crate::error::{Result, ResultExt as _, SalesflowError};

/// Idle time between two polls of the worker's channels
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Message types for the watcher service
#[derive(Debug)]
pub enum WatcherMessage {
    /// Process a specific file now, unless it was already processed
    IngestNow(PathBuf),
    /// Stop watching and end the worker thread
    Stop,
}

/// Outcome of a stability wait, sent back to the worker
type StabilityOutcome = (PathBuf, Result<()>);

/// File stability checker
struct StabilityChecker {
    path: PathBuf,
    last_size: Option<u64>,
    unchanged_count: u32,
    required_checks: u32,
    interval: Duration,
    timeout: Duration,
    start_time: Instant,
}

impl StabilityChecker {
    fn new(path: PathBuf, config: &StreamConfig) -> Self {
        Self {
            path,
            last_size: None,
            unchanged_count: 0,
            required_checks: config.stability_required_checks,
            interval: config.stability_interval(),
            timeout: config.stability_timeout(),
            start_time: Instant::now(),
        }
    }

    /// Check if file is stable (size hasn't changed for N checks)
    fn check(&mut self) -> Result<bool> {
        if self.start_time.elapsed() > self.timeout {
            return Err(SalesflowError::Other(format!(
                "File stability timeout exceeded: {}",
                self.path.display()
            )));
        }

        let current_size = std::fs::metadata(&self.path)
            .with_context(|| format!("Failed to read file metadata: {}", self.path.display()))?
            .len();

        if self.last_size == Some(current_size) {
            self.unchanged_count += 1;
        } else {
            self.unchanged_count = 0;
            self.last_size = Some(current_size);
        }

        Ok(self.unchanged_count >= self.required_checks)
    }

    /// Poll until the file is stable. `Ok(false)` means the wait was cancelled.
    fn wait(mut self, cancelled: &AtomicBool) -> Result<bool> {
        loop {
            if cancelled.load(Ordering::Relaxed) {
                return Ok(false);
            }
            if self.check()? {
                return Ok(true);
            }
            std::thread::sleep(self.interval);
        }
    }
}

/// Wait for each file in turn and report it; stops early once cancelled
fn spawn_stability_wait(
    paths: Vec<PathBuf>,
    config: &StreamConfig,
    stable_tx: Sender<StabilityOutcome>,
    cancelled: Arc<AtomicBool>,
) {
    let config = config.clone();
    let spawned = std::thread::Builder::new()
        .name("watcher-stability".to_owned())
        .spawn(move || {
            for path in paths {
                let checker = StabilityChecker::new(path.clone(), &config);
                let outcome = match checker.wait(&cancelled) {
                    Ok(true) => Ok(()),
                    Ok(false) => return,
                    Err(e) => Err(e),
                };
                if stable_tx.send((path, outcome)).is_err() {
                    return;
                }
            }
        });
    if let Err(e) = spawned {
        tracing::error!("Failed to spawn stability check thread: {e}");
    }
}

/// Watcher service
///
/// Owns a worker thread that watches `input_dir` and reports through the
/// event channel given to [`WatcherService::start`].
pub struct WatcherService {
    state: Arc<Mutex<WatcherServiceState>>,
    command_tx: Sender<WatcherMessage>,
    output_dir: PathBuf,
    worker: Option<JoinHandle<()>>,
}

impl WatcherService {
    /// Start watching `config.input_dir`.
    ///
    /// CSV files already in the folder are processed first, sorted by name. Batch
    /// files go to a `ventes_<timestamp>` folder under `config.output_root`,
    /// fixed for the lifetime of the service.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the input folder cannot be created or listed, and
    /// `Other` if the filesystem watcher cannot be set up.
    pub fn start(config: StreamConfig, events: Sender<StreamEvent>) -> Result<Self> {
        std::fs::create_dir_all(&config.input_dir).with_context(|| {
            format!("Failed to create input folder {}", config.input_dir.display())
        })?;

        let (file_tx, file_rx) = channel();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            if let Ok(event) = res {
                file_tx.send(event).ok();
            }
        })
        .map_err(|e| SalesflowError::Other(format!("Failed to create watcher: {e}")))?;
        watcher
            .watch(&config.input_dir, RecursiveMode::NonRecursive)
            .map_err(|e| SalesflowError::Other(format!("Failed to watch folder: {e}")))?;

        let existing = existing_csv_files(&config.input_dir)?;
        let output_dir = batch::run_output_dir(&config.output_root, Local::now());
        let state = Arc::new(Mutex::new(WatcherServiceState::Watching));
        let (command_tx, command_rx) = channel();
        let (stable_tx, stable_rx) = channel();

        tracing::info!(
            "Started watching {} ({} file(s) already present), batches go to {}",
            config.input_dir.display(),
            existing.len(),
            output_dir.display()
        );
        emit(
            &events,
            StreamEvent::Started {
                folder: config.input_dir.clone(),
                output_dir: output_dir.clone(),
            },
        );

        let mut worker = Worker {
            config,
            output_dir: output_dir.clone(),
            events,
            state: Arc::clone(&state),
            seen: HashSet::new(),
            stable_tx,
            cancelled: Arc::new(AtomicBool::new(false)),
            next_batch_id: 0,
        };
        let existing: Vec<PathBuf> = existing
            .into_iter()
            .filter(|path| worker.mark_seen(path))
            .collect();
        if !existing.is_empty() {
            spawn_stability_wait(
                existing,
                &worker.config,
                worker.stable_tx.clone(),
                Arc::clone(&worker.cancelled),
            );
        }

        let handle = std::thread::Builder::new()
            .name("watcher-service".to_owned())
            .spawn(move || {
                // The watcher lives as long as the worker loop
                let _watcher = watcher;
                worker.run(&command_rx, &file_rx, &stable_rx);
            })
            .context("Failed to spawn watcher service thread")?;

        Ok(Self {
            state,
            command_tx,
            output_dir,
            worker: Some(handle),
        })
    }

    /// Queue a file for processing outside of filesystem notifications
    ///
    /// # Errors
    ///
    /// Returns `Other` if the worker thread has already ended.
    pub fn ingest_now(&self, path: PathBuf) -> Result<()> {
        self.send_command(WatcherMessage::IngestNow(path))
    }

    /// Stop watching and wait for the worker thread to finish its current batch.
    /// Pending stability checks are abandoned.
    ///
    /// # Errors
    ///
    /// Returns `Other` if the worker thread panicked.
    pub fn stop(mut self) -> Result<()> {
        self.shutdown()
    }

    /// Get current state
    pub fn state(&self) -> WatcherServiceState {
        self.state
            .lock()
            .map(|s| *s)
            .unwrap_or(WatcherServiceState::Error)
    }

    /// Folder receiving this run's part files
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn send_command(&self, cmd: WatcherMessage) -> Result<()> {
        self.command_tx
            .send(cmd)
            .map_err(|e| SalesflowError::Other(format!("Watcher service is not running: {e}")))
    }

    fn shutdown(&mut self) -> Result<()> {
        let Some(handle) = self.worker.take() else {
            return Ok(());
        };
        // Worker may already be gone; joining still reports a panic
        self.command_tx.send(WatcherMessage::Stop).ok();
        if handle.join().is_err() {
            return Err(SalesflowError::Other(
                "Watcher service thread panicked".to_owned(),
            ));
        }
        Ok(())
    }
}

impl Drop for WatcherService {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            tracing::error!("{e}");
        }
    }
}

/// State owned by the worker thread
struct Worker {
    config: StreamConfig,
    output_dir: PathBuf,
    events: Sender<StreamEvent>,
    state: Arc<Mutex<WatcherServiceState>>,
    /// Every path ever queued; a path is processed at most once
    seen: HashSet<PathBuf>,
    stable_tx: Sender<StabilityOutcome>,
    /// Set on stop so stability threads give up
    cancelled: Arc<AtomicBool>,
    next_batch_id: u64,
}

impl Worker {
    fn run(
        &mut self,
        command_rx: &Receiver<WatcherMessage>,
        file_rx: &Receiver<Event>,
        stable_rx: &Receiver<StabilityOutcome>,
    ) {
        loop {
            match command_rx.try_recv() {
                Ok(WatcherMessage::IngestNow(path)) => self.enqueue(path),
                Ok(WatcherMessage::Stop) | Err(TryRecvError::Disconnected) => break,
                Err(TryRecvError::Empty) => {}
            }

            while let Ok(event) = file_rx.try_recv() {
                if matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                    for path in event.paths {
                        if batch::is_csv(&path) {
                            self.enqueue(path);
                        }
                    }
                }
            }

            match stable_rx.try_recv() {
                Ok((path, outcome)) => self.process(&path, outcome),
                Err(_) => std::thread::sleep(POLL_INTERVAL),
            }
        }

        self.cancelled.store(true, Ordering::Relaxed);
        self.set_state(WatcherServiceState::Idle);
        tracing::info!("Stopped watching {}", self.config.input_dir.display());
        emit(&self.events, StreamEvent::Stopped);
    }

    /// Record `path` as seen and announce it. `false` if it was seen before.
    fn mark_seen(&mut self, path: &Path) -> bool {
        // Scan, notify and manual requests may name the same file differently
        let key = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        if !self.seen.insert(key) {
            tracing::debug!("Skipping already processed file {}", path.display());
            return false;
        }
        tracing::info!("Detected file: {}", path.display());
        emit(
            &self.events,
            StreamEvent::FileDetected {
                path: path.to_path_buf(),
            },
        );
        true
    }

    fn enqueue(&mut self, path: PathBuf) {
        if self.mark_seen(&path) {
            spawn_stability_wait(
                vec![path],
                &self.config,
                self.stable_tx.clone(),
                Arc::clone(&self.cancelled),
            );
        }
    }

    fn process(&mut self, path: &Path, stability: Result<()>) {
        self.set_state(WatcherServiceState::Ingesting);

        match stability.and_then(|()| self.write_batch(path)) {
            Ok(written) => {
                tracing::info!(
                    "Batch {} ({} rows) from {} -> {}",
                    written.batch_id,
                    written.frame.height(),
                    path.display(),
                    written.output.display()
                );
                emit(&self.events, StreamEvent::BatchWritten(written));
            }
            Err(e) => {
                tracing::error!("Batch from {} failed: {e}", path.display());
                if let Err(log_err) = batch::append_failure(&self.config.failure_log, &e.to_string())
                {
                    tracing::error!("{log_err}");
                }
                emit(
                    &self.events,
                    StreamEvent::BatchFailed {
                        path: path.to_path_buf(),
                        error: e.to_string(),
                    },
                );
            }
        }

        self.set_state(WatcherServiceState::Watching);
    }

    fn write_batch(&mut self, path: &Path) -> Result<BatchWritten> {
        let mut frame = batch::read_batch(path, &self.config.columns)?;
        let batch_id = self.next_batch_id;
        let output = batch::write_part(&mut frame, &self.output_dir, batch_id)?;
        self.next_batch_id += 1;

        Ok(BatchWritten {
            batch_id,
            source: path.to_path_buf(),
            output,
            frame,
        })
    }

    fn set_state(&self, new_state: WatcherServiceState) {
        if let Ok(mut s) = self.state.lock() {
            *s = new_state;
        }
    }
}

fn emit(events: &Sender<StreamEvent>, event: StreamEvent) {
    if events.send(event).is_err() {
        tracing::debug!("Stream event dropped: no receiver");
    }
}

/// CSV files directly inside `dir`, sorted by name
fn existing_csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("Failed to list {}", dir.display()))?
    {
        let path = entry?.path();
        if path.is_file() && batch::is_csv(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
