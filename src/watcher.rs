//! Streaming ingestion.
//!
//! Watches a folder for sales CSV files and turns each new file into a
//! micro-batch written under the run's output folder.
//!
//! ## Architecture
//!
//! ```text
//! WatcherService (background thread)
//!   │
//!   ├─> notify::Watcher (filesystem events)
//!   ├─> StabilityChecker (waits until the file is fully written)
//!   ├─> batch (read, add revenue, write part-NNNNN.csv)
//!   └─> StreamEvent channel (console sink in the CLI)
//! ```
//!
//! Files already in the folder at start are processed first, in name order.
//! A file is processed at most once per service. A file that cannot be read
//! is reported on the channel and in the failure log; watching continues.
//!
//! ## Example
//!
//! ```no_run
//! use salesflow::watcher::{StreamConfig, StreamEvent, WatcherService};
//! use std::sync::mpsc::channel;
//!
//! let (tx, rx) = channel();
//! let service = WatcherService::start(StreamConfig::default(), tx)?;
//! for event in rx.iter() {
//!     if let StreamEvent::BatchWritten(batch) = event {
//!         println!("{}", batch.render());
//!         break;
//!     }
//! }
//! service.stop()?;
//! # Ok::<(), salesflow::error::SalesflowError>(())
//! ```

pub mod batch;
pub mod config;
pub mod events;
pub mod service;

pub use config::{StreamColumns, StreamConfig};
pub use events::{BatchWritten, StreamEvent, WatcherServiceState};
pub use service::{WatcherMessage, WatcherService};
