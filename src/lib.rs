//! # salesflow
//!
//! Cleaning and enrichment of sales CSV exports, in two flavours:
//!
//! - [`pipeline`]: one-shot batch run. Loads a file, drops invalid rows,
//!   imputes missing quantities and prices, validates, derives totals,
//!   normalized totals and a customer segment, logs per-row failures and
//!   writes the result.
//! - [`watcher`]: folder ingestion. Every CSV dropped in a watched folder is
//!   enriched with a revenue column and written as a numbered micro-batch.
//!
//! ## Quick Start
//!
//! ```no_run
//! use salesflow::config::PipelineConfig;
//!
//! let config = PipelineConfig {
//!     input_path: "data/ventes.csv".into(),
//!     ..Default::default()
//! };
//! let report = salesflow::pipeline::run_pipeline(&config)?;
//! println!("{}", report.summary());
//! # Ok::<(), salesflow::error::SalesflowError>(())
//! ```
//!
//! ## Modules
//!
//! - [`config`]: pipeline configuration (paths, column names, thresholds)
//! - [`error`]: error types and the context extension trait
//! - [`logging`]: `tracing` setup for the binary
//! - [`pipeline`]: batch stages and the run report
//! - [`watcher`]: streaming ingestion service

pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod watcher;
