//! Batch pipeline for sales exports.
//!
//! # Overview
//!
//! One run loads a CSV once, passes the table through the stages in order and
//! exports it once:
//!
//! ```text
//! load ─> clean ─> validate ─> transform ─> segment ─> probe ─> export
//!                                                        │
//!                                                        └─> error log (one line per failed row)
//! ```
//!
//! - **clean**: drops invalid-date and unnamed rows, imputes missing
//!   quantities/prices with the column mean, drops non-positive quantities and
//!   exact duplicates
//! - **validate**: parses `sale_date`, drops non-positive prices/quantities
//! - **transform**: `total_amount` and its min-max `normalized_amount`
//! - **segment**: `Premium` / `Standard` / `Basique` from the total
//! - **probe**: per-row computation whose failures are logged, never fatal
//!
//! # Example
//!
//! ```no_run
//! use salesflow::config::PipelineConfig;
//! use salesflow::pipeline::run_pipeline;
//!
//! let report = run_pipeline(&PipelineConfig::default())?;
//! println!("{}", report.summary());
//! # Ok::<(), salesflow::error::SalesflowError>(())
//! ```

pub mod cleaner;
pub mod error_log;
pub mod executor;
pub mod exporter;
pub mod loader;
pub mod probe;
pub mod segmenter;
pub mod transformer;
pub mod validator;

pub use error_log::ErrorLog;
pub use executor::{RunReport, process, run_pipeline};
pub use probe::RowFailure;
pub use segmenter::Segment;

/// Stages of a pipeline run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Load,
    Clean,
    Validate,
    Transform,
    Segment,
    Probe,
    Export,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::Clean => "clean",
            Self::Validate => "validate",
            Self::Transform => "transform",
            Self::Segment => "segment",
            Self::Probe => "probe",
            Self::Export => "export",
        }
    }

    /// Get the stage that runs after this one
    pub fn next_stage(&self) -> Option<Self> {
        match self {
            Self::Load => Some(Self::Clean),
            Self::Clean => Some(Self::Validate),
            Self::Validate => Some(Self::Transform),
            Self::Transform => Some(Self::Segment),
            Self::Segment => Some(Self::Probe),
            Self::Probe => Some(Self::Export),
            Self::Export => None,
        }
    }
}
