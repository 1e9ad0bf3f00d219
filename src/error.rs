//! Error types for the salesflow pipelines.
//!
//! Structural failures (missing files, missing columns, unreadable CSV) are
//! fatal and travel up as [`SalesflowError`]. Row-level failures from the
//! risk probe are a separate, non-propagating [`RowComputationError`]:
//!
//! ```
//! use salesflow::error::{RowComputationError, SalesflowError};
//!
//! fn describe(err: &SalesflowError) -> &'static str {
//!     match err {
//!         SalesflowError::Io(_) => "io",
//!         SalesflowError::Schema(_) => "schema",
//!         SalesflowError::Parse(_) => "parse",
//!         _ => "other",
//!     }
//! }
//!
//! assert_eq!(RowComputationError::DivisionByZero.to_string(), "float division by zero");
//! ```
//!
//! The `ResultExt` trait adds `.context()` to any result whose error converts
//! into [`SalesflowError`]:
//!
//! ```no_run
//! use salesflow::error::ResultExt as _;
//!
//! fn read_header(path: &str) -> salesflow::error::Result<String> {
//!     let content = std::fs::read_to_string(path).context("Failed to read sales file")?;
//!     Ok(content.lines().next().unwrap_or_default().to_owned())
//! }
//! ```

use std::fmt;

/// Main error type for salesflow operations.
#[derive(Debug)]
pub enum SalesflowError {
    /// Source unreadable or destination unwritable
    Io(std::io::Error),

    /// Expected column absent or of the wrong type
    Schema(String),

    /// Malformed CSV or unparsable date column
    Parse(String),

    /// Dataframe engine failures that are neither schema nor parse errors
    DataProcessing(String),

    /// Configuration errors
    Config(String),

    /// Generic error with context
    Other(String),
}

impl fmt::Display for SalesflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Schema(msg) => write!(f, "Schema error: {msg}"),
            Self::Parse(msg) => write!(f, "Parse error: {msg}"),
            Self::DataProcessing(msg) => write!(f, "Data processing error: {msg}"),
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
            Self::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for SalesflowError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SalesflowError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for SalesflowError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(format!("JSON error: {err}"))
    }
}

impl From<polars::error::PolarsError> for SalesflowError {
    fn from(err: polars::error::PolarsError) -> Self {
        use polars::error::PolarsError;
        match err {
            PolarsError::ColumnNotFound(msg) => Self::Schema(format!("column not found: {msg}")),
            PolarsError::SchemaMismatch(msg) => Self::Schema(msg.to_string()),
            PolarsError::IO { error, .. } => Self::Io(std::io::Error::new(
                error.kind(),
                error.to_string(),
            )),
            other => Self::DataProcessing(other.to_string()),
        }
    }
}

/// Result type alias for salesflow operations.
pub type Result<T> = std::result::Result<T, SalesflowError>;

/// Failure of a single row's computation. Contained by the stage that raised it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowComputationError {
    /// Divisor evaluated to zero
    DivisionByZero,
}

impl fmt::Display for RowComputationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DivisionByZero => write!(f, "float division by zero"),
        }
    }
}

impl std::error::Error for RowComputationError {}

/// Extension trait to add context to results.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> Result<T>;

    /// Add context using a closure (lazy evaluation).
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<SalesflowError>,
{
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| wrap(e.into(), msg.into()))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| wrap(e.into(), f()))
    }
}

/// Prefixes the message while keeping the variant, so callers can still
/// match on `Io` / `Schema` / `Parse` after context was added.
fn wrap(err: SalesflowError, msg: String) -> SalesflowError {
    match err {
        SalesflowError::Io(e) => SalesflowError::Io(std::io::Error::new(e.kind(), format!("{msg}: {e}"))),
        SalesflowError::Schema(m) => SalesflowError::Schema(format!("{msg}: {m}")),
        SalesflowError::Parse(m) => SalesflowError::Parse(format!("{msg}: {m}")),
        SalesflowError::DataProcessing(m) => SalesflowError::DataProcessing(format!("{msg}: {m}")),
        SalesflowError::Config(m) => SalesflowError::Config(format!("{msg}: {m}")),
        SalesflowError::Other(m) => SalesflowError::Other(format!("{msg}: {m}")),
    }
}
