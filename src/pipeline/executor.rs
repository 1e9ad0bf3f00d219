//! Pipeline execution engine.
//!
//! Runs the stages in order over one in-memory table and reports what each
//! stage did.

use super::error_log::ErrorLog;
use super::{Stage, cleaner, exporter, loader, probe, segmenter, transformer, validator};
use crate::config::PipelineConfig;
use crate::error::Result;
use polars::prelude::*;
use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Report generated after a pipeline run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Rows read from the input file
    pub rows_loaded: usize,

    /// Rows left after cleaning
    pub rows_cleaned: usize,

    /// Rows left after validation
    pub rows_validated: usize,

    /// Rows written to the output file
    pub rows_exported: usize,

    /// Rows whose probe failed (one error-log line each)
    pub row_failures: usize,

    /// Date parse error that was reported but not fatal
    pub date_parse_error: Option<String>,

    /// Where the table was written, if it was
    pub output_path: Option<PathBuf>,

    /// Time taken for execution
    pub duration: Duration,
}

impl RunReport {
    /// Create a summary message
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Pipeline completed: {} rows loaded, {} after cleaning, {} after validation, {} exported, {} row failures logged, {:.2}s",
            self.rows_loaded,
            self.rows_cleaned,
            self.rows_validated,
            self.rows_exported,
            self.row_failures,
            self.duration.as_secs_f64()
        );
        if let Some(err) = &self.date_parse_error {
            summary.push_str(&format!(" (dates left unconverted: {err})"));
        }
        summary
    }
}

/// Load, process and export the file named by `config`, appending row
/// failures to `config.error_log_path`.
///
/// # Errors
///
/// Any fatal stage error: `Io`, `Schema`, `Parse` (malformed CSV, or dates
/// with `strict_dates`), `DataProcessing`.
pub fn run_pipeline(config: &PipelineConfig) -> Result<RunReport> {
    let start = Instant::now();

    tracing::info!("[{}] {}", Stage::Load.as_str(), config.input_path.display());
    let df = loader::load_sales(&config.input_path, &config.columns)?;

    let mut error_log = ErrorLog::open(&config.error_log_path)?;
    let (mut df, mut report) = process(df, config, &mut error_log)?;

    tracing::info!("[{}] {}", Stage::Export.as_str(), config.output_path.display());
    exporter::export_csv(&mut df, &config.output_path)?;
    report.rows_exported = df.height();
    report.output_path = Some(config.output_path.clone());
    report.duration = start.elapsed();

    tracing::info!("{}", report.summary());
    Ok(report)
}

/// Run every stage between loading and export on an in-memory table.
///
/// Row failures are written to `error_log`. The returned report has
/// `rows_exported` equal to the final height and no output path.
///
/// # Errors
///
/// Same fatal errors as [`run_pipeline`], minus file I/O on the data.
pub fn process<W: Write>(
    df: DataFrame,
    config: &PipelineConfig,
    error_log: &mut ErrorLog<W>,
) -> Result<(DataFrame, RunReport)> {
    let start = Instant::now();
    let mut report = RunReport {
        rows_loaded: df.height(),
        ..Default::default()
    };

    let df = loader::coerce_types(df, &config.columns)?;

    let df = cleaner::clean(df, config)?;
    report.rows_cleaned = df.height();
    log_stage(Stage::Clean, report.rows_loaded, df.height());

    let validated = validator::validate(df, config)?;
    report.date_parse_error = validated.date_error;
    let df = validated.df;
    report.rows_validated = df.height();
    log_stage(Stage::Validate, report.rows_cleaned, df.height());

    let df = transformer::transform(df, config)?;
    log_stage(Stage::Transform, report.rows_validated, df.height());

    let df = segmenter::segment(df, config)?;
    log_stage(Stage::Segment, report.rows_validated, df.height());

    let probed = probe::probe(df, config)?;
    error_log.record_all(&probed.failures)?;
    report.row_failures = probed.failures.len();
    tracing::info!(
        "[{}] {} row failure(s) recorded in the error log",
        Stage::Probe.as_str(),
        report.row_failures
    );

    report.rows_exported = probed.df.height();
    report.duration = start.elapsed();
    Ok((probed.df, report))
}

fn log_stage(stage: Stage, before: usize, after: usize) {
    tracing::info!("[{}] {before} -> {after} rows", stage.as_str());
}
