//! Micro-batch processing for streamed files: fixed schema, revenue column,
//! CSV part files.

use super::config::StreamColumns;
use crate::error::{Result, ResultExt as _, SalesflowError};
use crate::pipeline::loader::require_columns;
use chrono::Local;
use polars::prelude::*;
use std::io::Write as _;
use std::path::{Path, PathBuf};

/// Read one streamed CSV and append the revenue column.
///
/// Columns are coerced to the stream schema (`id` Int64, `produit` String,
/// `quantite` Int64, `prix` Float64, `date_vente` Datetime); values that do
/// not fit become null instead of failing the batch.
///
/// # Errors
///
/// - `Io` when the file cannot be read
/// - `Parse` when the CSV is malformed
/// - `Schema` when one of the stream columns is missing
pub fn read_batch(path: &Path, columns: &StreamColumns) -> Result<DataFrame> {
    std::fs::metadata(path)
        .with_context(|| format!("Failed to open streamed file {}", path.display()))?;

    let df = LazyCsvReader::new(path)
        .with_has_header(true)
        .with_separator(b',')
        .with_infer_schema_length(Some(0))
        .finish()
        .and_then(LazyFrame::collect)
        .map_err(|e| SalesflowError::Parse(format!("{}: {e}", path.display())))?;

    require_columns(
        &df,
        &[
            columns.id.as_str(),
            columns.product.as_str(),
            columns.quantity.as_str(),
            columns.price.as_str(),
            columns.sale_date.as_str(),
        ],
    )?;

    let df = df
        .lazy()
        .select([
            col(columns.id.as_str()).cast(DataType::Int64),
            col(columns.product.as_str()).cast(DataType::String),
            col(columns.quantity.as_str()).cast(DataType::Int64),
            col(columns.price.as_str()).cast(DataType::Float64),
            col(columns.sale_date.as_str()).str().to_datetime(
                Some(TimeUnit::Microseconds),
                None,
                StrptimeOptions {
                    strict: false,
                    ..Default::default()
                },
                lit("raise"),
            ),
        ])
        .with_column(with_revenue(columns))
        .collect()?;

    Ok(df)
}

/// `quantity * price`, null when either side is null
pub fn with_revenue(columns: &StreamColumns) -> Expr {
    (col(columns.quantity.as_str()).cast(DataType::Float64) * col(columns.price.as_str()))
        .alias(columns.revenue.as_str())
}

/// Folder receiving the part files of a watcher run started at `started`
pub fn run_output_dir(output_root: &Path, started: chrono::DateTime<Local>) -> PathBuf {
    output_root.join(format!("ventes_{}", started.format("%Y%m%d_%H%M%S")))
}

/// Write a batch as `part-<batch_id>.csv` under `output_dir`.
///
/// # Errors
///
/// Returns `Io` when the folder or file cannot be written.
pub fn write_part(df: &mut DataFrame, output_dir: &Path, batch_id: u64) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir).with_context(|| {
        format!("Failed to create output directory: {}", output_dir.display())
    })?;
    let path = output_dir.join(format!("part-{batch_id:05}.csv"));
    crate::pipeline::exporter::export_csv(df, &path)?;
    Ok(path)
}

/// Append `[<now>] Erreur : <message>` to the failure log.
///
/// # Errors
///
/// Returns `Io` when the log cannot be opened or written.
pub fn append_failure(log_path: &Path, message: &str) -> Result<()> {
    if let Some(parent) = log_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("Failed to open failure log {}", log_path.display()))?;
    writeln!(
        file,
        "[{}] Erreur : {message}",
        Local::now().format("%Y-%m-%d %H:%M:%S%.6f")
    )
    .context("Failed to append to failure log")
}

/// Whether the watcher should pick up `path`
pub fn is_csv(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case("csv"))
}
