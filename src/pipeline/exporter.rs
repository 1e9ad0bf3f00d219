//! CSV export of the final table.

use crate::error::{Result, ResultExt as _};
use polars::prelude::*;
use std::path::Path;

/// Write `df` as CSV with a header row and no index column, creating the
/// parent directory if needed.
///
/// # Errors
///
/// Returns `Io` when the target cannot be created or written.
pub fn export_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create output directory: {}", parent.display())
        })?;
    }

    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create CSV file {}", path.display()))?;
    CsvWriter::new(file)
        .include_header(true)
        .finish(df)
        .with_context(|| format!("Failed to write CSV file {}", path.display()))?;

    tracing::debug!("Wrote {} rows to {}", df.height(), path.display());
    Ok(())
}
