//! Threshold ladder turning `total_amount` into a segment label.

use super::loader::require_columns;
use crate::config::{PipelineConfig, SegmentThresholds};
use crate::error::Result;
use polars::prelude::*;

/// Customer-value segment of a sale
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Premium,
    Standard,
    Basique,
}

impl Segment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Premium => "Premium",
            Self::Standard => "Standard",
            Self::Basique => "Basique",
        }
    }

    /// Classify a total. Lower bounds are inclusive; anything below the
    /// standard bound, NaN included, is `Basique`.
    pub fn classify(total: f64, thresholds: SegmentThresholds) -> Self {
        if total >= thresholds.premium {
            Self::Premium
        } else if total >= thresholds.standard {
            Self::Standard
        } else {
            Self::Basique
        }
    }
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Append the segment column, one label per row. A null total is treated like
/// NaN and gets `Basique`.
///
/// # Errors
///
/// Returns `Schema` when `total_amount` is absent or not numeric.
pub fn segment(mut df: DataFrame, config: &PipelineConfig) -> Result<DataFrame> {
    let columns = &config.columns;
    require_columns(&df, &[columns.total_amount.as_str()])?;

    let totals = df
        .column(columns.total_amount.as_str())?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    let labels: Vec<&str> = totals
        .f64()?
        .into_iter()
        .map(|total| Segment::classify(total.unwrap_or(f64::NAN), config.thresholds).as_str())
        .collect();

    df.with_column(Series::new(columns.segment.as_str().into(), labels))?;
    Ok(df)
}
