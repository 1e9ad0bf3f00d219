//! Derived amounts: `total_amount` and its min-max normalization.

use super::loader::require_columns;
use crate::config::{DegenerateRange, PipelineConfig};
use crate::error::Result;
use polars::prelude::*;

/// Append `total_amount = unit_price * quantity_sold` and
/// `normalized_amount = (total - min) / (max - min)` over the whole frame.
///
/// # Errors
///
/// Returns `Schema` when the price or quantity column is absent.
pub fn transform(df: DataFrame, config: &PipelineConfig) -> Result<DataFrame> {
    let columns = &config.columns;
    require_columns(
        &df,
        &[columns.quantity_sold.as_str(), columns.unit_price.as_str()],
    )?;

    let total = columns.total_amount.as_str();
    let df = df
        .lazy()
        .with_column(
            (col(columns.unit_price.as_str()) * col(columns.quantity_sold.as_str())).alias(total),
        )
        .with_column(
            min_max_normalize(total, config.degenerate_range)
                .alias(columns.normalized_amount.as_str()),
        )
        .collect()?;

    Ok(df)
}

/// Min-max expression over a float column. With equal min and max the
/// division is 0 / 0, which yields NaN unless `degenerate` asks for zero.
pub fn min_max_normalize(name: &str, degenerate: DegenerateRange) -> Expr {
    let value = col(name);
    let min = value.clone().min();
    let max = value.clone().max();
    let scaled = (value - min.clone()) / (max.clone() - min.clone());

    match degenerate {
        DegenerateRange::Nan => scaled,
        DegenerateRange::Zero => when(max.eq(min)).then(lit(0.0)).otherwise(scaled),
    }
}
