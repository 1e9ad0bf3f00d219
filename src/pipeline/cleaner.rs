//! Row cleaning: invalid-date filter, required product, mean imputation,
//! positive quantities, deduplication.

use super::loader::require_columns;
use crate::config::PipelineConfig;
use crate::error::Result;
use polars::prelude::*;

/// Apply the cleaning steps in order.
///
/// 1. drop rows whose date is the invalid-date literal (missing dates are kept)
/// 2. drop rows without a product name
/// 3. impute missing quantities with the mean of the remaining quantities
/// 4. impute missing prices the same way
/// 5. drop rows with a quantity of zero or less
/// 6. drop exact duplicates, keeping the first occurrence
///
/// # Errors
///
/// Returns `Schema` when one of the referenced columns is absent.
pub fn clean(df: DataFrame, config: &PipelineConfig) -> Result<DataFrame> {
    let columns = &config.columns;
    require_columns(
        &df,
        &[
            columns.sale_date.as_str(),
            columns.product_name.as_str(),
            columns.quantity_sold.as_str(),
            columns.unit_price.as_str(),
        ],
    )?;

    let df = df
        .lazy()
        .filter(
            col(columns.sale_date.as_str())
                .neq_missing(lit(config.invalid_date_literal.as_str())),
        )
        .filter(col(columns.product_name.as_str()).is_not_null())
        .collect()?;

    // Both means are taken before either column is filled.
    let quantity_mean = column_mean(&df, &columns.quantity_sold)?;
    let price_mean = column_mean(&df, &columns.unit_price)?;

    let df = df
        .lazy()
        .with_columns([
            impute(&columns.quantity_sold, quantity_mean),
            impute(&columns.unit_price, price_mean),
        ])
        .filter(col(columns.quantity_sold.as_str()).gt(lit(0.0)))
        .unique_stable(None, UniqueKeepStrategy::First)
        .collect()?;

    Ok(df)
}

/// Mean of the non-null values of a numeric column, `None` when all are null.
///
/// # Errors
///
/// Returns `Schema` when the column does not exist.
pub fn column_mean(df: &DataFrame, name: &str) -> Result<Option<f64>> {
    Ok(df.column(name)?.as_materialized_series().mean())
}

/// Substitute nulls with `mean`. A column with no observed value is left as is.
fn impute(name: &str, mean: Option<f64>) -> Expr {
    match mean {
        Some(mean) => col(name).fill_null(lit(mean)),
        None => col(name),
    }
}
