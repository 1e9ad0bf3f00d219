//! Risk probe: a per-row computation whose failures are isolated.
//!
//! Each row computes `total_amount / (quantity_sold - quantity_sold)`. The
//! divisor is zero for every finite quantity, so every such row fails, its
//! `probe_result` is null, and a [`RowFailure`] is returned for the error log.
//! This is the fault-injection behaviour of the sales export and is kept as is.

use super::loader::require_columns;
use crate::config::PipelineConfig;
use crate::error::{Result, RowComputationError};
use polars::prelude::*;
use std::fmt;

/// One row whose probe failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFailure {
    /// `id` of the row, `None` when the row had no id
    pub id: Option<i64>,
    pub error: RowComputationError,
}

impl fmt::Display for RowFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id {
            Some(id) => write!(f, "Erreur sur la ligne ID {id} : {}", self.error),
            None => write!(f, "Erreur sur la ligne ID nan : {}", self.error),
        }
    }
}

/// Output of [`probe`]
#[derive(Debug, Clone)]
pub struct Probed {
    pub df: DataFrame,
    pub failures: Vec<RowFailure>,
}

/// The per-row computation.
///
/// # Errors
///
/// Returns `DivisionByZero` when `quantity - quantity` is zero.
pub fn probe_row(total: f64, quantity: f64) -> std::result::Result<f64, RowComputationError> {
    let divisor = quantity - quantity;
    if divisor == 0.0 {
        return Err(RowComputationError::DivisionByZero);
    }
    Ok(total / divisor)
}

/// Map [`probe_row`] over the frame, appending `probe_result` and collecting
/// the failures in row order. Rows with a missing operand get a null result
/// and no failure.
///
/// # Errors
///
/// Returns `Schema` when `id`, `total_amount` or `quantity_sold` is absent.
pub fn probe(mut df: DataFrame, config: &PipelineConfig) -> Result<Probed> {
    let columns = &config.columns;
    require_columns(
        &df,
        &[
            columns.id.as_str(),
            columns.total_amount.as_str(),
            columns.quantity_sold.as_str(),
        ],
    )?;

    let ids = float_or_int(&df, &columns.id, DataType::Int64)?;
    let totals = float_or_int(&df, &columns.total_amount, DataType::Float64)?;
    let quantities = float_or_int(&df, &columns.quantity_sold, DataType::Float64)?;

    let mut failures = Vec::new();
    let results: Vec<Option<f64>> = ids
        .i64()?
        .into_iter()
        .zip(totals.f64()?)
        .zip(quantities.f64()?)
        .map(|((id, total), quantity)| {
            let (total, quantity) = (total?, quantity?);
            match probe_row(total, quantity) {
                Ok(value) => Some(value),
                Err(error) => {
                    failures.push(RowFailure { id, error });
                    None
                }
            }
        })
        .collect();

    df.with_column(Series::new(columns.probe_result.as_str().into(), results))?;
    Ok(Probed { df, failures })
}

fn float_or_int(df: &DataFrame, name: &str, dtype: DataType) -> Result<Series> {
    Ok(df.column(name)?.as_materialized_series().cast(&dtype)?)
}
