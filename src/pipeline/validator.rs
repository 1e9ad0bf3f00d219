//! Date coercion and positivity checks.

use super::loader::require_columns;
use crate::config::PipelineConfig;
use crate::error::{Result, SalesflowError};
use polars::prelude::*;

/// Output of [`validate`]
#[derive(Debug, Clone)]
pub struct Validated {
    pub df: DataFrame,
    /// Set when the date column could not be parsed and the run went on with
    /// the dates left as text
    pub date_error: Option<String>,
}

/// Parse the date column, then keep only rows with a positive price and quantity.
///
/// A date column that fails to parse is reported and left unconverted, unless
/// `strict_dates` is set.
///
/// # Errors
///
/// - `Schema` when a referenced column is absent
/// - `Parse` when the dates do not parse and `strict_dates` is set
pub fn validate(df: DataFrame, config: &PipelineConfig) -> Result<Validated> {
    let columns = &config.columns;
    require_columns(
        &df,
        &[
            columns.sale_date.as_str(),
            columns.quantity_sold.as_str(),
            columns.unit_price.as_str(),
        ],
    )?;

    let (df, date_error) = match parse_dates(&df, &columns.sale_date, &config.date_format) {
        Ok(parsed) => {
            tracing::info!("Dates in '{}' converted", columns.sale_date);
            (parsed, None)
        }
        Err(e) if config.strict_dates => {
            return Err(SalesflowError::Parse(format!(
                "column '{}' does not match {}: {e}",
                columns.sale_date, config.date_format
            )));
        }
        Err(e) => {
            tracing::error!(
                "Failed to convert dates in '{}', continuing with unconverted values: {e}",
                columns.sale_date
            );
            (df, Some(e.to_string()))
        }
    };

    let df = df
        .lazy()
        .filter(
            col(columns.unit_price.as_str())
                .gt(lit(0.0))
                .and(col(columns.quantity_sold.as_str()).gt(lit(0.0))),
        )
        .collect()?;

    Ok(Validated { df, date_error })
}

/// Strictly parse a text column as `Date`. Fails if any non-null value does
/// not match `format`. A column that is already `Date` is returned unchanged.
///
/// # Errors
///
/// Returns the dataframe error describing the first unparsable value.
pub fn parse_dates(df: &DataFrame, name: &str, format: &str) -> PolarsResult<DataFrame> {
    if df.column(name)?.dtype() == &DataType::Date {
        return Ok(df.clone());
    }

    df.clone()
        .lazy()
        .with_column(col(name).str().to_date(StrptimeOptions {
            format: Some(format.into()),
            strict: true,
            exact: true,
            ..Default::default()
        }))
        .collect()
}

#[cfg(test)]
mod tests {
    #![expect(clippy::unwrap_used)]

    use super::*;
    use crate::pipeline::fixtures::{SaleRow, sales_frame};

    #[test]
    fn test_parses_iso_dates() {
        let df = sales_frame(&[
            SaleRow::new(1, Some("A"), Some("2024-01-01"), Some(2.0), Some(10.0)),
            SaleRow::new(2, Some("B"), Some("2024-02-29"), Some(1.0), Some(5.0)),
        ]);

        let validated = validate(df, &PipelineConfig::default()).unwrap();

        assert!(validated.date_error.is_none());
        let dates = validated.df.column("sale_date").unwrap();
        assert_eq!(dates.dtype(), &DataType::Date);
        assert_eq!(dates.null_count(), 0);
    }

    #[test]
    fn test_bad_date_reported_and_run_continues() {
        let df = sales_frame(&[
            SaleRow::new(1, Some("A"), Some("2024-01-01"), Some(2.0), Some(10.0)),
            SaleRow::new(2, Some("B"), Some("01/02/2024"), Some(1.0), Some(5.0)),
        ]);

        let validated = validate(df, &PipelineConfig::default()).unwrap();

        assert!(validated.date_error.is_some());
        assert_eq!(
            validated.df.column("sale_date").unwrap().dtype(),
            &DataType::String
        );
        assert_eq!(validated.df.height(), 2);
    }

    #[test]
    fn test_bad_date_is_fatal_when_strict() {
        let df = sales_frame(&[SaleRow::new(
            1,
            Some("A"),
            Some("2024/01/01"),
            Some(2.0),
            Some(10.0),
        )]);
        let config = PipelineConfig {
            strict_dates: true,
            ..Default::default()
        };

        let err = validate(df, &config).expect_err("strict dates must fail");
        assert!(matches!(err, SalesflowError::Parse(_)), "got {err:?}");
    }

    #[test]
    fn test_filters_non_positive_price_and_quantity() {
        let df = sales_frame(&[
            SaleRow::new(1, Some("A"), Some("2024-01-01"), Some(2.0), Some(0.0)),
            SaleRow::new(2, Some("B"), Some("2024-01-02"), Some(1.0), Some(-5.0)),
            SaleRow::new(3, Some("C"), Some("2024-01-03"), Some(-1.0), Some(5.0)),
            SaleRow::new(4, Some("D"), Some("2024-01-04"), Some(1.0), Some(5.0)),
        ]);

        let validated = validate(df, &PipelineConfig::default()).unwrap();

        assert_eq!(validated.df.height(), 1);
    }

    #[test]
    fn test_already_parsed_dates_pass_through() {
        let df = sales_frame(&[SaleRow::new(
            1,
            Some("A"),
            Some("2024-01-01"),
            Some(2.0),
            Some(10.0),
        )]);
        let config = PipelineConfig::default();

        let once = validate(df, &config).unwrap();
        let twice = validate(once.df.clone(), &config).unwrap();

        assert!(twice.date_error.is_none());
        assert!(once.df.equals_missing(&twice.df));
    }
}
