//! CSV loading and schema checks.

use crate::config::ColumnNames;
use crate::error::{Result, ResultExt as _, SalesflowError};
use polars::prelude::*;
use std::path::Path;

/// Read the sales CSV into a frame with canonical column types.
///
/// `id` becomes `Int64`, `product_name` and `sale_date` stay `String`, and the
/// two numeric columns become `Float64`. Empty cells are nulls. No row is
/// filtered here.
///
/// # Errors
///
/// - `Io` when the file is missing or unreadable
/// - `Parse` when the CSV itself is malformed
/// - `Schema` when a required column is absent or a numeric column holds text
pub fn load_sales(path: &Path, columns: &ColumnNames) -> Result<DataFrame> {
    std::fs::metadata(path)
        .with_context(|| format!("Failed to open sales file {}", path.display()))?;

    // Types are inferred from every row so a late decimal cannot break an int column
    let df = LazyCsvReader::new(path)
        .with_infer_schema_length(None)
        .with_has_header(true)
        .finish()
        .and_then(LazyFrame::collect)
        .map_err(|e| match SalesflowError::from(e) {
            SalesflowError::DataProcessing(msg) => {
                SalesflowError::Parse(format!("{}: {msg}", path.display()))
            }
            other => other,
        })?;

    tracing::debug!(
        "Read {} rows x {} columns from {}",
        df.height(),
        df.width(),
        path.display()
    );

    coerce_types(df, columns)
}

/// Cast the five input columns to the types the later stages expect.
///
/// # Errors
///
/// Returns `Schema` for a missing column or a value that cannot be read as the
/// expected type.
pub fn coerce_types(mut df: DataFrame, columns: &ColumnNames) -> Result<DataFrame> {
    require_columns(&df, &columns.required_inputs())?;

    let targets = [
        (columns.id.as_str(), DataType::Int64),
        (columns.product_name.as_str(), DataType::String),
        (columns.sale_date.as_str(), DataType::String),
        (columns.quantity_sold.as_str(), DataType::Float64),
        (columns.unit_price.as_str(), DataType::Float64),
    ];

    for (name, dtype) in targets {
        let series = df.column(name)?.as_materialized_series();
        if series.dtype() == &dtype {
            continue;
        }
        let casted = series.strict_cast(&dtype).map_err(|e| {
            SalesflowError::Schema(format!(
                "column '{name}' cannot be read as {dtype} (found {}): {e}",
                series.dtype()
            ))
        })?;
        df.with_column(casted)?;
    }

    Ok(df)
}

/// Fail with `Schema` unless every named column is present.
///
/// # Errors
///
/// Returns `Schema` listing the missing columns.
pub fn require_columns(df: &DataFrame, names: &[&str]) -> Result<()> {
    let present = df.get_column_names();
    let missing: Vec<&str> = names
        .iter()
        .copied()
        .filter(|name| !present.iter().any(|p| p.as_str() == *name))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(SalesflowError::Schema(format!(
            "missing required column(s): {}",
            missing.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    #![expect(clippy::unwrap_used, clippy::indexing_slicing)]

    use super::*;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    fn csv_file(content: &str) -> NamedTempFile {
        let mut tmp = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        write!(tmp, "{content}").unwrap();
        tmp
    }

    #[test]
    fn test_load_types_columns() {
        let tmp = csv_file(
            "id,product_name,sale_date,quantity_sold,unit_price\n\
             1,A,2024-01-01,2,100\n\
             2,,invalid_date,,19.5\n",
        );

        let df = load_sales(tmp.path(), &ColumnNames::default()).unwrap();

        assert_eq!(df.height(), 2);
        assert_eq!(df.column("id").unwrap().dtype(), &DataType::Int64);
        assert_eq!(df.column("sale_date").unwrap().dtype(), &DataType::String);
        assert_eq!(df.column("quantity_sold").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("unit_price").unwrap().dtype(), &DataType::Float64);

        let names = df.column("product_name").unwrap().as_materialized_series().clone();
        assert_eq!(names.str().unwrap().get(1), None);
        let qty = df.column("quantity_sold").unwrap().as_materialized_series().clone();
        assert_eq!(qty.f64().unwrap().get(1), None);
    }

    #[test]
    fn test_late_decimal_in_integer_column() {
        let mut content = String::from("id,product_name,sale_date,quantity_sold,unit_price\n");
        for id in 0..10_001 {
            content.push_str(&format!("{id},A,2024-01-01,2,100\n"));
        }
        content.push_str("10001,B,2024-01-02,2.5,100\n");
        let tmp = csv_file(&content);

        let df = load_sales(tmp.path(), &ColumnNames::default()).unwrap();

        assert_eq!(df.height(), 10_002);
        let qty = df.column("quantity_sold").unwrap().as_materialized_series().clone();
        assert_eq!(qty.f64().unwrap().get(10_001), Some(2.5));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_sales(Path::new("does/not/exist.csv"), &ColumnNames::default())
            .expect_err("missing file must fail");
        assert!(matches!(err, SalesflowError::Io(_)), "got {err:?}");
    }

    #[test]
    fn test_missing_column_is_schema_error() {
        let tmp = csv_file("id,product_name,sale_date,quantity_sold\n1,A,2024-01-01,2\n");
        let err = load_sales(tmp.path(), &ColumnNames::default()).expect_err("must fail");
        match err {
            SalesflowError::Schema(msg) => assert!(msg.contains("unit_price"), "{msg}"),
            other => panic!("expected Schema, got {other:?}"),
        }
    }

    #[test]
    fn test_text_in_numeric_column_is_schema_error() {
        let tmp = csv_file(
            "id,product_name,sale_date,quantity_sold,unit_price\n1,A,2024-01-01,two,100\n",
        );
        let err = load_sales(tmp.path(), &ColumnNames::default()).expect_err("must fail");
        assert!(matches!(err, SalesflowError::Schema(_)), "got {err:?}");
    }

    #[test]
    fn test_french_headers() {
        let tmp = csv_file(
            "ID_produit,Nom_produit,Date_vente,Quantite_vendue,Prix_unitaire\n7,Stylo,2024-03-02,3,1.5\n",
        );
        let df = load_sales(tmp.path(), &ColumnNames::french()).unwrap();
        let ids = df.column("ID_produit").unwrap().as_materialized_series().clone();
        assert_eq!(ids.i64().unwrap().get(0), Some(7));
        assert_eq!(df.get_column_names()[1].as_str(), "Nom_produit");
    }
}
