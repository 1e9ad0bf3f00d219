//! Integration tests for full pipeline runs
//!
//! These tests run the pipeline on fixture files and check the exported
//! table and the row error log.

use polars::prelude::*;
use salesflow::config::{ColumnNames, PipelineConfig};
use salesflow::error::SalesflowError;
use salesflow::pipeline::{ErrorLog, cleaner, exporter, loader, process, run_pipeline};
use std::path::{Path, PathBuf};

const TOLERANCE: f64 = 1e-6;

fn config_for(input: &Path, out_dir: &Path) -> PipelineConfig {
    PipelineConfig {
        input_path: input.to_path_buf(),
        output_path: out_dir.join("ventes_transformees.csv"),
        error_log_path: out_dir.join("logs").join("erreurs.log"),
        ..Default::default()
    }
}

fn read_output(path: &Path) -> DataFrame {
    LazyCsvReader::new(path)
        .with_has_header(true)
        .finish()
        .and_then(LazyFrame::collect)
        .expect("output is readable CSV")
}

fn f64_values(df: &DataFrame, name: &str) -> Vec<f64> {
    df.column(name)
        .expect("column exists")
        .cast(&DataType::Float64)
        .expect("numeric")
        .f64()
        .expect("f64")
        .into_no_null_iter()
        .collect()
}

fn str_values(df: &DataFrame, name: &str) -> Vec<String> {
    df.column(name)
        .expect("column exists")
        .str()
        .expect("string column")
        .into_no_null_iter()
        .map(str::to_owned)
        .collect()
}

fn write_csv(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("ventes.csv");
    std::fs::write(&path, content).expect("fixture written");
    path
}

#[test]
fn test_run_on_fixture() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = config_for(Path::new("testdata/ventes.csv"), dir.path());

    let report = run_pipeline(&config).expect("pipeline succeeds");

    assert_eq!(report.rows_loaded, 9);
    assert_eq!(report.rows_cleaned, 5, "invalid date, no product, negative quantity, duplicate");
    assert_eq!(report.rows_validated, 4, "negative price dropped");
    assert_eq!(report.rows_exported, 4);
    assert_eq!(report.row_failures, 4, "every row fails the probe");
    assert!(report.date_parse_error.is_none());
    assert_eq!(report.output_path.as_deref(), Some(config.output_path.as_path()));

    let out = read_output(&config.output_path);
    let ids: Vec<i64> = out
        .column("id")
        .expect("id")
        .i64()
        .expect("int ids")
        .into_no_null_iter()
        .collect();
    assert_eq!(ids, vec![1, 3, 4, 6]);
    assert_eq!(
        str_values(&out, "segment"),
        vec!["Standard", "Premium", "Premium", "Basique"]
    );
    assert_eq!(out.column("probe_result").expect("probe").null_count(), 4);

    let log = std::fs::read_to_string(&config.error_log_path).expect("error log written");
    let lines: Vec<&str> = log.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines.iter().all(|l| l.contains(" - ERROR - Erreur sur la ligne ID ")));
    assert!(lines.iter().all(|l| l.ends_with(" : float division by zero")));
    assert!(lines.iter().any(|l| l.contains("ID 1 :")));
}

#[test]
fn test_output_invariants() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = config_for(Path::new("testdata/ventes.csv"), dir.path());
    run_pipeline(&config).expect("pipeline succeeds");

    let out = read_output(&config.output_path);
    let quantities = f64_values(&out, "quantity_sold");
    let prices = f64_values(&out, "unit_price");
    let totals = f64_values(&out, "total_amount");
    let normalized = f64_values(&out, "normalized_amount");

    for (((q, p), t), n) in quantities.iter().zip(&prices).zip(&totals).zip(&normalized) {
        assert!(*q > 0.0 && *p > 0.0, "positive quantity and price");
        assert!((t - q * p).abs() < TOLERANCE, "total = price * quantity");
        assert!((0.0..=1.0).contains(n), "normalized in [0, 1], got {n}");
    }
    assert!(normalized.iter().any(|n| n.abs() < TOLERANCE));
    assert!(normalized.iter().any(|n| (n - 1.0).abs() < TOLERANCE));
}

#[test]
fn test_missing_quantity_imputed_with_mean() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = config_for(Path::new("testdata/ventes.csv"), dir.path());
    run_pipeline(&config).expect("pipeline succeeds");

    let out = read_output(&config.output_path);
    let quantities = f64_values(&out, "quantity_sold");
    // Mean of the quantities left after the date and product filters
    let expected = (2.0 + 10.0 + 10.0 + 1.0 - 2.0 + 4.0) / 6.0;
    assert!((quantities[1] - expected).abs() < TOLERANCE, "got {}", quantities[1]);
}

#[test]
fn test_single_row_scenario() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = write_csv(
        dir.path(),
        "id,product_name,sale_date,quantity_sold,unit_price\n1,A,2024-01-01,2,100\n",
    );
    let config = config_for(&input, dir.path());
    let df = loader::load_sales(&input, &config.columns).expect("loads");
    let mut log = ErrorLog::new(Vec::new());

    let (out, report) = process(df, &config, &mut log).expect("processes");

    assert_eq!(report.rows_exported, 1);
    assert_eq!(f64_values(&out, "total_amount"), vec![200.0]);
    assert_eq!(str_values(&out, "segment"), vec!["Standard"]);
    assert_eq!(out.column("probe_result").expect("probe").null_count(), 1);
    assert!(
        f64_values(&out, "normalized_amount")[0].is_nan(),
        "single total gives a degenerate range"
    );

    let text = String::from_utf8(log.into_inner()).expect("utf-8 log");
    assert_eq!(text.lines().count(), 1);
    assert!(text.trim_end().ends_with("Erreur sur la ligne ID 1 : float division by zero"));
}

#[test]
fn test_invalid_date_never_exported() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = write_csv(
        dir.path(),
        "id,product_name,sale_date,quantity_sold,unit_price\n\
         1,A,2024-01-01,2,100\n\
         2,B,invalid_date,2,100\n",
    );
    let config = config_for(&input, dir.path());

    let report = run_pipeline(&config).expect("pipeline succeeds");

    assert_eq!(report.rows_exported, 1);
    let out = std::fs::read_to_string(&config.output_path).expect("output");
    assert!(!out.contains("invalid_date"));
}

#[test]
fn test_cleaner_second_pass_removes_nothing() {
    let config = PipelineConfig::default();
    let df = loader::load_sales(Path::new("testdata/ventes.csv"), &config.columns)
        .expect("fixture loads");

    let once = cleaner::clean(df, &config).expect("first pass");
    let twice = cleaner::clean(once.clone(), &config).expect("second pass");

    assert_eq!(once.height(), twice.height());
    assert!(once.equals_missing(&twice));
}

fn assert_same_floats(before: &[f64], after: &[f64], name: &str) {
    assert_eq!(before.len(), after.len(), "{name}: row count");
    for (i, (b, a)) in before.iter().zip(after).enumerate() {
        let same = (b.is_nan() && a.is_nan()) || (b - a).abs() < TOLERANCE;
        assert!(same, "{name}[{i}]: {b} before export, {a} after reload");
    }
}

/// Process `input`, export, reload, and compare every derived column
fn assert_round_trip(input: &Path) {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = config_for(input, dir.path());
    let df = loader::load_sales(input, &config.columns).expect("loads");
    let (mut processed, _) =
        process(df, &config, &mut ErrorLog::new(Vec::new())).expect("processes");

    exporter::export_csv(&mut processed, &config.output_path).expect("exports");
    let reloaded = read_output(&config.output_path);

    assert_eq!(reloaded.height(), processed.height());
    for name in ["total_amount", "normalized_amount"] {
        assert_same_floats(
            &f64_values(&processed, name),
            &f64_values(&reloaded, name),
            name,
        );
    }
    assert_eq!(
        str_values(&processed, "segment"),
        str_values(&reloaded, "segment")
    );
    let missing_results = reloaded
        .column("probe_result")
        .expect("result column")
        .null_count();
    assert_eq!(missing_results, processed.height(), "results stay missing");
}

#[test]
fn test_export_then_reload_round_trip() {
    assert_round_trip(Path::new("testdata/ventes.csv"));
}

#[test]
fn test_round_trip_keeps_nan_normalization() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = write_csv(
        dir.path(),
        "id,product_name,sale_date,quantity_sold,unit_price\n\
         1,A,2024-01-01,2,100\n\
         2,B,2024-01-02,4,50\n",
    );
    assert_round_trip(&input);
}

#[test]
fn test_french_headers() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = PipelineConfig {
        columns: ColumnNames::french(),
        ..config_for(Path::new("testdata/ventes_fr.csv"), dir.path())
    };

    let report = run_pipeline(&config).expect("pipeline succeeds");

    assert_eq!(report.rows_exported, 3);
    let out = read_output(&config.output_path);
    assert_eq!(
        str_values(&out, "Segment"),
        vec!["Basique", "Standard", "Premium"]
    );
    assert!(out.column("Montant_normalise").is_ok());
}

#[test]
fn test_missing_input_is_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = config_for(&dir.path().join("absent.csv"), dir.path());

    let err = run_pipeline(&config).expect_err("missing input must fail");

    assert!(matches!(err, SalesflowError::Io(_)), "got {err:?}");
    assert!(!config.output_path.exists());
}

#[test]
fn test_strict_dates_abort_run() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = write_csv(
        dir.path(),
        "id,product_name,sale_date,quantity_sold,unit_price\n1,A,01/02/2024,2,100\n",
    );
    let config = PipelineConfig {
        strict_dates: true,
        ..config_for(&input, dir.path())
    };

    let err = run_pipeline(&config).expect_err("unparsable dates are fatal");

    assert!(matches!(err, SalesflowError::Parse(_)), "got {err:?}");
    assert!(!config.output_path.exists());
}
