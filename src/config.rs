//! Pipeline configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config and a
//! partial file only overrides what it names.

use crate::error::{Result, ResultExt as _};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_INPUT_PATH: &str = "data/ventes.csv";
pub const DEFAULT_OUTPUT_PATH: &str = "data/ventes_transformees.csv";
pub const DEFAULT_ERROR_LOG_PATH: &str = "logs/erreurs.log";

/// Configuration of one batch pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// CSV file to load
    pub input_path: PathBuf,
    /// CSV file to export to
    pub output_path: PathBuf,
    /// Append-only log receiving one line per row failure
    pub error_log_path: PathBuf,
    /// Input and derived column names
    pub columns: ColumnNames,
    /// Literal dropped from the date column before parsing
    pub invalid_date_literal: String,
    /// `chrono`-style format of the date column
    pub date_format: String,
    /// Abort the run when the date column cannot be parsed
    pub strict_dates: bool,
    /// Normalization result when every total is identical
    pub degenerate_range: DegenerateRange,
    /// Segment ladder
    pub thresholds: SegmentThresholds,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT_PATH),
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            error_log_path: PathBuf::from(DEFAULT_ERROR_LOG_PATH),
            columns: ColumnNames::default(),
            invalid_date_literal: "invalid_date".to_owned(),
            date_format: "%Y-%m-%d".to_owned(),
            strict_dates: false,
            degenerate_range: DegenerateRange::default(),
            thresholds: SegmentThresholds::default(),
        }
    }
}

impl PipelineConfig {
    /// Load a config from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read and `Config` if it is not valid JSON.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read pipeline config {}", path.display()))?;
        Self::from_json(&content)
    }

    /// Parse a config from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns `Config` on malformed JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse pipeline config JSON")
    }

    /// Serialize to pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns `Config` if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize pipeline config")
    }

    /// Write the config as JSON, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file or its directory cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        let json = self.to_json()?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write pipeline config to {}", path.display()))
    }
}

/// Names of the columns the pipeline reads and derives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub id: String,
    pub product_name: String,
    pub sale_date: String,
    pub quantity_sold: String,
    pub unit_price: String,
    pub total_amount: String,
    pub normalized_amount: String,
    pub segment: String,
    pub probe_result: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            id: "id".to_owned(),
            product_name: "product_name".to_owned(),
            sale_date: "sale_date".to_owned(),
            quantity_sold: "quantity_sold".to_owned(),
            unit_price: "unit_price".to_owned(),
            total_amount: "total_amount".to_owned(),
            normalized_amount: "normalized_amount".to_owned(),
            segment: "segment".to_owned(),
            probe_result: "probe_result".to_owned(),
        }
    }
}

impl ColumnNames {
    /// Headers of the French sales export (`ventes.csv`).
    pub fn french() -> Self {
        Self {
            id: "ID_produit".to_owned(),
            product_name: "Nom_produit".to_owned(),
            sale_date: "Date_vente".to_owned(),
            quantity_sold: "Quantite_vendue".to_owned(),
            unit_price: "Prix_unitaire".to_owned(),
            total_amount: "Montant_total".to_owned(),
            normalized_amount: "Montant_normalise".to_owned(),
            segment: "Segment".to_owned(),
            probe_result: "Resultat_test".to_owned(),
        }
    }

    /// Columns the input file must provide.
    pub fn required_inputs(&self) -> [&str; 5] {
        [
            self.id.as_str(),
            self.product_name.as_str(),
            self.sale_date.as_str(),
            self.quantity_sold.as_str(),
            self.unit_price.as_str(),
        ]
    }
}

/// What `normalized_amount` holds when `max(total) == min(total)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DegenerateRange {
    /// 0 / 0 for every row
    #[default]
    Nan,
    /// 0.0 for every row
    Zero,
}

/// Lower bounds of the upper two segments
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentThresholds {
    pub premium: f64,
    pub standard: f64,
}

impl Default for SegmentThresholds {
    fn default() -> Self {
        Self {
            premium: 500.0,
            standard: 200.0,
        }
    }
}
