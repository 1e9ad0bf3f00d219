//! Watcher configuration management

use crate::error::{Result, ResultExt as _};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration of the streaming ingestion watcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Folder to watch (non-recursive)
    pub input_dir: PathBuf,
    /// Root under which each watcher run gets its own `ventes_<timestamp>` folder
    pub output_root: PathBuf,
    /// Append-only file receiving one entry per failed batch
    pub failure_log: PathBuf,
    pub columns: StreamColumns,
    /// Time between stability checks
    pub stability_interval_ms: u64,
    /// Consecutive unchanged size checks before a file is read
    pub stability_required_checks: u32,
    /// Give up on a file that keeps changing for this long
    pub stability_timeout_secs: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("stream_input"),
            output_root: PathBuf::from("stream_output"),
            failure_log: PathBuf::from("log_erreurs.txt"),
            columns: StreamColumns::default(),
            stability_interval_ms: 500,
            stability_required_checks: 3,
            stability_timeout_secs: 30,
        }
    }
}

impl StreamConfig {
    /// Load configuration from a JSON file
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read and `Config` on malformed JSON.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read stream config from {}", path.display()))?;
        serde_json::from_str(&contents).context("Failed to parse stream config JSON")
    }

    pub fn stability_interval(&self) -> Duration {
        Duration::from_millis(self.stability_interval_ms)
    }

    pub fn stability_timeout(&self) -> Duration {
        Duration::from_secs(self.stability_timeout_secs)
    }
}

/// Column names of the streamed sales files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamColumns {
    pub id: String,
    pub product: String,
    pub quantity: String,
    pub price: String,
    pub sale_date: String,
    /// Derived `quantity * price`
    pub revenue: String,
}

impl Default for StreamColumns {
    fn default() -> Self {
        Self {
            id: "id".to_owned(),
            product: "produit".to_owned(),
            quantity: "quantite".to_owned(),
            price: "prix".to_owned(),
            sale_date: "date_vente".to_owned(),
            revenue: "chiffre_affaire".to_owned(),
        }
    }
}
