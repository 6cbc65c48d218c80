use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{EtlError, Result};

pub const SOURCE_URL: &str = "https://archive.ics.uci.edu/static/public/352/online+retail.zip";
pub const ARCHIVE_ENTRY: &str = "Online Retail.xlsx";

pub const RAW_FILE: &str = "online_retail.csv";
pub const CLEAN_FILE: &str = "cleaned_retail.csv";
pub const VALIDATED_FILE: &str = "validated_retail.csv";

pub const DEFAULT_DATASET: &str = "retail_analysis";
pub const DEFAULT_TABLE: &str = "transactions";

/// Inter-stage contract: where each stage finds its input and writes its
/// output. Passed into every stage invocation instead of living in globals, so
/// tests can run against distinct directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_source_url")]
    pub source_url: String,
    #[serde(default = "default_archive_entry")]
    pub archive_entry: String,
    #[serde(default = "default_raw_path")]
    pub raw_path: PathBuf,
    #[serde(default = "default_clean_path")]
    pub clean_path: PathBuf,
    #[serde(default = "default_validated_path")]
    pub validated_path: PathBuf,
}

fn default_source_url() -> String {
    SOURCE_URL.to_string()
}

fn default_archive_entry() -> String {
    ARCHIVE_ENTRY.to_string()
}

fn default_raw_path() -> PathBuf {
    PathBuf::from(RAW_FILE)
}

fn default_clean_path() -> PathBuf {
    PathBuf::from(CLEAN_FILE)
}

fn default_validated_path() -> PathBuf {
    PathBuf::from(VALIDATED_FILE)
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_url: default_source_url(),
            archive_entry: default_archive_entry(),
            raw_path: default_raw_path(),
            clean_path: default_clean_path(),
            validated_path: default_validated_path(),
        }
    }
}

impl PipelineConfig {
    /// Default config with all three artifacts placed under `dir`.
    pub fn rooted_at(dir: &Path) -> Self {
        Self {
            raw_path: dir.join(RAW_FILE),
            clean_path: dir.join(CLEAN_FILE),
            validated_path: dir.join(VALIDATED_FILE),
            ..Self::default()
        }
    }
}

/// Load a pipeline config from a JSON file, or the defaults when no file is
/// given. Missing keys fall back to the defaults via serde.
pub fn load_pipeline_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(p) => {
            let content = std::fs::read_to_string(p)?;
            serde_json::from_str(&content)
                .map_err(|e| EtlError::Config(format!("{}: {e}", p.display())))
        }
        None => Ok(PipelineConfig::default()),
    }
}

/// Destination parameters for the warehouse load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseConfig {
    pub project_id: String,
    #[serde(default = "default_dataset")]
    pub dataset_id: String,
    #[serde(default = "default_table")]
    pub table_id: String,
    /// Explicit database file; defaults to `<project_id>.duckdb` in the
    /// working directory.
    #[serde(default)]
    pub database: Option<PathBuf>,
}

fn default_dataset() -> String {
    DEFAULT_DATASET.to_string()
}

fn default_table() -> String {
    DEFAULT_TABLE.to_string()
}

impl WarehouseConfig {
    pub fn new(project_id: &str) -> Self {
        Self {
            project_id: project_id.to_string(),
            dataset_id: default_dataset(),
            table_id: default_table(),
            database: None,
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.database
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{}.duckdb", self.project_id)))
    }
}
