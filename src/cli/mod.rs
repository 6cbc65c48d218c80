pub mod clean;
pub mod extract;
pub mod load;
pub mod run;
pub mod validate;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use crate::config::{load_pipeline_config, PipelineConfig, WarehouseConfig};
use crate::error::Result;

#[derive(Parser)]
#[command(name = "retail-etl", about = "Batch ETL pipeline for the UCI Online Retail dataset.")]
pub struct Cli {
    /// Optional JSON config overriding artifact paths and the source URL
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download the source archive and persist the raw artifact.
    Extract {
        /// Source archive URL
        #[arg(long)]
        url: Option<String>,
        /// Raw artifact path (default: online_retail.csv)
        #[arg(long)]
        raw: Option<PathBuf>,
    },
    /// Apply the cleaning rules to the raw artifact.
    Clean {
        /// Raw artifact path (default: online_retail.csv)
        #[arg(long)]
        raw: Option<PathBuf>,
        /// Cleaned artifact path (default: cleaned_retail.csv)
        #[arg(long)]
        clean: Option<PathBuf>,
    },
    /// Check the cleaned artifact against the column schema.
    Validate {
        /// Cleaned artifact path (default: cleaned_retail.csv)
        #[arg(long)]
        clean: Option<PathBuf>,
        /// Validated artifact path (default: validated_retail.csv)
        #[arg(long)]
        validated: Option<PathBuf>,
    },
    /// Load the validated artifact into the warehouse, replacing the table.
    Load {
        /// Validated artifact path (default: validated_retail.csv)
        #[arg(long)]
        validated: Option<PathBuf>,
        /// Warehouse project scope
        #[arg(long)]
        project_id: String,
        /// Destination dataset (default: retail_analysis)
        #[arg(long)]
        dataset_id: Option<String>,
        /// Destination table (default: transactions)
        #[arg(long)]
        table_id: Option<String>,
        /// Warehouse database file (default: <project_id>.duckdb)
        #[arg(long)]
        database: Option<PathBuf>,
    },
    /// Run extract, clean, validate, and load in order.
    Run {
        /// Warehouse project scope
        #[arg(long)]
        project_id: String,
        /// Destination dataset (default: retail_analysis)
        #[arg(long)]
        dataset_id: Option<String>,
        /// Destination table (default: transactions)
        #[arg(long)]
        table_id: Option<String>,
        /// Warehouse database file (default: <project_id>.duckdb)
        #[arg(long)]
        database: Option<PathBuf>,
    },
}

pub(crate) struct PathOverrides {
    pub url: Option<String>,
    pub raw: Option<PathBuf>,
    pub clean: Option<PathBuf>,
    pub validated: Option<PathBuf>,
}

impl PathOverrides {
    pub fn none() -> Self {
        Self {
            url: None,
            raw: None,
            clean: None,
            validated: None,
        }
    }
}

pub(crate) fn resolve_pipeline(
    config_file: Option<&Path>,
    overrides: PathOverrides,
) -> Result<PipelineConfig> {
    let mut config = load_pipeline_config(config_file)?;
    if let Some(url) = overrides.url {
        config.source_url = url;
    }
    if let Some(path) = overrides.raw {
        config.raw_path = path;
    }
    if let Some(path) = overrides.clean {
        config.clean_path = path;
    }
    if let Some(path) = overrides.validated {
        config.validated_path = path;
    }
    Ok(config)
}

pub(crate) fn resolve_warehouse(
    project_id: &str,
    dataset_id: Option<String>,
    table_id: Option<String>,
    database: Option<PathBuf>,
) -> WarehouseConfig {
    let mut warehouse = WarehouseConfig::new(project_id);
    if let Some(dataset) = dataset_id {
        warehouse.dataset_id = dataset;
    }
    if let Some(table) = table_id {
        warehouse.table_id = table;
    }
    warehouse.database = database;
    warehouse
}
