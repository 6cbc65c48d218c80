use std::path::Path;

use duckdb::Connection;

use crate::config::WarehouseConfig;
use crate::error::{EtlError, Result};

#[derive(Debug)]
pub struct LoadSummary {
    pub rows: i64,
    pub destination: String,
}

/// Dataset and table names are interpolated into SQL, so they must be plain
/// identifiers.
fn check_identifier(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(EtlError::Config(format!("invalid identifier: {name}")))
    }
}

/// Load the validated artifact into the warehouse, replacing any prior
/// contents of the destination table. Column names and types are inferred by
/// the warehouse from the data. Blocks until the load completes.
pub fn run(warehouse: &WarehouseConfig, validated_path: &Path) -> Result<LoadSummary> {
    if !validated_path.exists() {
        return Err(EtlError::MissingArtifact(validated_path.to_path_buf()));
    }
    check_identifier(&warehouse.dataset_id)?;
    check_identifier(&warehouse.table_id)?;

    let conn = Connection::open(warehouse.database_path())?;

    // Idempotent: must not fail when the dataset already exists
    conn.execute_batch(&format!(
        "CREATE SCHEMA IF NOT EXISTS {};",
        warehouse.dataset_id
    ))?;

    let csv_path = validated_path.to_string_lossy().replace('\'', "''");
    let destination = format!("{}.{}", warehouse.dataset_id, warehouse.table_id);
    conn.execute_batch(&format!(
        "CREATE OR REPLACE TABLE {destination} AS SELECT * FROM read_csv_auto('{csv_path}', header = true);"
    ))?;

    let rows: i64 = conn.query_row(&format!("SELECT count(*) FROM {destination}"), [], |r| {
        r.get(0)
    })?;

    Ok(LoadSummary { rows, destination })
}
