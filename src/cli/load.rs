use colored::Colorize;

use crate::config::{PipelineConfig, WarehouseConfig};
use crate::error::Result;
use crate::loader;

pub fn run(pipeline: &PipelineConfig, warehouse: &WarehouseConfig) -> Result<()> {
    let summary = loader::run(warehouse, &pipeline.validated_path)?;
    println!(
        "{} Loaded {} rows to {} ({})",
        "✓".green(),
        summary.rows,
        summary.destination,
        warehouse.database_path().display()
    );
    Ok(())
}
