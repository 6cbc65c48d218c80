use colored::Colorize;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::extractor;

pub fn run(config: &PipelineConfig) -> Result<()> {
    println!("Fetching {}", config.source_url);
    let summary = extractor::run(config)?;
    println!(
        "{} Extracted {} rows x {} columns to {}",
        "✓".green(),
        summary.rows,
        summary.columns,
        config.raw_path.display()
    );
    Ok(())
}
