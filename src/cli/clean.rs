use colored::Colorize;

use crate::cleaner;
use crate::config::PipelineConfig;
use crate::error::Result;

pub fn run(config: &PipelineConfig) -> Result<()> {
    let summary = cleaner::run(config)?;
    println!(
        "{} Cleaned {} of {} rows to {}",
        "✓".green(),
        summary.kept,
        summary.input_rows,
        config.clean_path.display()
    );
    println!(
        "  dropped: {} missing customer, {} cancelled, {} non-positive, {} unparsable, {} duplicates",
        summary.dropped_missing_customer,
        summary.dropped_cancelled,
        summary.dropped_non_positive,
        summary.dropped_unparsable,
        summary.dropped_duplicates
    );
    Ok(())
}
