use colored::Colorize;
use comfy_table::Table;

use crate::config::PipelineConfig;
use crate::error::{EtlError, Result};
use crate::validator;

const MAX_REPORTED: usize = 20;

pub fn run(config: &PipelineConfig) -> Result<()> {
    match validator::run(config) {
        Ok(summary) => {
            println!(
                "{} Validation passed: {} rows written to {}",
                "✓".green(),
                summary.rows,
                config.validated_path.display()
            );
            Ok(())
        }
        Err(EtlError::Validation(report)) => {
            eprintln!("{}", "Schema violations:".red());
            let mut table = Table::new();
            table.set_header(vec!["row", "column", "constraint", "value"]);
            for v in report.violations.iter().take(MAX_REPORTED) {
                table.add_row(vec![
                    v.row.to_string(),
                    v.column.clone(),
                    v.constraint.clone(),
                    v.value.clone(),
                ]);
            }
            eprintln!("{table}");
            if report.violations.len() > MAX_REPORTED {
                eprintln!("... and {} more", report.violations.len() - MAX_REPORTED);
            }
            Err(EtlError::Validation(report))
        }
        Err(other) => Err(other),
    }
}
