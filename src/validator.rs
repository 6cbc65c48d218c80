use std::fmt;

use chrono::NaiveDateTime;
use csv::StringRecord;

use crate::config::PipelineConfig;
use crate::error::{EtlError, Result};
use crate::models::TIMESTAMP_FORMAT;

// ---------------------------------------------------------------------------
// Schema declaration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
enum ColumnKind {
    Text,
    Integer,
    Float,
    DateTime,
}

#[derive(Debug, Clone, Copy)]
struct ColumnSpec {
    name: &'static str,
    kind: ColumnKind,
    nullable: bool,
    /// Strictly-greater-than bound on numeric columns.
    gt: Option<f64>,
    /// Inclusive length bounds on text columns.
    length: Option<(usize, usize)>,
}

impl ColumnSpec {
    const fn new(name: &'static str, kind: ColumnKind) -> Self {
        Self {
            name,
            kind,
            nullable: false,
            gt: None,
            length: None,
        }
    }

    const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    const fn gt_zero(mut self) -> Self {
        self.gt = Some(0.0);
        self
    }

    const fn length(mut self, min: usize, max: usize) -> Self {
        self.length = Some((min, max));
        self
    }

    /// Check one cell, re-parsed from text. Returns the violated constraint.
    fn check(&self, value: &str) -> std::result::Result<(), String> {
        if value.is_empty() {
            if self.nullable {
                return Ok(());
            }
            return Err("must not be null".to_string());
        }
        match self.kind {
            ColumnKind::Text => {
                if let Some((min, max)) = self.length {
                    let len = value.chars().count();
                    if len < min || len > max {
                        return Err(format!("length must be in [{min},{max}]"));
                    }
                }
            }
            ColumnKind::Integer => {
                let parsed: i64 = value
                    .parse()
                    .map_err(|_| "must be an integer".to_string())?;
                if let Some(bound) = self.gt {
                    if (parsed as f64) <= bound {
                        return Err(format!("must be > {bound}"));
                    }
                }
            }
            ColumnKind::Float => {
                let parsed: f64 = value.parse().map_err(|_| "must be a float".to_string())?;
                if let Some(bound) = self.gt {
                    if parsed <= bound {
                        return Err(format!("must be > {bound}"));
                    }
                }
            }
            ColumnKind::DateTime => {
                NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
                    .map_err(|_| "must be a date-time".to_string())?;
            }
        }
        Ok(())
    }
}

/// The fixed schema every cleaned row must satisfy.
const SCHEMA: &[ColumnSpec] = &[
    ColumnSpec::new("invoice_id", ColumnKind::Text).length(6, 7),
    ColumnSpec::new("stock_code", ColumnKind::Text),
    ColumnSpec::new("description", ColumnKind::Text).nullable(),
    ColumnSpec::new("quantity", ColumnKind::Integer).gt_zero(),
    ColumnSpec::new("invoice_timestamp", ColumnKind::DateTime),
    ColumnSpec::new("unit_price", ColumnKind::Float).gt_zero(),
    ColumnSpec::new("customer_id", ColumnKind::Integer),
    ColumnSpec::new("country", ColumnKind::Text),
    ColumnSpec::new("total_price", ColumnKind::Float).gt_zero(),
];

// ---------------------------------------------------------------------------
// Violation report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Violation {
    /// 1-based data row number (header excluded).
    pub row: usize,
    pub column: String,
    pub constraint: String,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub rows_checked: usize,
    pub violations: Vec<Violation>,
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "validation failed: {} schema violation(s) across {} row(s)",
            self.violations.len(),
            self.rows_checked
        )
    }
}

#[derive(Debug)]
pub struct ValidateSummary {
    pub rows: usize,
}

// ---------------------------------------------------------------------------
// Stage entry point
// ---------------------------------------------------------------------------

/// Check every row of the cleaned artifact against the schema. On success the
/// rows are written unchanged to the validated artifact; on any violation the
/// stage fails with the full report and writes nothing.
pub fn run(config: &PipelineConfig) -> Result<ValidateSummary> {
    if !config.clean_path.exists() {
        return Err(EtlError::MissingArtifact(config.clean_path.clone()));
    }

    let file = std::fs::File::open(&config.clean_path)?;
    let mut rdr = csv::Reader::from_reader(std::io::BufReader::new(file));
    let headers = rdr.headers()?.clone();

    let mut column_idx = Vec::with_capacity(SCHEMA.len());
    let mut violations = Vec::new();
    for spec in SCHEMA {
        match headers.iter().position(|h| h == spec.name) {
            Some(idx) => column_idx.push(idx),
            None => {
                column_idx.push(usize::MAX);
                violations.push(Violation {
                    row: 0,
                    column: spec.name.to_string(),
                    constraint: "column missing from artifact".to_string(),
                    value: String::new(),
                });
            }
        }
    }

    let mut records: Vec<StringRecord> = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let record = result?;
        let row = i + 1;
        for (spec, &idx) in SCHEMA.iter().zip(&column_idx) {
            if idx == usize::MAX {
                continue;
            }
            let value = record.get(idx).unwrap_or("");
            if let Err(constraint) = spec.check(value) {
                violations.push(Violation {
                    row,
                    column: spec.name.to_string(),
                    constraint,
                    value: value.to_string(),
                });
            }
        }
        records.push(record);
    }

    if !violations.is_empty() {
        return Err(EtlError::Validation(ValidationReport {
            rows_checked: records.len(),
            violations,
        }));
    }

    let out = std::fs::File::create(&config.validated_path)?;
    let mut wtr = csv::Writer::from_writer(std::io::BufWriter::new(out));
    wtr.write_record(&headers)?;
    for record in &records {
        wtr.write_record(record)?;
    }
    wtr.flush()?;

    Ok(ValidateSummary {
        rows: records.len(),
    })
}
