use std::path::PathBuf;

use thiserror::Error;

use crate::validator::ValidationReport;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::XlsxError),

    #[error("Warehouse error: {0}")]
    Warehouse(#[from] duckdb::Error),

    #[error("Archive entry not found: {0}")]
    MissingEntry(String),

    #[error("Missing artifact {} (run the preceding stage first)", .0.display())]
    MissingArtifact(PathBuf),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("{0}")]
    Validation(ValidationReport),

    #[error("Config error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, EtlError>;
