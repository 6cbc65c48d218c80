use std::io::{Cursor, Read};
use std::path::Path;

use calamine::{Data, Reader, Xlsx};
use zip::ZipArchive;

use crate::config::PipelineConfig;
use crate::error::{EtlError, Result};
use crate::models::TIMESTAMP_FORMAT;

/// Column that must be read as text: invoice numbers carry a leading
/// cancellation marker and must never be coerced to a number.
const INVOICE_COLUMN: &str = "InvoiceNo";

pub struct ExtractSummary {
    pub rows: usize,
    pub columns: usize,
}

/// Fetch the source archive, pull the expected spreadsheet out of it, and
/// persist the full table as the raw artifact. No value transformation beyond
/// rendering cells to text.
pub fn run(config: &PipelineConfig) -> Result<ExtractSummary> {
    let payload = fetch_archive(&config.source_url)?;
    let sheet = read_archive_entry(&payload, &config.archive_entry)?;
    let (headers, rows) = parse_workbook(&sheet)?;
    write_raw_artifact(&config.raw_path, &headers, &rows)?;
    Ok(ExtractSummary {
        rows: rows.len(),
        columns: headers.len(),
    })
}

fn fetch_archive(url: &str) -> Result<Vec<u8>> {
    let response = reqwest::blocking::get(url)?.error_for_status()?;
    Ok(response.bytes()?.to_vec())
}

pub fn read_archive_entry(payload: &[u8], entry_name: &str) -> Result<Vec<u8>> {
    let mut archive = ZipArchive::new(Cursor::new(payload))?;
    let mut entry = archive
        .by_name(entry_name)
        .map_err(|_| EtlError::MissingEntry(entry_name.to_string()))?;
    let mut bytes = Vec::with_capacity(entry.size() as usize);
    entry.read_to_end(&mut bytes)?;
    Ok(bytes)
}

/// Parse the first sheet of the workbook into a header row plus data rows,
/// everything rendered as text.
pub fn parse_workbook(sheet_bytes: &[u8]) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let mut workbook = Xlsx::new(Cursor::new(sheet_bytes))?;
    let sheet_names = workbook.sheet_names().to_vec();
    let first = sheet_names
        .first()
        .ok_or_else(|| EtlError::Other("workbook has no sheets".to_string()))?;
    let range = workbook.worksheet_range(first)?;

    let mut rows_iter = range.rows();
    let headers: Vec<String> = rows_iter
        .next()
        .ok_or_else(|| EtlError::Other("worksheet has no header row".to_string()))?
        .iter()
        .map(cell_to_string)
        .collect();
    let invoice_idx = headers.iter().position(|h| h == INVOICE_COLUMN);

    let mut rows = Vec::new();
    for row in rows_iter {
        let rendered: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                if Some(i) == invoice_idx {
                    cell_as_text(cell)
                } else {
                    cell_to_string(cell)
                }
            })
            .collect();
        rows.push(rendered);
    }
    Ok((headers, rows))
}

pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => float_to_string(*f),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => excel_serial_to_datetime(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(_) => String::new(),
    }
}

/// Text rendering for the invoice column: integer-valued floats render with no
/// fractional part, so `536365.0` survives as `"536365"`.
fn cell_as_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.clone(),
        other => cell_to_string(other),
    }
}

fn float_to_string(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

/// Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug); the
/// fractional part of the serial is the time of day.
pub fn excel_serial_to_datetime(serial: f64) -> String {
    let base = chrono::NaiveDate::from_ymd_opt(1899, 12, 30)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let seconds = (serial * 86_400.0).round() as i64;
    (base + chrono::Duration::seconds(seconds))
        .format(TIMESTAMP_FORMAT)
        .to_string()
}

/// Write the raw artifact through a sibling temp file and rename it into
/// place: a failed extract never leaves a partial artifact behind.
pub fn write_raw_artifact(path: &Path, headers: &[String], rows: &[Vec<String>]) -> Result<()> {
    let tmp_path = path.with_extension("csv.tmp");
    {
        let file = std::fs::File::create(&tmp_path)?;
        let mut wtr = csv::Writer::from_writer(std::io::BufWriter::new(file));
        wtr.write_record(headers)?;
        for row in rows {
            wtr.write_record(row)?;
        }
        wtr.flush()?;
    }
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}
