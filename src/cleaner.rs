use std::collections::HashSet;

use csv::StringRecord;

use crate::config::PipelineConfig;
use crate::error::{EtlError, Result};
use crate::models::{Transaction, CANCELLATION_MARKER, CLEAN_HEADER, TIMESTAMP_FORMAT};

// ---------------------------------------------------------------------------
// Column resolution
// ---------------------------------------------------------------------------

/// Indices of the eight source columns in the raw artifact. Accepts either the
/// source spreadsheet spelling or the canonical snake_case spelling, which
/// keeps the cleaner idempotent on its own output.
#[derive(Debug, Clone, Copy)]
pub struct ColumnMap {
    pub invoice: usize,
    pub stock: usize,
    pub description: usize,
    pub quantity: usize,
    pub timestamp: usize,
    pub unit_price: usize,
    pub customer: usize,
    pub country: usize,
}

fn find_column(headers: &StringRecord, candidates: &[&str]) -> Option<usize> {
    headers.iter().position(|h| {
        let h = h.trim();
        candidates.iter().any(|c| h.eq_ignore_ascii_case(c))
    })
}

impl ColumnMap {
    pub fn resolve(headers: &StringRecord) -> Result<Self> {
        let col = |candidates: &[&str]| {
            find_column(headers, candidates)
                .ok_or_else(|| EtlError::MissingColumn(candidates[0].to_string()))
        };
        Ok(Self {
            invoice: col(&["InvoiceNo", "invoice_id"])?,
            stock: col(&["StockCode", "stock_code"])?,
            description: col(&["Description", "description"])?,
            quantity: col(&["Quantity", "quantity"])?,
            timestamp: col(&["InvoiceDate", "invoice_timestamp"])?,
            unit_price: col(&["UnitPrice", "unit_price"])?,
            customer: col(&["CustomerID", "customer_id"])?,
            country: col(&["Country", "country"])?,
        })
    }
}

// ---------------------------------------------------------------------------
// Row rules
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
enum DropReason {
    MissingCustomer,
    Cancelled,
    NonPositive,
    Unparsable,
}

fn parse_int(raw: &str) -> Option<i64> {
    let s = raw.trim();
    if let Ok(i) = s.parse::<i64>() {
        return Some(i);
    }
    // A float-typed column writes integers as e.g. "17850.0"
    let f: f64 = s.parse().ok()?;
    if f.fract() == 0.0 {
        Some(f as i64)
    } else {
        None
    }
}

fn parse_timestamp(raw: &str) -> Option<String> {
    let raw = raw.trim();
    for format in [TIMESTAMP_FORMAT, "%Y-%m-%dT%H:%M:%S", "%m/%d/%Y %H:%M"] {
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(raw, format) {
            return Some(dt.format(TIMESTAMP_FORMAT).to_string());
        }
    }
    None
}

/// Apply the cleaning rules to one raw row, in order. Order matters: the
/// customer id conversion assumes the null check already ran.
fn clean_record(record: &StringRecord, cols: &ColumnMap) -> std::result::Result<Transaction, DropReason> {
    let field = |i: usize| record.get(i).unwrap_or("");

    // 1. Missing customer id
    let customer_raw = field(cols.customer).trim();
    if customer_raw.is_empty() || customer_raw.eq_ignore_ascii_case("nan") {
        return Err(DropReason::MissingCustomer);
    }

    // 2. Cancelled invoices
    let invoice_id = field(cols.invoice).trim().to_string();
    if invoice_id.starts_with(CANCELLATION_MARKER) {
        return Err(DropReason::Cancelled);
    }

    // 3. Positive quantity and unit price
    let quantity = parse_int(field(cols.quantity)).ok_or(DropReason::Unparsable)?;
    let unit_price: f64 = field(cols.unit_price)
        .trim()
        .parse()
        .map_err(|_| DropReason::Unparsable)?;
    if quantity <= 0 || unit_price <= 0.0 {
        return Err(DropReason::NonPositive);
    }

    // 4. Timestamp to a proper date-time, normalized
    let invoice_timestamp = parse_timestamp(field(cols.timestamp)).ok_or(DropReason::Unparsable)?;

    // 5. Customer id to integer (safe: nulls dropped above)
    let customer_id = parse_int(customer_raw).ok_or(DropReason::Unparsable)?;

    // 6. Derived total
    let total_price = quantity as f64 * unit_price;

    let description = field(cols.description).trim();
    Ok(Transaction {
        invoice_id,
        stock_code: field(cols.stock).trim().to_string(),
        description: if description.is_empty() {
            None
        } else {
            Some(description.to_string())
        },
        quantity,
        invoice_timestamp,
        unit_price,
        customer_id,
        country: field(cols.country).trim().to_string(),
        total_price,
    })
}

// ---------------------------------------------------------------------------
// Stage entry point
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct CleanSummary {
    pub input_rows: usize,
    pub kept: usize,
    pub dropped_missing_customer: usize,
    pub dropped_cancelled: usize,
    pub dropped_non_positive: usize,
    pub dropped_unparsable: usize,
    pub dropped_duplicates: usize,
}

/// Read the raw artifact in full, apply the cleaning rules, and write the
/// cleaned artifact. Rows failing a rule are dropped silently; only the
/// aggregate counts are reported.
pub fn run(config: &PipelineConfig) -> Result<CleanSummary> {
    if !config.raw_path.exists() {
        return Err(EtlError::MissingArtifact(config.raw_path.clone()));
    }

    let file = std::fs::File::open(&config.raw_path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(std::io::BufReader::new(file));
    let cols = ColumnMap::resolve(rdr.headers()?)?;

    let mut summary = CleanSummary::default();
    let mut seen = HashSet::new();
    let mut cleaned: Vec<Transaction> = Vec::new();

    for result in rdr.records() {
        let record = result?;
        summary.input_rows += 1;
        match clean_record(&record, &cols) {
            Ok(txn) => {
                // 7. Exact-duplicate removal across all columns
                if seen.insert(txn.dedup_key()) {
                    summary.kept += 1;
                    cleaned.push(txn);
                } else {
                    summary.dropped_duplicates += 1;
                }
            }
            Err(DropReason::MissingCustomer) => summary.dropped_missing_customer += 1,
            Err(DropReason::Cancelled) => summary.dropped_cancelled += 1,
            Err(DropReason::NonPositive) => summary.dropped_non_positive += 1,
            Err(DropReason::Unparsable) => summary.dropped_unparsable += 1,
        }
    }

    // Header is written explicitly so an all-dropped input still yields a
    // well-formed cleaned artifact
    let out = std::fs::File::create(&config.clean_path)?;
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(std::io::BufWriter::new(out));
    wtr.write_record(CLEAN_HEADER)?;
    for txn in &cleaned {
        wtr.serialize(txn)?;
    }
    wtr.flush()?;

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    const RAW_HEADER: &str =
        "InvoiceNo,StockCode,Description,Quantity,InvoiceDate,UnitPrice,CustomerID,Country";

    fn write_raw(dir: &Path, rows: &[&str]) -> PipelineConfig {
        let config = PipelineConfig::rooted_at(dir);
        let mut content = String::from(RAW_HEADER);
        content.push('\n');
        for row in rows {
            content.push_str(row);
            content.push('\n');
        }
        std::fs::write(&config.raw_path, content).unwrap();
        config
    }

    fn read_cleaned(config: &PipelineConfig) -> Vec<Transaction> {
        let mut rdr = csv::Reader::from_path(&config.clean_path).unwrap();
        rdr.deserialize().map(|r| r.unwrap()).collect()
    }

    #[test]
    fn test_drops_missing_customer() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_raw(dir.path(), &[
            "536365,85123A,HEART HOLDER,6,2010-12-01 08:26:00,2.55,,United Kingdom",
            "536365,85123A,HEART HOLDER,6,2010-12-01 08:26:00,2.55,NaN,United Kingdom",
            "536366,22633,HAND WARMER,6,2010-12-01 08:28:00,1.85,17850,United Kingdom",
        ]);
        let summary = run(&config).unwrap();
        assert_eq!(summary.dropped_missing_customer, 2);
        assert_eq!(summary.kept, 1);
        assert!(read_cleaned(&config).iter().all(|t| t.customer_id > 0));
    }

    #[test]
    fn test_drops_cancelled_invoices() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_raw(dir.path(), &[
            "C536379,D,Discount,5,2010-12-01 09:41:00,2.5,17850,United Kingdom",
            "536380,22961,JAM MAKING SET,24,2010-12-01 09:41:00,1.45,17809,United Kingdom",
        ]);
        let summary = run(&config).unwrap();
        assert_eq!(summary.dropped_cancelled, 1);
        let rows = read_cleaned(&config);
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].invoice_id.starts_with('C'));
    }

    #[test]
    fn test_drops_non_positive_quantity_and_price() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_raw(dir.path(), &[
            "536365,85123A,HEART HOLDER,-6,2010-12-01 08:26:00,2.55,17850,United Kingdom",
            "536365,85123A,HEART HOLDER,6,2010-12-01 08:26:00,0,17850,United Kingdom",
            "536365,85123A,HEART HOLDER,0,2010-12-01 08:26:00,2.55,17850,United Kingdom",
            "536365,85123A,HEART HOLDER,6,2010-12-01 08:26:00,2.55,17850,United Kingdom",
        ]);
        let summary = run(&config).unwrap();
        assert_eq!(summary.dropped_non_positive, 3);
        assert_eq!(summary.kept, 1);
    }

    #[test]
    fn test_missing_customer_wins_over_cancellation() {
        // Rule order: a cancelled row with no customer counts as missing-customer
        let dir = tempfile::tempdir().unwrap();
        let config = write_raw(dir.path(), &[
            "C536379,D,Discount,5,2010-12-01 09:41:00,2.5,,United Kingdom",
        ]);
        let summary = run(&config).unwrap();
        assert_eq!(summary.dropped_missing_customer, 1);
        assert_eq!(summary.dropped_cancelled, 0);
    }

    #[test]
    fn test_total_price_is_quantity_times_unit_price() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_raw(dir.path(), &[
            "536365,85123A,HEART HOLDER,6,2010-12-01 08:26:00,2.55,17850,United Kingdom",
            "536367,84879,ASSORTED BIRD ORNAMENT,32,2010-12-01 08:34:00,1.69,13047,United Kingdom",
        ]);
        run(&config).unwrap();
        for txn in read_cleaned(&config) {
            assert!((txn.total_price - txn.quantity as f64 * txn.unit_price).abs() < 1e-9);
        }
    }

    #[test]
    fn test_end_to_end_survivor_row() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_raw(dir.path(), &[
            "536365,85123A,HEART HOLDER,6,2010-12-01 08:26:00,2.55,17850,United Kingdom",
        ]);
        run(&config).unwrap();
        let rows = read_cleaned(&config);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].invoice_id, "536365");
        assert_eq!(rows[0].customer_id, 17850);
        assert!((rows[0].total_price - 15.30).abs() < 1e-9);
    }

    #[test]
    fn test_customer_id_float_spelling() {
        // pandas writes a float-typed CustomerID column as "17850.0"
        let dir = tempfile::tempdir().unwrap();
        let config = write_raw(dir.path(), &[
            "536365,85123A,HEART HOLDER,6,2010-12-01 08:26:00,2.55,17850.0,United Kingdom",
        ]);
        run(&config).unwrap();
        assert_eq!(read_cleaned(&config)[0].customer_id, 17850);
    }

    #[test]
    fn test_source_date_format_is_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_raw(dir.path(), &[
            "536365,85123A,HEART HOLDER,6,12/1/2010 8:26,2.55,17850,United Kingdom",
        ]);
        run(&config).unwrap();
        assert_eq!(read_cleaned(&config)[0].invoice_timestamp, "2010-12-01 08:26:00");
    }

    #[test]
    fn test_removes_exact_duplicates_only() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_raw(dir.path(), &[
            "536365,85123A,HEART HOLDER,6,2010-12-01 08:26:00,2.55,17850,United Kingdom",
            "536365,85123A,HEART HOLDER,6,2010-12-01 08:26:00,2.55,17850,United Kingdom",
            "536365,85123A,HEART HOLDER,7,2010-12-01 08:26:00,2.55,17850,United Kingdom",
        ]);
        let summary = run(&config).unwrap();
        assert_eq!(summary.dropped_duplicates, 1);
        assert_eq!(summary.kept, 2);
    }

    #[test]
    fn test_idempotent_on_clean_input() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_raw(dir.path(), &[
            "536365,85123A,HEART HOLDER,6,2010-12-01 08:26:00,2.55,17850,United Kingdom",
            "C536379,D,Discount,5,2010-12-01 09:41:00,2.5,17850,United Kingdom",
            "536380,22961,JAM MAKING SET,24,2010-12-01 09:41:00,1.45,,United Kingdom",
        ]);
        run(&config).unwrap();
        let first_pass = std::fs::read_to_string(&config.clean_path).unwrap();

        // Feed the cleaned artifact back through the cleaner
        let rerun = PipelineConfig {
            raw_path: config.clean_path.clone(),
            clean_path: dir.path().join("cleaned_again.csv"),
            ..config.clone()
        };
        let summary = run(&rerun).unwrap();
        let second_pass = std::fs::read_to_string(&rerun.clean_path).unwrap();

        assert_eq!(first_pass, second_pass);
        assert_eq!(summary.kept, summary.input_rows);
    }

    #[test]
    fn test_missing_raw_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig::rooted_at(dir.path());
        let err = run(&config).unwrap_err();
        assert!(matches!(err, EtlError::MissingArtifact(_)));
    }

    #[test]
    fn test_missing_column_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig::rooted_at(dir.path());
        std::fs::write(&config.raw_path, "InvoiceNo,Quantity\n536365,6\n").unwrap();
        let err = run(&config).unwrap_err();
        assert!(matches!(err, EtlError::MissingColumn(_)));
    }
}
