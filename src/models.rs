use serde::{Deserialize, Serialize};

/// Leading character on an invoice id that marks a cancelled invoice.
pub const CANCELLATION_MARKER: char = 'C';

/// Timestamp format shared by the cleaned and validated artifacts. The cleaner
/// normalizes to this so the validator's re-parse from CSV is exact.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Header row of the cleaned and validated artifacts, in field order.
pub const CLEAN_HEADER: [&str; 9] = [
    "invoice_id",
    "stock_code",
    "description",
    "quantity",
    "invoice_timestamp",
    "unit_price",
    "customer_id",
    "country",
    "total_price",
];

/// One line item of one invoice, after cleaning. Field order matches
/// [`CLEAN_HEADER`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub invoice_id: String,
    pub stock_code: String,
    pub description: Option<String>,
    pub quantity: i64,
    pub invoice_timestamp: String,
    pub unit_price: f64,
    pub customer_id: i64,
    pub country: String,
    pub total_price: f64,
}

impl Transaction {
    /// Key for exact-duplicate removal across all columns. Floats compare
    /// bit-exact: both sides were parsed from the same textual artifact.
    pub fn dedup_key(&self) -> String {
        format!(
            "{}\u{1f}{}\u{1f}{}\u{1f}{}\u{1f}{}\u{1f}{}\u{1f}{}\u{1f}{}\u{1f}{}",
            self.invoice_id,
            self.stock_code,
            self.description.as_deref().unwrap_or(""),
            self.quantity,
            self.invoice_timestamp,
            self.unit_price.to_bits(),
            self.customer_id,
            self.country,
            self.total_price.to_bits(),
        )
    }
}
