//! CSV ingestion and persistence for retail transaction data

use std::io::Read;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, Result};

/// A transaction row as it appears in the source CSV.
///
/// Invoice and customer ids are optional because the source data has gaps;
/// rows missing either are dropped by the normalizer, not here.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawTransaction {
    #[serde(rename = "InvoiceNo")]
    pub invoice_no: Option<String>,
    #[serde(rename = "StockCode")]
    pub stock_code: Option<String>,
    #[serde(rename = "Description")]
    pub description: Option<String>,
    #[serde(rename = "Quantity")]
    pub quantity: i64,
    #[serde(rename = "InvoiceDate")]
    pub invoice_date: String,
    #[serde(rename = "UnitPrice")]
    pub unit_price: f64,
    #[serde(rename = "CustomerID")]
    pub customer_id: Option<String>,
    #[serde(rename = "Country")]
    pub country: Option<String>,
}

/// Load raw transactions from any CSV reader.
///
/// A row whose quantity or unit price cannot be parsed is a hard error with
/// the offending line number, never a silent coercion.
pub fn load_transactions<R: Read>(reader: R) -> Result<Vec<RawTransaction>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (line_num, record) in csv_reader.deserialize().enumerate() {
        let row: RawTransaction = record.map_err(|e| {
            AnalyticsError::MalformedInput(format!("line {}: {}", line_num + 2, e))
        })?;
        rows.push(row);
    }
    Ok(rows)
}

/// Load raw transactions from a CSV file path.
pub fn load_transactions_file(path: &Path) -> Result<Vec<RawTransaction>> {
    let file = std::fs::File::open(path)?;
    load_transactions(file)
}

/// Write any serializable table as CSV.
///
/// This is the whole persistence contract: table in, file out.
pub fn save_csv<T: Serialize>(records: &[T], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

/// Timestamp formats seen across exports of the retail dataset.
const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%y %H:%M",
];

/// Parse an invoice timestamp, trying each known format in turn.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime> {
    let trimmed = raw.trim().trim_end_matches('Z');
    for format in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(ts);
        }
    }
    Err(AnalyticsError::MalformedInput(format!(
        "unparseable invoice timestamp: {raw:?}"
    )))
}
