//! Transaction normalization: cleaning, derived columns, sales/returns split

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::data::{parse_timestamp, RawTransaction};
use crate::error::Result;

/// A cleaned transaction row with derived columns.
#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    pub invoice_no: String,
    pub description: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub invoice_date: NaiveDateTime,
    pub customer_id: String,
    pub country: String,
    pub line_total: f64,
    pub is_return: bool,
}

/// Normalize raw rows: drop rows lacking an invoice or customer id, parse
/// the timestamp, and derive `line_total` and `is_return`.
///
/// Rows that survive the id filter but carry an unparseable timestamp are a
/// hard error; missing ids are an expected data gap, not a malformation.
pub fn normalize(raw: &[RawTransaction]) -> Result<Vec<Transaction>> {
    let mut rows = Vec::with_capacity(raw.len());
    for row in raw {
        let (invoice_no, customer_id) = match (&row.invoice_no, &row.customer_id) {
            (Some(invoice), Some(customer)) if !invoice.is_empty() && !customer.is_empty() => {
                (invoice.clone(), customer.clone())
            }
            _ => continue,
        };
        let invoice_date = parse_timestamp(&row.invoice_date)?;
        rows.push(Transaction {
            invoice_no,
            description: row.description.clone().unwrap_or_default(),
            quantity: row.quantity,
            unit_price: row.unit_price,
            invoice_date,
            customer_id,
            country: row.country.clone().unwrap_or_default(),
            line_total: row.quantity as f64 * row.unit_price,
            is_return: row.quantity < 0,
        });
    }
    Ok(rows)
}

/// Partition transactions into independent sales and returns tables.
///
/// Sales are rows with positive quantity, returns negative; a zero-quantity
/// row lands in neither. Both outputs are owned copies, so downstream
/// mutation of one can never alias the other.
pub fn split_sales_returns(rows: &[Transaction]) -> (Vec<Transaction>, Vec<Transaction>) {
    let sales = rows.iter().filter(|t| t.quantity > 0).cloned().collect();
    let returns = rows.iter().filter(|t| t.quantity < 0).cloned().collect();
    (sales, returns)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(
        invoice: Option<&str>,
        customer: Option<&str>,
        quantity: i64,
        unit_price: f64,
    ) -> RawTransaction {
        RawTransaction {
            invoice_no: invoice.map(String::from),
            stock_code: Some("85123A".into()),
            description: Some("WHITE HANGING HEART T-LIGHT HOLDER".into()),
            quantity,
            invoice_date: "2010-12-01T08:26:00".into(),
            unit_price,
            customer_id: customer.map(String::from),
            country: Some("United Kingdom".into()),
        }
    }

    #[test]
    fn drops_rows_missing_invoice_or_customer() {
        let rows = vec![
            raw(Some("536365"), Some("17850"), 6, 2.55),
            raw(None, Some("17850"), 6, 2.55),
            raw(Some("536366"), None, 6, 2.55),
            raw(Some(""), Some("17850"), 6, 2.55),
        ];
        let cleaned = normalize(&rows).unwrap();
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0].invoice_no, "536365");
    }

    #[test]
    fn derives_line_total_and_return_flag() {
        let rows = vec![
            raw(Some("536365"), Some("17850"), 6, 2.50),
            raw(Some("C536379"), Some("17850"), -2, 4.00),
        ];
        let cleaned = normalize(&rows).unwrap();
        assert_eq!(cleaned[0].line_total, 15.0);
        assert!(!cleaned[0].is_return);
        assert_eq!(cleaned[1].line_total, -8.0);
        assert!(cleaned[1].is_return);
    }

    #[test]
    fn split_partitions_disjointly() {
        let rows = normalize(&[
            raw(Some("536365"), Some("17850"), 6, 2.55),
            raw(Some("C536379"), Some("17850"), -2, 4.00),
            raw(Some("536380"), Some("13047"), 0, 1.00),
        ])
        .unwrap();
        let (sales, returns) = split_sales_returns(&rows);
        assert_eq!(sales.len(), 1);
        assert_eq!(returns.len(), 1);
        assert!(sales.iter().all(|t| t.quantity > 0));
        assert!(returns.iter().all(|t| t.quantity < 0));
        // zero-quantity row belongs to neither partition
        assert_eq!(sales.len() + returns.len(), rows.len() - 1);
    }

    #[test]
    fn unparseable_timestamp_fails_loudly() {
        let mut row = raw(Some("536365"), Some("17850"), 6, 2.55);
        row.invoice_date = "not a date".into();
        assert!(normalize(&[row]).is_err());
    }
}
