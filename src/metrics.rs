//! Per-customer metric aggregation over sales transactions

use std::collections::{BTreeMap, HashSet};

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

use crate::error::{AnalyticsError, Result};
use crate::transform::Transaction;

/// One row per customer, folded from their sales transactions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerMetrics {
    pub customer_id: String,
    pub first_purchase: NaiveDateTime,
    pub last_purchase: NaiveDateTime,
    /// Count of distinct invoices.
    pub num_purchases: u64,
    /// Sum of line totals over positive-quantity rows.
    pub total_spent: f64,
    pub avg_order_value: f64,
    /// Whole days between the shared reference instant and the last purchase.
    pub days_since_last_purchase: i64,
    /// (last − first) in days, plus one. Never below 1.
    pub customer_age_days: i64,
    /// num_purchases / customer_age_days.
    pub purchase_frequency_rate: f64,
}

/// The shared "today" instant: one day past the latest invoice timestamp in
/// the full population. Computed once per run so recency and churn figures
/// agree on the same reference.
pub fn reference_date(rows: &[Transaction]) -> Result<NaiveDateTime> {
    rows.iter()
        .map(|t| t.invoice_date)
        .max()
        .map(|latest| latest + Duration::days(1))
        .ok_or(AnalyticsError::EmptyInput)
}

/// Fold sales-only transactions into one `CustomerMetrics` row per customer.
///
/// Output is ordered by customer id, so identical input always produces
/// identical output. Customers with no qualifying sales are absent, not
/// zero-filled.
pub fn aggregate_customers(sales: &[Transaction], today: NaiveDateTime) -> Vec<CustomerMetrics> {
    struct Fold {
        first: NaiveDateTime,
        last: NaiveDateTime,
        invoices: HashSet<String>,
        total_spent: f64,
    }

    let mut groups: BTreeMap<&str, Fold> = BTreeMap::new();
    for row in sales.iter().filter(|t| t.quantity > 0) {
        let entry = groups.entry(row.customer_id.as_str()).or_insert_with(|| Fold {
            first: row.invoice_date,
            last: row.invoice_date,
            invoices: HashSet::new(),
            total_spent: 0.0,
        });
        entry.first = entry.first.min(row.invoice_date);
        entry.last = entry.last.max(row.invoice_date);
        entry.invoices.insert(row.invoice_no.clone());
        entry.total_spent += row.line_total;
    }

    groups
        .into_iter()
        .map(|(customer_id, fold)| {
            let num_purchases = fold.invoices.len() as u64;
            let customer_age_days = ((fold.last - fold.first).num_days() + 1).max(1);
            CustomerMetrics {
                customer_id: customer_id.to_string(),
                first_purchase: fold.first,
                last_purchase: fold.last,
                num_purchases,
                total_spent: fold.total_spent,
                avg_order_value: fold.total_spent / num_purchases as f64,
                days_since_last_purchase: (today - fold.last).num_days(),
                customer_age_days,
                purchase_frequency_rate: num_purchases as f64 / customer_age_days as f64,
            }
        })
        .collect()
}
