//! Customer lifetime value estimation and churn-loss projection

use std::collections::HashSet;

use serde::Serialize;

use crate::churn::{ChurnRecord, ChurnStatus};
use crate::metrics::CustomerMetrics;

/// A customer with a projected lifetime value.
#[derive(Debug, Clone, Serialize)]
pub struct ClvRecord {
    pub customer_id: String,
    pub avg_order_value: f64,
    pub purchase_frequency_rate: f64,
    pub clv: f64,
}

/// Project per-customer revenue over a lifespan window:
/// `clv = avg_order_value × purchase_frequency_rate × lifespan_days`.
pub fn estimate_clv(metrics: &[CustomerMetrics], lifespan_days: i64) -> Vec<ClvRecord> {
    metrics
        .iter()
        .map(|m| ClvRecord {
            customer_id: m.customer_id.clone(),
            avg_order_value: m.avg_order_value,
            purchase_frequency_rate: m.purchase_frequency_rate,
            clv: m.avg_order_value * m.purchase_frequency_rate * lifespan_days as f64,
        })
        .collect()
}

/// Projected revenue at stake from churning customers.
///
/// Churning means At Risk or Lost; the sum is a plain filter over already
/// computed CLV values, nothing is re-derived.
pub fn churn_loss(clv: &[ClvRecord], churn: &[ChurnRecord]) -> f64 {
    let churned: HashSet<&str> = churn
        .iter()
        .filter(|r| matches!(r.churn_status, ChurnStatus::AtRisk | ChurnStatus::Lost))
        .map(|r| r.customer_id.as_str())
        .collect();
    clv.iter()
        .filter(|r| churned.contains(r.customer_id.as_str()))
        .map(|r| r.clv)
        .sum()
}
