//! Churn risk classification over days since last purchase

use std::fmt;

use serde::Serialize;

use crate::error::{AnalyticsError, Result};
use crate::metrics::CustomerMetrics;

/// Lower edge of the At Risk band, in days. Customers under this are Active.
pub const ACTIVE_WINDOW_DAYS: i64 = 90;

/// Churn risk bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ChurnStatus {
    Active,
    #[serde(rename = "At Risk")]
    AtRisk,
    Lost,
}

impl ChurnStatus {
    pub const ALL: [ChurnStatus; 3] = [ChurnStatus::Active, ChurnStatus::AtRisk, ChurnStatus::Lost];

    pub fn label(&self) -> &'static str {
        match self {
            ChurnStatus::Active => "Active",
            ChurnStatus::AtRisk => "At Risk",
            ChurnStatus::Lost => "Lost",
        }
    }
}

impl fmt::Display for ChurnStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A customer with an assigned churn band.
#[derive(Debug, Clone, Serialize)]
pub struct ChurnRecord {
    pub customer_id: String,
    pub days_since_last_purchase: i64,
    pub churn_status: ChurnStatus,
}

/// One churn summary row per status.
#[derive(Debug, Clone, Serialize)]
pub struct ChurnSummary {
    pub churn_status: ChurnStatus,
    pub customers: usize,
}

/// Band a single days-since-last-purchase value.
///
/// Bands are left-inclusive, right-exclusive: [0,90) Active,
/// [90,threshold) At Risk, [threshold,∞) Lost. Unlike RFM tiers these
/// boundaries are absolute, never population-relative.
pub fn band_for(days_since_last_purchase: i64, churn_threshold_days: i64) -> ChurnStatus {
    if days_since_last_purchase < ACTIVE_WINDOW_DAYS {
        ChurnStatus::Active
    } else if days_since_last_purchase < churn_threshold_days {
        ChurnStatus::AtRisk
    } else {
        ChurnStatus::Lost
    }
}

/// Classify every customer's churn status.
///
/// The threshold must lie past the Active window, otherwise the At Risk
/// band would be empty or inverted.
pub fn classify_churn(
    metrics: &[CustomerMetrics],
    churn_threshold_days: i64,
) -> Result<Vec<ChurnRecord>> {
    if churn_threshold_days <= ACTIVE_WINDOW_DAYS {
        return Err(AnalyticsError::InvalidConfig(format!(
            "churn threshold must exceed {ACTIVE_WINDOW_DAYS} days, got {churn_threshold_days}"
        )));
    }
    Ok(metrics
        .iter()
        .map(|m| ChurnRecord {
            customer_id: m.customer_id.clone(),
            days_since_last_purchase: m.days_since_last_purchase,
            churn_status: band_for(m.days_since_last_purchase, churn_threshold_days),
        })
        .collect())
}

/// Count customers per churn band, in band order.
pub fn churn_summary(records: &[ChurnRecord]) -> Vec<ChurnSummary> {
    ChurnStatus::ALL
        .iter()
        .map(|&status| ChurnSummary {
            churn_status: status,
            customers: records.iter().filter(|r| r.churn_status == status).count(),
        })
        .collect()
}
