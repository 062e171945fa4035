//! RetailScope: customer behavior analytics over retail transaction logs
//!
//! This library computes RFM scores and segments, churn risk, customer
//! lifetime value, sales trend aggregates, and market basket association
//! rules from a batch of historical transactions, and renders each result
//! as a saved chart image.

pub mod basket;
pub mod churn;
pub mod cli;
pub mod clv;
pub mod data;
pub mod error;
pub mod metrics;
pub mod rfm;
pub mod sales;
pub mod transform;
pub mod viz;

// Re-export public items for easier access
pub use basket::{mine_rules, prepare_baskets, top_rules, AssociationRule, BasketAnalysis};
pub use churn::{churn_summary, classify_churn, ChurnRecord, ChurnStatus, ChurnSummary};
pub use cli::Args;
pub use clv::{churn_loss, estimate_clv, ClvRecord};
pub use data::{load_transactions, load_transactions_file, save_csv, RawTransaction};
pub use error::{AnalyticsError, Result};
pub use metrics::{aggregate_customers, reference_date, CustomerMetrics};
pub use rfm::{classify_segment, score_customers, ScoredCustomer, Segment};
pub use transform::{normalize, split_sales_returns, Transaction};
