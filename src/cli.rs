//! Command-line interface definitions and argument parsing

use clap::Parser;

/// Customer behavior analytics over a retail transaction log
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input transactions CSV file
    #[arg(short, long, default_value = "data/OnlineRetail.csv")]
    pub input: String,

    /// Directory for output tables and charts
    #[arg(short, long, default_value = "output")]
    pub output_dir: String,

    /// Days since last purchase after which a customer counts as lost
    #[arg(long, default_value_t = 180)]
    pub churn_threshold_days: i64,

    /// Projection horizon for lifetime value, in days
    #[arg(long, default_value_t = 180)]
    pub lifespan_days: i64,

    /// Minimum support for frequent itemset mining
    #[arg(long, default_value_t = 0.01)]
    pub min_support: f64,

    /// Minimum confidence for association rules
    #[arg(long, default_value_t = 0.3)]
    pub min_confidence: f64,

    /// How many top rules and top products to report
    #[arg(long, default_value_t = 10)]
    pub top_n: usize,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}
