//! Error types shared across the analytics pipeline

use thiserror::Error;

/// Errors surfaced by the analytics components.
///
/// The pipeline is a deterministic batch computation: none of these are
/// retryable, and a failing component produces no partial output.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// A row handed to the core had a missing or unparseable required field.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// Quantile binning could not form 5 equal-population buckets.
    #[error(
        "cannot split {metric} into 5 quantile buckets: \
         {distinct} distinct value(s) in a population of {population}"
    )]
    InsufficientPopulation {
        metric: &'static str,
        distinct: usize,
        population: usize,
    },

    /// A configuration parameter is outside its valid range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The input contained no usable transactions.
    #[error("no transactions to analyze")]
    EmptyInput,

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Common result type used throughout the library.
pub type Result<T> = std::result::Result<T, AnalyticsError>;
