//! RFM scoring: quantile-based tiers and rule-based customer segments

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

use crate::error::{AnalyticsError, Result};
use crate::metrics::CustomerMetrics;

/// Named customer segments, in cascade priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Segment {
    #[serde(rename = "VIP")]
    Vip,
    Loyal,
    #[serde(rename = "Frequent Buyer")]
    FrequentBuyer,
    #[serde(rename = "Big Spender")]
    BigSpender,
    Lost,
    #[serde(rename = "At Risk")]
    AtRisk,
    Others,
}

impl Segment {
    pub const ALL: [Segment; 7] = [
        Segment::Vip,
        Segment::Loyal,
        Segment::FrequentBuyer,
        Segment::BigSpender,
        Segment::Lost,
        Segment::AtRisk,
        Segment::Others,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Segment::Vip => "VIP",
            Segment::Loyal => "Loyal",
            Segment::FrequentBuyer => "Frequent Buyer",
            Segment::BigSpender => "Big Spender",
            Segment::Lost => "Lost",
            Segment::AtRisk => "At Risk",
            Segment::Others => "Others",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A customer with quantile tier scores and an assigned segment.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredCustomer {
    pub customer_id: String,
    pub recency_days: i64,
    pub frequency: u64,
    pub monetary: f64,
    pub recency_score: u8,
    pub frequency_score: u8,
    pub monetary_score: u8,
    /// Three score digits concatenated in R,F,M order, e.g. "545".
    pub rfm_score: String,
    pub segment: Segment,
}

/// Assign tier scores and segments to a full customer population.
///
/// Recency is scored inverted (most recent quintile gets 5); frequency and
/// monetary are direct. Frequency values are ranked with stable
/// first-occurrence ordering before binning, so heavy ties cannot collapse
/// the cut points.
pub fn score_customers(metrics: &[CustomerMetrics]) -> Result<Vec<ScoredCustomer>> {
    let recency: Vec<f64> = metrics
        .iter()
        .map(|m| m.days_since_last_purchase as f64)
        .collect();
    let frequency_ranks = first_occurrence_ranks(metrics.iter().map(|m| m.num_purchases as f64));
    let monetary: Vec<f64> = metrics.iter().map(|m| m.total_spent).collect();

    let recency_edges = quantile_edges(&recency, "recency")?;
    let frequency_edges = quantile_edges(&frequency_ranks, "frequency")?;
    let monetary_edges = quantile_edges(&monetary, "monetary")?;

    Ok(metrics
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let recency_score = 6 - bin(recency[i], &recency_edges);
            let frequency_score = bin(frequency_ranks[i], &frequency_edges);
            let monetary_score = bin(monetary[i], &monetary_edges);
            ScoredCustomer {
                customer_id: m.customer_id.clone(),
                recency_days: m.days_since_last_purchase,
                frequency: m.num_purchases,
                monetary: m.total_spent,
                recency_score,
                frequency_score,
                monetary_score,
                rfm_score: format!("{recency_score}{frequency_score}{monetary_score}"),
                segment: classify_segment(recency_score, frequency_score, monetary_score),
            }
        })
        .collect())
}

/// Map an (R,F,M) tier triple to a segment.
///
/// Ordered cascade, first match wins. The order is the disambiguation
/// contract: a (5,5,4) customer is Loyal, never Big Spender.
pub fn classify_segment(r: u8, f: u8, m: u8) -> Segment {
    if r == 5 && f == 5 && m == 5 {
        Segment::Vip
    } else if r >= 4 && f >= 4 {
        Segment::Loyal
    } else if f >= 4 && m >= 4 {
        Segment::FrequentBuyer
    } else if m == 5 {
        Segment::BigSpender
    } else if r <= 2 && f <= 2 && m <= 2 {
        Segment::Lost
    } else if r <= 2 {
        Segment::AtRisk
    } else {
        Segment::Others
    }
}

/// Quantile cut points at 0/20/40/60/80/100 percent, linear interpolation.
///
/// Fails when the population cannot support five equal buckets: fewer than
/// five distinct values, or cut points that are not strictly increasing
/// (heavily skewed distributions).
fn quantile_edges(values: &[f64], metric: &'static str) -> Result<[f64; 6]> {
    let population = values.len();
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let mut distinct = 0;
    for (i, v) in sorted.iter().enumerate() {
        if i == 0 || *v != sorted[i - 1] {
            distinct += 1;
        }
    }
    if distinct < 5 {
        return Err(AnalyticsError::InsufficientPopulation {
            metric,
            distinct,
            population,
        });
    }

    let mut edges = [0.0; 6];
    for (i, edge) in edges.iter_mut().enumerate() {
        *edge = percentile(&sorted, i as f64 / 5.0);
    }
    if edges.windows(2).any(|w| w[1] <= w[0]) {
        return Err(AnalyticsError::InsufficientPopulation {
            metric,
            distinct,
            population,
        });
    }
    Ok(edges)
}

/// Linear-interpolation percentile over a sorted slice.
fn percentile(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let h = (n - 1) as f64 * q;
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}

/// Bucket a value against quantile edges, returning 1..=5.
///
/// Intervals are right-closed; the lowest bucket includes the minimum.
fn bin(value: f64, edges: &[f64; 6]) -> u8 {
    for i in 0..4 {
        if value <= edges[i + 1] {
            return (i + 1) as u8;
        }
    }
    5
}

/// Rank values 1..=n with exact ties broken by first occurrence.
fn first_occurrence_ranks<I: Iterator<Item = f64>>(values: I) -> Vec<f64> {
    let values: Vec<f64> = values.collect();
    let mut order: Vec<usize> = (0..values.len()).collect();
    // sort_by is stable, so equal values keep input order
    order.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(Ordering::Equal));
    let mut ranks = vec![0.0; values.len()];
    for (position, &index) in order.iter().enumerate() {
        ranks[index] = (position + 1) as f64;
    }
    ranks
}
