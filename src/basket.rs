//! Market basket analysis: frequent itemsets and association rules

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::Serialize;

use crate::error::{AnalyticsError, Result};
use crate::transform::Transaction;

/// Invoice ids with this prefix are credit notes (returns) and never enter
/// the basket matrix.
const RETURN_INVOICE_PREFIX: char = 'C';

/// Sparse invoice×item presence matrix: an item index plus one item-id set
/// per invoice. Equivalent to a binary matrix without the dense storage.
#[derive(Debug, Clone)]
pub struct BasketMatrix {
    /// Item index: position is the item id used in `baskets`.
    pub items: Vec<String>,
    /// One set of item ids per invoice.
    pub baskets: Vec<BTreeSet<usize>>,
}

/// An association rule with its quality measures.
#[derive(Debug, Clone)]
pub struct AssociationRule {
    pub antecedent: Vec<String>,
    pub consequent: Vec<String>,
    pub support: f64,
    pub confidence: f64,
    pub lift: f64,
}

impl AssociationRule {
    /// Flatten to a serializable row for CSV output.
    pub fn to_record(&self) -> RuleRecord {
        RuleRecord {
            antecedents: self.antecedent.join(", "),
            consequents: self.consequent.join(", "),
            support: self.support,
            confidence: self.confidence,
            lift: self.lift,
        }
    }
}

/// CSV-friendly projection of an [`AssociationRule`].
#[derive(Debug, Clone, Serialize)]
pub struct RuleRecord {
    pub antecedents: String,
    pub consequents: String,
    pub support: f64,
    pub confidence: f64,
    pub lift: f64,
}

/// Mining output: the rules plus enough diagnostics to tell "no data" apart
/// from "thresholds too strict". An empty rule table is a valid outcome,
/// not an error.
#[derive(Debug, Clone)]
pub struct BasketAnalysis {
    /// Rules sorted by lift descending, deduplicated across directions.
    pub rules: Vec<AssociationRule>,
    /// Frequent itemsets (all sizes) that met the support threshold.
    pub frequent_itemsets: usize,
    pub invoices: usize,
    pub distinct_items: usize,
}

/// Build the sparse presence matrix from sales rows.
///
/// Return-marked invoices and non-positive quantities are excluded; a
/// product is present on an invoice if any qualifying row mentions it.
pub fn prepare_baskets(sales: &[Transaction]) -> BasketMatrix {
    let mut item_ids: HashMap<&str, usize> = HashMap::new();
    let mut items: Vec<String> = Vec::new();
    // BTreeMap keyed by invoice keeps basket order deterministic
    let mut by_invoice: std::collections::BTreeMap<&str, BTreeSet<usize>> =
        std::collections::BTreeMap::new();

    for row in sales {
        if row.quantity <= 0
            || row.invoice_no.starts_with(RETURN_INVOICE_PREFIX)
            || row.description.is_empty()
        {
            continue;
        }
        let item_id = *item_ids.entry(row.description.as_str()).or_insert_with(|| {
            items.push(row.description.clone());
            items.len() - 1
        });
        by_invoice
            .entry(row.invoice_no.as_str())
            .or_default()
            .insert(item_id);
    }

    BasketMatrix {
        items,
        baskets: by_invoice.into_values().collect(),
    }
}

/// Mine frequent itemsets and derive association rules.
pub fn mine_rules(
    matrix: &BasketMatrix,
    min_support: f64,
    min_confidence: f64,
) -> Result<BasketAnalysis> {
    if !(0.0..=1.0).contains(&min_support) || min_support == 0.0 {
        return Err(AnalyticsError::InvalidConfig(format!(
            "min support must be in (0, 1], got {min_support}"
        )));
    }
    if !(0.0..=1.0).contains(&min_confidence) {
        return Err(AnalyticsError::InvalidConfig(format!(
            "min confidence must be in [0, 1], got {min_confidence}"
        )));
    }

    let invoices = matrix.baskets.len();
    let distinct_items = matrix.items.len();
    if invoices == 0 {
        return Ok(BasketAnalysis {
            rules: Vec::new(),
            frequent_itemsets: 0,
            invoices,
            distinct_items,
        });
    }

    let support_map = frequent_itemsets(matrix, min_support);
    let rules = derive_rules(matrix, &support_map, min_confidence);

    Ok(BasketAnalysis {
        rules,
        frequent_itemsets: support_map.len(),
        invoices,
        distinct_items,
    })
}

/// Truncate a lift-sorted rule list to its top N.
pub fn top_rules(rules: &[AssociationRule], n: usize) -> Vec<AssociationRule> {
    rules.iter().take(n).cloned().collect()
}

/// Apriori: grow itemsets level by level, pruning below min support.
fn frequent_itemsets(matrix: &BasketMatrix, min_support: f64) -> HashMap<Vec<usize>, f64> {
    let n = matrix.baskets.len() as f64;
    let mut support_map: HashMap<Vec<usize>, f64> = HashMap::new();

    // level 1
    let mut counts = vec![0usize; matrix.items.len()];
    for basket in &matrix.baskets {
        for &item in basket {
            counts[item] += 1;
        }
    }
    let mut current: Vec<Vec<usize>> = Vec::new();
    for (item, &count) in counts.iter().enumerate() {
        let support = count as f64 / n;
        if support >= min_support {
            support_map.insert(vec![item], support);
            current.push(vec![item]);
        }
    }

    // level k from level k-1
    while !current.is_empty() {
        let candidates = generate_candidates(&current);
        let mut next: Vec<Vec<usize>> = Vec::new();
        for candidate in candidates {
            let count = matrix
                .baskets
                .iter()
                .filter(|basket| candidate.iter().all(|item| basket.contains(item)))
                .count();
            let support = count as f64 / n;
            if support >= min_support {
                support_map.insert(candidate.clone(), support);
                next.push(candidate);
            }
        }
        current = next;
    }

    support_map
}

/// Join step: merge sorted k-itemsets sharing their first k-1 items, then
/// prune candidates with any infrequent k-subset.
fn generate_candidates(level: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let known: HashSet<&[usize]> = level.iter().map(|v| v.as_slice()).collect();
    let mut candidates = Vec::new();

    for (i, left) in level.iter().enumerate() {
        for right in &level[i + 1..] {
            let k = left.len();
            if left[..k - 1] != right[..k - 1] {
                continue;
            }
            let mut candidate = left.clone();
            candidate.push(right[k - 1]);
            candidate.sort_unstable();

            let all_subsets_frequent = (0..candidate.len()).all(|skip| {
                let subset: Vec<usize> = candidate
                    .iter()
                    .enumerate()
                    .filter(|(pos, _)| *pos != skip)
                    .map(|(_, &item)| item)
                    .collect();
                known.contains(subset.as_slice())
            });
            if all_subsets_frequent {
                candidates.push(candidate);
            }
        }
    }
    candidates
}

/// Split every frequent itemset of size ≥2 into antecedent/consequent
/// pairs, keep those above min confidence, sort by lift descending and
/// collapse A→B / B→A duplicates to the first seen.
fn derive_rules(
    matrix: &BasketMatrix,
    support_map: &HashMap<Vec<usize>, f64>,
    min_confidence: f64,
) -> Vec<AssociationRule> {
    struct Candidate {
        antecedent: Vec<usize>,
        consequent: Vec<usize>,
        support: f64,
        confidence: f64,
        lift: f64,
    }

    let mut itemsets: Vec<&Vec<usize>> = support_map.keys().filter(|s| s.len() >= 2).collect();
    itemsets.sort();

    let mut found: Vec<Candidate> = Vec::new();
    for itemset in itemsets {
        let support = support_map[itemset.as_slice()];
        let k = itemset.len();
        // every non-empty proper subset as antecedent
        for mask in 1..(1u32 << k) - 1 {
            let mut antecedent = Vec::new();
            let mut consequent = Vec::new();
            for (pos, &item) in itemset.iter().enumerate() {
                if mask & (1u32 << pos) != 0 {
                    antecedent.push(item);
                } else {
                    consequent.push(item);
                }
            }
            let (Some(&antecedent_support), Some(&consequent_support)) = (
                support_map.get(antecedent.as_slice()),
                support_map.get(consequent.as_slice()),
            ) else {
                continue;
            };
            let confidence = support / antecedent_support;
            if confidence >= min_confidence {
                found.push(Candidate {
                    antecedent,
                    consequent,
                    support,
                    confidence,
                    lift: confidence / consequent_support,
                });
            }
        }
    }

    // stable sort keeps generation order between equal lifts
    found.sort_by(|a, b| b.lift.partial_cmp(&a.lift).unwrap_or(std::cmp::Ordering::Equal));

    let mut seen: HashSet<(Vec<usize>, Vec<usize>)> = HashSet::new();
    let mut rules = Vec::new();
    for rule in found {
        let pair = if rule.antecedent <= rule.consequent {
            (rule.antecedent.clone(), rule.consequent.clone())
        } else {
            (rule.consequent.clone(), rule.antecedent.clone())
        };
        if !seen.insert(pair) {
            continue;
        }
        rules.push(AssociationRule {
            antecedent: rule
                .antecedent
                .iter()
                .map(|&i| matrix.items[i].clone())
                .collect(),
            consequent: rule
                .consequent
                .iter()
                .map(|&i| matrix.items[i].clone())
                .collect(),
            support: rule.support,
            confidence: rule.confidence,
            lift: rule.lift,
        });
    }
    rules
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sale(invoice: &str, description: &str) -> Transaction {
        let invoice_date = NaiveDate::from_ymd_opt(2011, 4, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        Transaction {
            invoice_no: invoice.to_string(),
            description: description.to_string(),
            quantity: 2,
            unit_price: 1.0,
            invoice_date,
            customer_id: "17850".into(),
            country: "United Kingdom".into(),
            line_total: 2.0,
            is_return: false,
        }
    }

    #[test]
    fn matrix_excludes_return_invoices() {
        let sales = vec![
            sale("1", "LANTERN"),
            sale("C2", "LANTERN"),
            sale("3", "CHALKBOARD"),
        ];
        let matrix = prepare_baskets(&sales);
        assert_eq!(matrix.baskets.len(), 2);
        assert_eq!(matrix.items.len(), 2);
    }

    #[test]
    fn repeated_product_on_one_invoice_counts_once() {
        let sales = vec![sale("1", "LANTERN"), sale("1", "LANTERN")];
        let matrix = prepare_baskets(&sales);
        assert_eq!(matrix.baskets.len(), 1);
        assert_eq!(matrix.baskets[0].len(), 1);
    }

    #[test]
    fn perfectly_cooccurring_items_give_confidence_one() {
        // every invoice containing A also contains B
        let sales = vec![
            sale("1", "A"),
            sale("1", "B"),
            sale("2", "A"),
            sale("2", "B"),
            sale("3", "B"),
        ];
        let matrix = prepare_baskets(&sales);
        let analysis = mine_rules(&matrix, 0.3, 0.3).unwrap();

        let rule = analysis
            .rules
            .iter()
            .find(|r| r.antecedent == vec!["A".to_string()])
            .expect("rule A -> B");
        assert_eq!(rule.consequent, vec!["B".to_string()]);
        assert_eq!(rule.confidence, 1.0);
        assert!((rule.support - 2.0 / 3.0).abs() < 1e-12);
        assert!((rule.lift - 1.0).abs() < 1e-12); // B is on every invoice
    }

    #[test]
    fn rules_are_sorted_by_lift_descending() {
        let sales = vec![
            sale("1", "A"),
            sale("1", "B"),
            sale("2", "A"),
            sale("2", "B"),
            sale("3", "B"),
            sale("3", "C"),
            sale("4", "C"),
            sale("4", "D"),
            sale("5", "C"),
            sale("5", "D"),
        ];
        let matrix = prepare_baskets(&sales);
        let analysis = mine_rules(&matrix, 0.2, 0.3).unwrap();
        assert!(!analysis.rules.is_empty());
        for pair in analysis.rules.windows(2) {
            assert!(pair[0].lift >= pair[1].lift);
        }
    }

    #[test]
    fn mirrored_rule_directions_are_deduplicated() {
        let sales = vec![sale("1", "A"), sale("1", "B"), sale("2", "A"), sale("2", "B")];
        let matrix = prepare_baskets(&sales);
        let analysis = mine_rules(&matrix, 0.5, 0.3).unwrap();
        // A -> B and B -> A carry identical lift; only one survives
        assert_eq!(analysis.rules.len(), 1);
    }

    #[test]
    fn strict_thresholds_yield_empty_rules_with_diagnostics() {
        let sales = vec![
            sale("1", "A"),
            sale("2", "B"),
            sale("3", "C"),
            sale("4", "D"),
        ];
        let matrix = prepare_baskets(&sales);
        let analysis = mine_rules(&matrix, 0.9, 0.3).unwrap();
        assert!(analysis.rules.is_empty());
        assert_eq!(analysis.frequent_itemsets, 0);
        // the diagnostics show the data was there
        assert_eq!(analysis.invoices, 4);
        assert_eq!(analysis.distinct_items, 4);
    }

    #[test]
    fn empty_input_is_distinguishable_from_strict_thresholds() {
        let matrix = prepare_baskets(&[]);
        let analysis = mine_rules(&matrix, 0.01, 0.3).unwrap();
        assert!(analysis.rules.is_empty());
        assert_eq!(analysis.invoices, 0);
    }

    #[test]
    fn invalid_thresholds_are_rejected() {
        let matrix = prepare_baskets(&[sale("1", "A")]);
        assert!(mine_rules(&matrix, 0.0, 0.3).is_err());
        assert!(mine_rules(&matrix, 1.5, 0.3).is_err());
        assert!(mine_rules(&matrix, 0.01, 1.5).is_err());
    }

    #[test]
    fn top_rules_truncates() {
        let sales = vec![
            sale("1", "A"),
            sale("1", "B"),
            sale("1", "C"),
            sale("2", "A"),
            sale("2", "B"),
            sale("2", "C"),
        ];
        let matrix = prepare_baskets(&sales);
        let analysis = mine_rules(&matrix, 0.5, 0.3).unwrap();
        let top = top_rules(&analysis.rules, 2);
        assert!(top.len() <= 2);
    }
}
