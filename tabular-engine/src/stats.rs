//! Column statistics shared by the prompt builder and the strategies.
//!
//! Everything here is total: empty inputs yield `None` or empty vectors,
//! never a division by zero.

use std::collections::{HashMap, HashSet};

use crate::dataset::{Cell, TabularDataset};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NumericSummary {
    pub count: usize,
    pub sum: f64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

pub fn summarize(values: &[f64]) -> Option<NumericSummary> {
    if values.is_empty() {
        return None;
    }
    let sum: f64 = values.iter().sum();
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Some(NumericSummary {
        count: values.len(),
        sum,
        min,
        max,
        mean: sum / values.len() as f64,
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Aggregation {
    Sum,
    Mean,
}

impl Aggregation {
    pub fn label(self) -> &'static str {
        match self {
            Aggregation::Sum => "total",
            Aggregation::Mean => "average",
        }
    }
}

/// Non-empty values of a column in first-appearance order, with counts,
/// sorted by count descending (ties keep first appearance).
pub fn value_counts(ds: &TabularDataset, idx: usize) -> Vec<(String, usize)> {
    let mut order: Vec<(String, usize)> = Vec::new();
    let mut pos: HashMap<String, usize> = HashMap::new();
    for key in ds.column(idx).filter_map(|c| c.key()) {
        match pos.get(&key) {
            Some(&i) => order[i].1 += 1,
            None => {
                pos.insert(key.clone(), order.len());
                order.push((key, 1));
            }
        }
    }
    order.sort_by(|a, b| b.1.cmp(&a.1));
    order
}

/// Distinct non-empty values of `idx` over rows accepted by `keep`, in
/// first-appearance order.
pub fn distinct_where<F>(ds: &TabularDataset, idx: usize, keep: F) -> Vec<String>
where
    F: Fn(&[Cell]) -> bool,
{
    let mut seen = HashSet::new();
    ds.rows
        .iter()
        .filter(|r| keep(r.as_slice()))
        .filter_map(|r| r.get(idx).and_then(|c| c.key()))
        .filter(|k| seen.insert(k.clone()))
        .collect()
}

/// Aggregates numeric column `value` grouped by column `group`, sorted
/// descending (ties keep first appearance). Rows with an empty group key
/// or a non-numeric value are ignored.
pub fn group_aggregate(
    ds: &TabularDataset,
    group: usize,
    value: usize,
    agg: Aggregation,
) -> Vec<(String, f64)> {
    let mut groups: Vec<(String, f64, usize)> = Vec::new();
    let mut pos: HashMap<String, usize> = HashMap::new();
    for row in &ds.rows {
        let (Some(key), Some(v)) = (
            row.get(group).and_then(|c| c.key()),
            row.get(value).and_then(|c| c.as_f64()),
        ) else {
            continue;
        };
        match pos.get(&key) {
            Some(&i) => {
                groups[i].1 += v;
                groups[i].2 += 1;
            }
            None => {
                pos.insert(key.clone(), groups.len());
                groups.push((key, v, 1));
            }
        }
    }

    let mut out: Vec<(String, f64)> = groups
        .into_iter()
        .map(|(k, sum, n)| match agg {
            Aggregation::Sum => (k, sum),
            Aggregation::Mean => (k, sum / n as f64),
        })
        .collect();
    out.sort_by(|a, b| b.1.total_cmp(&a.1));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sales() -> TabularDataset {
        TabularDataset::new(
            "t",
            vec!["Region".into(), "Sales".into()],
            vec![
                vec![Cell::infer("North"), Cell::infer("100")],
                vec![Cell::infer("South"), Cell::infer("200")],
                vec![Cell::infer("North"), Cell::infer("50")],
                vec![Cell::Empty, Cell::infer("999")],
            ],
        )
    }

    #[test]
    fn summarize_empty_is_none() {
        assert_eq!(summarize(&[]), None);
        let s = summarize(&[1.0, 3.0]).unwrap();
        assert_eq!((s.count, s.sum, s.min, s.max, s.mean), (2, 4.0, 1.0, 3.0, 2.0));
    }

    #[test]
    fn group_sum_sorted_descending() {
        let g = group_aggregate(&sales(), 0, 1, Aggregation::Sum);
        assert_eq!(g, vec![("South".to_string(), 200.0), ("North".to_string(), 150.0)]);
    }

    #[test]
    fn group_mean() {
        let g = group_aggregate(&sales(), 0, 1, Aggregation::Mean);
        assert_eq!(g, vec![("South".to_string(), 200.0), ("North".to_string(), 75.0)]);
    }

    #[test]
    fn value_counts_ties_keep_first_appearance() {
        let ds = TabularDataset::new(
            "t",
            vec!["Item".into()],
            ["Ink", "Pen", "Pen", "Ink", "Cap"]
                .iter()
                .map(|s| vec![Cell::infer(s)])
                .collect(),
        );
        assert_eq!(
            value_counts(&ds, 0),
            vec![("Ink".to_string(), 2), ("Pen".to_string(), 2), ("Cap".to_string(), 1)]
        );
    }

    #[test]
    fn distinct_with_row_filter() {
        let d = distinct_where(&sales(), 0, |r| r[1].as_f64().is_some_and(|v| v < 150.0));
        assert_eq!(d, vec!["North"]);
    }
}
