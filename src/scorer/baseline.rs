//! Baseline responsibility heuristic
//!
//! A dependency-free stand-in for the external causal scorer, used by the
//! worker backend. For every field outside the current view it measures how
//! differently the field is distributed in the two groups:
//!
//! * quantitative fields: absolute standardized mean difference `d`, squashed
//!   to `d / (1 + d)`
//! * everything else: total-variation distance between value frequencies
//!
//! Both land in `[0, 1]`, so fields of either kind rank on one scale. A field
//! without values in either group scores NaN.

use super::{CausalEffect, ScoreResponse};
use crate::metadata::{FieldMeta, Row};
use crate::request::ExplainRequest;
use crate::subspace::Subspace;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone)]
pub struct BaselineScorer {
    /// Groups with fewer usable values than this score NaN.
    pub min_group_size: usize,
}

impl Default for BaselineScorer {
    fn default() -> Self {
        Self { min_group_size: 1 }
    }
}

impl BaselineScorer {
    pub fn score(&self, request: &ExplainRequest) -> ScoreResponse {
        let current = select(&request.data, &request.groups.current);
        let other = select(&request.data, &request.groups.other);

        let in_view: HashSet<&str> = request
            .view
            .dimensions
            .iter()
            .map(String::as_str)
            .chain(request.view.measures.iter().map(|m| m.fid.as_str()))
            .collect();

        let causal_effects = request
            .fields
            .iter()
            .filter(|f| !in_view.contains(f.fid.as_str()))
            .map(|f| CausalEffect::new(f.fid.clone(), self.field_shift(f, &current, &other)))
            .collect();

        ScoreResponse { causal_effects }
    }

    fn field_shift(&self, field: &FieldMeta, a: &[&Row], b: &[&Row]) -> f64 {
        let min = self.min_group_size.max(1);
        if field.semantic_type.is_quantitative() {
            let xs = numbers(a, &field.fid);
            let ys = numbers(b, &field.fid);
            if xs.len() < min || ys.len() < min {
                return f64::NAN;
            }
            standardized_mean_difference(&xs, &ys)
        } else {
            let xs = frequencies(a, &field.fid);
            let ys = frequencies(b, &field.fid);
            if xs.1 < min || ys.1 < min {
                return f64::NAN;
            }
            total_variation(&xs, &ys)
        }
    }
}

fn select<'a>(rows: &'a [Row], subspace: &Subspace) -> Vec<&'a Row> {
    rows.iter().filter(|row| subspace.contains(row)).collect()
}

fn numbers(rows: &[&Row], fid: &str) -> Vec<f64> {
    rows.iter()
        .filter_map(|row| row.get(fid).and_then(|v| v.as_f64()))
        .collect()
}

fn frequencies(rows: &[&Row], fid: &str) -> (HashMap<String, usize>, usize) {
    let mut counts = HashMap::new();
    let mut total = 0;
    for value in rows.iter().filter_map(|row| row.get(fid)).filter(|v| !v.is_null()) {
        *counts.entry(value.to_string()).or_insert(0) += 1;
        total += 1;
    }
    (counts, total)
}

fn mean_and_variance(xs: &[f64]) -> (f64, f64) {
    let n = xs.len() as f64;
    let mean = xs.iter().sum::<f64>() / n;
    let variance = xs.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    (mean, variance)
}

fn standardized_mean_difference(xs: &[f64], ys: &[f64]) -> f64 {
    let (mx, vx) = mean_and_variance(xs);
    let (my, vy) = mean_and_variance(ys);
    let diff = (mx - my).abs();
    if diff == 0.0 {
        return 0.0;
    }
    let pooled = ((vx + vy) / 2.0).sqrt();
    if pooled == 0.0 {
        // Constant but different groups are fully separated.
        return 1.0;
    }
    let d = diff / pooled;
    d / (1.0 + d)
}

fn total_variation(a: &(HashMap<String, usize>, usize), b: &(HashMap<String, usize>, usize)) -> f64 {
    let (counts_a, total_a) = a;
    let (counts_b, total_b) = b;
    let keys: HashSet<&String> = counts_a.keys().chain(counts_b.keys()).collect();
    let sum: f64 = keys
        .into_iter()
        .map(|k| {
            let pa = *counts_a.get(k).unwrap_or(&0) as f64 / *total_a as f64;
            let pb = *counts_b.get(k).unwrap_or(&0) as f64 / *total_b as f64;
            (pa - pb).abs()
        })
        .sum();
    sum / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff_mode::{resolve, DiffMode, EditingGroup};
    use crate::filter::Filter;
    use crate::metadata::{CausalModel, Dataset, SemanticType};
    use crate::request::build;
    use serde_json::json;

    fn dataset() -> Dataset {
        let rows = (0..8)
            .map(|i| {
                let mut row = Row::new();
                row.insert("region".into(), json!(if i < 4 { "west" } else { "east" }));
                // channel is perfectly aligned with region, discount is not.
                row.insert("channel".into(), json!(if i < 4 { "web" } else { "store" }));
                row.insert("discount".into(), json!((i % 2) as f64));
                row.insert("note".into(), serde_json::Value::Null);
                row.insert("revenue".into(), json!(i * 10));
                row
            })
            .collect();
        Dataset::new(
            vec![
                FieldMeta::new("region", SemanticType::Nominal),
                FieldMeta::new("channel", SemanticType::Nominal),
                FieldMeta::new("discount", SemanticType::Quantitative),
                FieldMeta::new("note", SemanticType::Nominal),
                FieldMeta::new("revenue", SemanticType::Quantitative),
            ],
            rows,
        )
    }

    fn score(mode: DiffMode) -> HashMap<String, f64> {
        let ds = dataset();
        let pair = resolve(mode, Some(&Filter::set("region", ["west"])), EditingGroup::Foreground, None);
        let request = build(Some("revenue"), None, pair.as_ref(), &ds, &CausalModel::default())
            .unwrap()
            .unwrap();
        BaselineScorer::default()
            .score(&request)
            .causal_effects
            .into_iter()
            .map(|e| (e.fid, e.responsibility))
            .collect()
    }

    #[test]
    fn test_fields_in_view_are_not_scored() {
        let scores = score(DiffMode::Other);
        assert!(!scores.contains_key("region"));
        assert!(!scores.contains_key("revenue"));
    }

    #[test]
    fn test_aligned_field_outranks_unrelated_field() {
        let scores = score(DiffMode::Other);
        assert_eq!(scores["channel"], 1.0);
        assert_eq!(scores["discount"], 0.0);
    }

    #[test]
    fn test_full_mode_compares_against_all_rows() {
        let scores = score(DiffMode::Full);
        assert_eq!(scores["channel"], 0.5);
    }

    #[test]
    fn test_quantitative_shift_is_bounded() {
        assert_eq!(standardized_mean_difference(&[5.0, 5.0], &[900.0]), 1.0);
        assert_eq!(standardized_mean_difference(&[1.0, 3.0], &[1.0, 3.0]), 0.0);

        // Means 0 and 1 with unit spread.
        let shift = standardized_mean_difference(&[-1.0, 1.0], &[0.0, 2.0]);
        assert!((shift - 0.5).abs() < 1e-12);
        assert!(standardized_mean_difference(&[0.0, 1.0], &[1e6, 1e6 + 1.0]) < 1.0);
    }

    #[test]
    fn test_field_without_values_scores_nan() {
        assert!(score(DiffMode::Other)["note"].is_nan());
    }
}
