//! Feature importance aggregation across trees.

/// A ranked feature with name, importance score, and rank.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RankedFeature {
    /// Feature name.
    pub name: String,
    /// Normalized importance score (sums to 1.0 across all features).
    pub importance: f64,
    /// 1-based rank (1 = most important).
    pub rank: usize,
}

/// Sum per-tree importances, normalize to 1.0, and rank descending.
///
/// Equal importances keep column order.
pub(crate) fn aggregate_importances(
    per_tree: &[Vec<f64>],
    names: &[String],
) -> Vec<RankedFeature> {
    if per_tree.is_empty() || names.is_empty() {
        return vec![];
    }

    let mut totals = vec![0.0f64; names.len()];
    for tree_imp in per_tree {
        for (total, &val) in totals.iter_mut().zip(tree_imp) {
            *total += val;
        }
    }
    let sum: f64 = totals.iter().sum();
    if sum > 0.0 {
        totals.iter_mut().for_each(|v| *v /= sum);
    }

    let mut features: Vec<RankedFeature> = names
        .iter()
        .zip(totals)
        .map(|(name, importance)| RankedFeature {
            name: name.clone(),
            importance,
            rank: 0,
        })
        .collect();
    features.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    for (i, feat) in features.iter_mut().enumerate() {
        feat.rank = i + 1;
    }
    features
}

#[cfg(test)]
mod tests {
    use super::aggregate_importances;

    #[test]
    fn ranks_by_summed_importance() {
        let names = vec!["pclass".to_string(), "age".to_string(), "sex".to_string()];
        let per_tree = vec![vec![0.2, 0.3, 0.5], vec![0.1, 0.1, 0.8]];
        let ranked = aggregate_importances(&per_tree, &names);
        assert_eq!(ranked[0].name, "sex");
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[2].name, "pclass");
        let total: f64 = ranked.iter().map(|f| f.importance).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn all_zero_trees_stay_zero_in_column_order() {
        let names = vec!["a".to_string(), "b".to_string()];
        let ranked = aggregate_importances(&[vec![0.0, 0.0]], &names);
        assert_eq!(ranked[0].name, "a");
        assert_eq!(ranked[1].importance, 0.0);
    }

    #[test]
    fn no_trees_no_features() {
        assert!(aggregate_importances(&[], &["a".to_string()]).is_empty());
    }
}
