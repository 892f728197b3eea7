//! Ordering of evaluated configurations.

use std::cmp::Ordering;

use crate::evaluate::EvaluationResult;

/// Ranking key: accuracy descending, then fewer trees, then smaller leaves.
fn rank_order(a: &EvaluationResult, b: &EvaluationResult) -> Ordering {
    b.accuracy()
        .total_cmp(&a.accuracy())
        .then(a.config.n_trees.cmp(&b.config.n_trees))
        .then(a.config.min_leaf_size.cmp(&b.config.min_leaf_size))
}

/// All evaluation results, best first.
///
/// Rows equal on the whole key keep their evaluation order.
#[derive(Debug, Clone, Default, serde::Serialize)]
#[serde(transparent)]
pub struct ResultTable {
    rows: Vec<EvaluationResult>,
}

impl ResultTable {
    /// Sort `results` by the ranking key with a stable sort.
    #[must_use]
    pub fn rank(mut results: Vec<EvaluationResult>) -> Self {
        results.sort_by(rank_order);
        Self { rows: results }
    }

    /// The top-ranked result, if any.
    #[must_use]
    pub fn best(&self) -> Option<&EvaluationResult> {
        self.rows.first()
    }

    /// The first `n` rows, or all rows when fewer exist.
    #[must_use]
    pub fn top(&self, n: usize) -> &[EvaluationResult] {
        &self.rows[..n.min(self.rows.len())]
    }

    /// Highest accuracy in the table.
    #[must_use]
    pub fn max_accuracy(&self) -> Option<f64> {
        self.best().map(EvaluationResult::accuracy)
    }

    /// Iterate rows in rank order.
    pub fn iter(&self) -> std::slice::Iter<'_, EvaluationResult> {
        self.rows.iter()
    }

    /// All rows in rank order.
    #[must_use]
    pub fn as_slice(&self) -> &[EvaluationResult] {
        &self.rows
    }

    /// Number of evaluated configurations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether no configuration was evaluated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl<'a> IntoIterator for &'a ResultTable {
    type Item = &'a EvaluationResult;
    type IntoIter = std::slice::Iter<'a, EvaluationResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridConfiguration;
    use rfgrid_rf::{BinaryMetrics, ConfusionMatrix, SplitCriterion};

    /// A result whose accuracy is `correct / 10`.
    fn result(
        criterion: SplitCriterion,
        min_leaf_size: usize,
        n_trees: usize,
        correct: usize,
    ) -> EvaluationResult {
        let truth: Vec<usize> = (0..10).map(|i| i % 2).collect();
        let predicted: Vec<usize> = truth
            .iter()
            .enumerate()
            .map(|(i, &t)| if i < correct { t } else { 1 - t })
            .collect();
        let confusion = ConfusionMatrix::from_labels(&truth, &predicted, 2).unwrap();
        EvaluationResult {
            config: GridConfiguration {
                min_leaf_size,
                n_trees,
                criterion,
            },
            max_features: 3,
            metrics: BinaryMetrics::from_confusion(&confusion, 0).unwrap(),
            oob_accuracy: None,
            confusion,
        }
    }

    #[test]
    fn orders_by_accuracy_then_trees_then_leaf() {
        use SplitCriterion::*;
        let table = ResultTable::rank(vec![
            result(Gini, 1, 60, 7),
            result(InfGain, 5, 10, 9),
            result(DistAuc, 3, 10, 9),
            result(Gini, 1, 35, 9),
        ]);
        let labels: Vec<String> = table.iter().map(|r| r.config.label()).collect();
        assert_eq!(labels, ["DistAUC-3-10", "InfGain-5-10", "Gini-1-35", "Gini-1-60"]);
        assert_eq!(table.max_accuracy(), Some(0.9));
    }

    #[test]
    fn full_ties_keep_input_order() {
        use SplitCriterion::*;
        let table = ResultTable::rank(vec![
            result(InfGain, 3, 10, 8),
            result(Gini, 3, 10, 8),
            result(DistAuc, 3, 10, 8),
        ]);
        let order: Vec<SplitCriterion> = table.iter().map(|r| r.config.criterion).collect();
        assert_eq!(order, [InfGain, Gini, DistAuc]);
    }

    #[test]
    fn top_is_clamped() {
        let table = ResultTable::rank(vec![result(SplitCriterion::Gini, 1, 10, 5)]);
        assert_eq!(table.top(10).len(), 1);
        assert!(ResultTable::default().best().is_none());
    }
}
