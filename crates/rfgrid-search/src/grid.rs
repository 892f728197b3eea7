//! Hyperparameter grid enumeration.

use std::fmt;

use rfgrid_rf::SplitCriterion;

use crate::error::SearchError;

/// Leaf sizes searched when none are given.
pub const DEFAULT_LEAF_SIZES: [usize; 3] = [1, 3, 5];
/// Ensemble sizes searched when none are given.
pub const DEFAULT_TREE_COUNTS: [usize; 5] = [10, 35, 60, 85, 110];

/// One point of the search grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct GridConfiguration {
    /// Minimum number of training samples per leaf.
    pub min_leaf_size: usize,
    /// Number of trees in the ensemble.
    pub n_trees: usize,
    /// Node splitting criterion.
    pub criterion: SplitCriterion,
}

impl GridConfiguration {
    /// Composite identifier `"{criterion}-{leaf}-{trees}"`, e.g. `Gini-3-60`.
    #[must_use]
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for GridConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.criterion, self.min_leaf_size, self.n_trees)
    }
}

/// Keep the first occurrence of each value, preserving order.
fn dedup_stable<T: PartialEq + Copy>(values: &[T]) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(values.len());
    for &v in values {
        if !out.contains(&v) {
            out.push(v);
        }
    }
    out
}

/// Validated value sets for the three searched hyperparameters.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ParamGrid {
    leaf_sizes: Vec<usize>,
    tree_counts: Vec<usize>,
    criteria: Vec<SplitCriterion>,
}

impl ParamGrid {
    /// Build a grid from the three value sets; duplicates are dropped.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SearchError::EmptyValueSet`] | Any value set is empty |
    /// | [`SearchError::InvalidLeafSize`] | A leaf size is zero |
    /// | [`SearchError::InvalidTreeCount`] | A tree count is zero |
    pub fn new(
        leaf_sizes: &[usize],
        tree_counts: &[usize],
        criteria: &[SplitCriterion],
    ) -> Result<Self, SearchError> {
        if leaf_sizes.is_empty() {
            return Err(SearchError::EmptyValueSet {
                parameter: "leaf sizes",
            });
        }
        if tree_counts.is_empty() {
            return Err(SearchError::EmptyValueSet {
                parameter: "tree counts",
            });
        }
        if criteria.is_empty() {
            return Err(SearchError::EmptyValueSet {
                parameter: "criteria",
            });
        }
        if leaf_sizes.contains(&0) {
            return Err(SearchError::InvalidLeafSize { leaf_size: 0 });
        }
        if tree_counts.contains(&0) {
            return Err(SearchError::InvalidTreeCount { n_trees: 0 });
        }

        Ok(Self {
            leaf_sizes: dedup_stable(leaf_sizes),
            tree_counts: dedup_stable(tree_counts),
            criteria: dedup_stable(criteria),
        })
    }

    /// The deduplicated leaf sizes, in input order.
    #[must_use]
    pub fn leaf_sizes(&self) -> &[usize] {
        &self.leaf_sizes
    }

    /// The deduplicated tree counts, in input order.
    #[must_use]
    pub fn tree_counts(&self) -> &[usize] {
        &self.tree_counts
    }

    /// The deduplicated criteria, in input order.
    #[must_use]
    pub fn criteria(&self) -> &[SplitCriterion] {
        &self.criteria
    }

    /// Number of configurations in the Cartesian product.
    #[must_use]
    pub fn len(&self) -> usize {
        self.leaf_sizes.len() * self.tree_counts.len() * self.criteria.len()
    }

    /// Always false for a validated grid.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Enumerate the Cartesian product: criterion outermost, then leaf size,
    /// then tree count.
    #[must_use]
    pub fn configurations(&self) -> Vec<GridConfiguration> {
        self.criteria
            .iter()
            .flat_map(|&criterion| {
                self.leaf_sizes.iter().flat_map(move |&min_leaf_size| {
                    self.tree_counts.iter().map(move |&n_trees| GridConfiguration {
                        min_leaf_size,
                        n_trees,
                        criterion,
                    })
                })
            })
            .collect()
    }
}

impl Default for ParamGrid {
    fn default() -> Self {
        Self {
            leaf_sizes: DEFAULT_LEAF_SIZES.to_vec(),
            tree_counts: DEFAULT_TREE_COUNTS.to_vec(),
            criteria: SplitCriterion::ALL.to_vec(),
        }
    }
}
