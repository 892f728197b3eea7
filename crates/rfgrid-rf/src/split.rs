use std::fmt;
use std::str::FromStr;

use rand::Rng;

use crate::error::RfError;
use crate::node::{FeatureIndex, Impurity};

/// Criterion for measuring the quality of a split.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    serde::Serialize, serde::Deserialize,
)]
pub enum SplitCriterion {
    /// Gini impurity decrease, impurity `1 - Σ(p_i²)`.
    Gini,
    /// Distance of the split's one-vs-rest AUC from 0.5.
    #[serde(rename = "DistAUC")]
    DistAuc,
    /// Information gain, impurity `-Σ(p_i · log2(p_i))`.
    InfGain,
}

impl SplitCriterion {
    /// All criteria in their canonical order.
    pub const ALL: [SplitCriterion; 3] = [Self::Gini, Self::DistAuc, Self::InfGain];

    /// Return the display name (`Gini`, `DistAUC`, `InfGain`).
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            SplitCriterion::Gini => "Gini",
            SplitCriterion::DistAuc => "DistAUC",
            SplitCriterion::InfGain => "InfGain",
        }
    }

    /// Compute the impurity of a node from its class counts.
    ///
    /// Returns [`Impurity::new(0.0)`] when `n_samples` is zero (pure node).
    ///
    /// `Gini` and `DistAuc` report Gini impurity; `DistAuc` has no node-level
    /// impurity of its own and only uses this value to detect pure nodes.
    /// `InfGain` reports entropy in bits, summed only over classes where `p_i > 0`.
    #[must_use]
    pub fn impurity(&self, class_counts: &[usize], n_samples: usize) -> Impurity {
        if n_samples == 0 {
            return Impurity::new(0.0);
        }
        let n = n_samples as f64;
        let value = match self {
            SplitCriterion::Gini | SplitCriterion::DistAuc => {
                let sum_sq: f64 = class_counts
                    .iter()
                    .map(|&c| {
                        let p = c as f64 / n;
                        p * p
                    })
                    .sum();
                1.0 - sum_sq
            }
            SplitCriterion::InfGain => {
                -class_counts
                    .iter()
                    .filter(|&&c| c > 0)
                    .map(|&c| {
                        let p = c as f64 / n;
                        p * p.log2()
                    })
                    .sum::<f64>()
            }
        };
        Impurity::new(value)
    }

    /// Score a candidate split; larger is better.
    ///
    /// For `Gini` and `InfGain` this is the sample-weighted impurity decrease
    /// `n·I(parent) - n_left·I(left) - n_right·I(right)`. For `DistAuc` it is
    /// `n · dist_auc`, so both kinds scale with node size and can feed the
    /// mean-decrease-in-impurity importances.
    #[must_use]
    pub fn gain(
        &self,
        parent_counts: &[usize],
        left_counts: &[usize],
        right_counts: &[usize],
        n_left: usize,
        n_right: usize,
    ) -> f64 {
        let n_samples = n_left + n_right;
        match self {
            SplitCriterion::Gini | SplitCriterion::InfGain => {
                let parent = self.impurity(parent_counts, n_samples);
                let left = self.impurity(left_counts, n_left);
                let right = self.impurity(right_counts, n_right);
                (n_samples as f64) * parent.value()
                    - (n_left as f64) * left.value()
                    - (n_right as f64) * right.value()
            }
            SplitCriterion::DistAuc => {
                (n_samples as f64)
                    * dist_auc(parent_counts, left_counts, right_counts, n_left, n_right)
            }
        }
    }
}

/// Prevalence-weighted `|AUC - 0.5|` of a binary split, one-vs-rest per class.
///
/// The split is read as a classifier that scores "went right" above "went
/// left"; ties within a child count half. Classes absent from the node, or
/// filling it entirely, carry no ranking information and are skipped.
fn dist_auc(
    parent_counts: &[usize],
    left_counts: &[usize],
    right_counts: &[usize],
    n_left: usize,
    n_right: usize,
) -> f64 {
    let n_samples = n_left + n_right;
    if n_samples == 0 {
        return 0.0;
    }
    let mut weighted = 0.0;
    for (class, &pos) in parent_counts.iter().enumerate() {
        let neg = n_samples - pos;
        if pos == 0 || neg == 0 {
            continue;
        }
        let right_pos = right_counts[class] as f64;
        let left_pos = left_counts[class] as f64;
        let right_neg = (n_right - right_counts[class]) as f64;
        let left_neg = (n_left - left_counts[class]) as f64;
        let auc = (right_pos * left_neg + 0.5 * (right_pos * right_neg + left_pos * left_neg))
            / (pos as f64 * neg as f64);
        weighted += (pos as f64 / n_samples as f64) * (auc - 0.5).abs();
    }
    weighted
}

impl fmt::Display for SplitCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SplitCriterion {
    type Err = RfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gini" => Ok(SplitCriterion::Gini),
            "distauc" | "dist-auc" | "dist_auc" | "auc" => Ok(SplitCriterion::DistAuc),
            "infgain" | "inf-gain" | "inf_gain" | "entropy" => Ok(SplitCriterion::InfGain),
            _ => Err(RfError::UnknownCriterion { name: s.to_string() }),
        }
    }
}

/// Result of finding the best split for a node.
#[derive(Debug, Clone)]
pub(crate) struct SplitResult {
    /// Feature used for the split.
    pub(crate) feature: FeatureIndex,
    /// Threshold value.
    pub(crate) threshold: f64,
    /// Criterion gain of this split (see [`SplitCriterion::gain`]).
    pub(crate) gain: f64,
    /// Sample indices going to the left child.
    pub(crate) left_indices: Vec<usize>,
    /// Sample indices going to the right child.
    pub(crate) right_indices: Vec<usize>,
}

/// Find the best split among a random subset of features.
///
/// For each of `max_features` randomly chosen features, sorts the
/// `(value, label)` pairs, scans left-to-right with incremental
/// class count updates, and tracks the globally best split by
/// criterion gain.
///
/// Returns `None` when no valid split exists (all values identical,
/// or split would violate `min_samples_leaf`).
///
/// # Column-major layout
///
/// `features` is column-major: `features[feature_idx][sample_idx]`.
/// Each inner `Vec` contains all sample values for one feature column.
/// `sample_indices` are indices into these inner Vecs.
#[allow(clippy::too_many_arguments)]
pub(crate) fn find_best_split(
    features: &[Vec<f64>],
    labels: &[usize],
    sample_indices: &[usize],
    n_classes: usize,
    criterion: &SplitCriterion,
    max_features: usize,
    min_samples_leaf: usize,
    rng: &mut impl Rng,
) -> Option<SplitResult> {
    let n_features = features.len();
    let n_samples = sample_indices.len();

    if n_samples == 0 || n_features == 0 {
        return None;
    }

    let mut parent_counts = vec![0usize; n_classes];
    for &si in sample_indices {
        parent_counts[labels[si]] += 1;
    }

    // Partial Fisher-Yates: shuffle only the first `max_features` positions.
    let mut feature_order: Vec<usize> = (0..n_features).collect();
    let take = max_features.min(n_features);
    for i in 0..take {
        let j = rng.gen_range(i..n_features);
        feature_order.swap(i, j);
    }
    let selected_features = &feature_order[..take];

    let mut best_gain = f64::NEG_INFINITY;
    let mut best: Option<(FeatureIndex, f64)> = None;

    for &feat_idx in selected_features {
        let feat_col = &features[feat_idx];

        let mut sorted: Vec<(f64, usize)> = sample_indices
            .iter()
            .map(|&si| (feat_col[si], si))
            .collect();
        sorted.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));

        // Incremental scan: left grows from empty, right shrinks from full.
        let mut left_counts = vec![0usize; n_classes];
        let mut right_counts = parent_counts.clone();

        for i in 0..(n_samples - 1) {
            let (val_i, si) = sorted[i];
            let class_i = labels[si];

            left_counts[class_i] += 1;
            right_counts[class_i] -= 1;

            let n_left = i + 1;
            let n_right = n_samples - n_left;

            // No boundary between equal values.
            let val_next = sorted[i + 1].0;
            if val_i == val_next {
                continue;
            }

            if n_left < min_samples_leaf || n_right < min_samples_leaf {
                continue;
            }

            let gain = criterion.gain(&parent_counts, &left_counts, &right_counts, n_left, n_right);

            if gain > best_gain {
                best_gain = gain;
                let threshold = (val_i + val_next) / 2.0;
                best = Some((FeatureIndex::new(feat_idx), threshold));
            }
        }
    }

    let (best_feature, threshold) = best?;

    let feat_col = &features[best_feature.index()];
    let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = sample_indices
        .iter()
        .copied()
        .partition(|&si| feat_col[si] <= threshold);

    Some(SplitResult {
        feature: best_feature,
        threshold,
        gain: best_gain,
        left_indices,
        right_indices,
    })
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::{SplitCriterion, dist_auc, find_best_split};

    #[test]
    fn gini_pure() {
        let imp = SplitCriterion::Gini.impurity(&[10, 0], 10);
        assert!((imp.value() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn gini_binary_balanced() {
        let imp = SplitCriterion::Gini.impurity(&[5, 5], 10);
        assert!((imp.value() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn infgain_binary_balanced_is_one_bit() {
        let imp = SplitCriterion::InfGain.impurity(&[5, 5], 10);
        assert!((imp.value() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn infgain_pure() {
        let imp = SplitCriterion::InfGain.impurity(&[0, 7], 7);
        assert!(imp.value().abs() < f64::EPSILON);
    }

    #[test]
    fn dist_auc_perfect_split_is_half() {
        // 4 died left, 6 survived right.
        let d = dist_auc(&[4, 6], &[4, 0], &[0, 6], 4, 6);
        assert!((d - 0.5).abs() < 1e-12, "dist_auc = {d}");
    }

    #[test]
    fn dist_auc_uninformative_split_is_zero() {
        // Both children have the parent's 50/50 mix.
        let d = dist_auc(&[4, 4], &[2, 2], &[2, 2], 4, 4);
        assert!(d.abs() < 1e-12, "dist_auc = {d}");
    }

    #[test]
    fn dist_auc_is_orientation_free() {
        let a = dist_auc(&[5, 5], &[4, 1], &[1, 4], 5, 5);
        let b = dist_auc(&[5, 5], &[1, 4], &[4, 1], 5, 5);
        assert!((a - b).abs() < 1e-12);
        assert!(a > 0.0);
    }

    #[test]
    fn gain_prefers_cleaner_split_for_every_criterion() {
        for criterion in SplitCriterion::ALL {
            let clean = criterion.gain(&[5, 5], &[5, 0], &[0, 5], 5, 5);
            let noisy = criterion.gain(&[5, 5], &[3, 2], &[2, 3], 5, 5);
            assert!(clean > noisy, "{criterion}: clean {clean} <= noisy {noisy}");
        }
    }

    #[test]
    fn parse_and_display_names() {
        assert_eq!("gini".parse::<SplitCriterion>().unwrap(), SplitCriterion::Gini);
        assert_eq!("DistAUC".parse::<SplitCriterion>().unwrap(), SplitCriterion::DistAuc);
        assert_eq!("infgain".parse::<SplitCriterion>().unwrap(), SplitCriterion::InfGain);
        assert!("hellinger".parse::<SplitCriterion>().is_err());
        assert_eq!(SplitCriterion::DistAuc.to_string(), "DistAUC");
    }

    #[test]
    fn separable_data_finds_correct_split() {
        let features = vec![vec![1.0, 2.0, 3.0, 10.0, 11.0, 12.0]];
        let labels = vec![0, 0, 0, 1, 1, 1];
        let sample_indices: Vec<usize> = (0..6).collect();

        for criterion in SplitCriterion::ALL {
            let mut rng = ChaCha8Rng::seed_from_u64(42);
            let split = find_best_split(
                &features,
                &labels,
                &sample_indices,
                2,
                &criterion,
                1,
                1,
                &mut rng,
            )
            .expect("should find a split");
            assert_eq!(split.feature.index(), 0);
            assert!(split.threshold > 3.0 && split.threshold < 10.0);
            assert_eq!(split.left_indices, vec![0, 1, 2]);
            assert_eq!(split.right_indices, vec![3, 4, 5]);
        }
    }

    #[test]
    fn constant_feature_returns_none() {
        let features = vec![vec![5.0, 5.0, 5.0, 5.0]];
        let labels = vec![0, 0, 1, 1];
        let sample_indices: Vec<usize> = (0..4).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let result = find_best_split(
            &features,
            &labels,
            &sample_indices,
            2,
            &SplitCriterion::Gini,
            1,
            1,
            &mut rng,
        );

        assert!(result.is_none());
    }

    #[test]
    fn min_samples_leaf_enforced() {
        // Each child would hold 1 sample, below the minimum of 2.
        let features = vec![vec![1.0, 10.0]];
        let labels = vec![0, 1];
        let sample_indices: Vec<usize> = (0..2).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let result = find_best_split(
            &features,
            &labels,
            &sample_indices,
            2,
            &SplitCriterion::DistAuc,
            1,
            2,
            &mut rng,
        );

        assert!(result.is_none());
    }
}
