//! Out-of-bag (OOB) evaluation for Random Forest.

use crate::confusion::ConfusionMatrix;
use crate::error::RfError;
use crate::tree::DecisionTree;

/// Out-of-bag evaluation result.
#[derive(Debug, Clone)]
pub struct OobScore {
    /// OOB accuracy (fraction of correctly predicted OOB samples).
    pub accuracy: f64,
    /// Confusion matrix over the OOB-evaluated samples.
    pub confusion: ConfusionMatrix,
    /// Number of samples that had at least one OOB tree.
    pub n_oob_samples: usize,
}

/// Majority-vote each sample over the trees that did not see it in their bootstrap.
///
/// Samples that landed in every bootstrap are skipped; when that leaves no
/// sample at all the score is `None`. Vote ties go to the lowest class index.
pub(crate) fn compute_oob(
    trees: &[DecisionTree],
    features: &[Vec<f64>],
    labels: &[usize],
    n_classes: usize,
    oob_indices_per_tree: &[Vec<usize>],
) -> Result<Option<OobScore>, RfError> {
    let mut votes: Vec<Vec<usize>> = vec![vec![0; n_classes]; features.len()];
    for (tree, oob_indices) in trees.iter().zip(oob_indices_per_tree) {
        for &sample_idx in oob_indices {
            votes[sample_idx][tree.predict(&features[sample_idx])?] += 1;
        }
    }

    let mut truth = Vec::new();
    let mut predicted = Vec::new();
    for (sample_idx, sample_votes) in votes.iter().enumerate() {
        if sample_votes.iter().all(|&v| v == 0) {
            continue;
        }
        let mut best = 0;
        for (class, &v) in sample_votes.iter().enumerate() {
            if v > sample_votes[best] {
                best = class;
            }
        }
        truth.push(labels[sample_idx]);
        predicted.push(best);
    }

    if truth.is_empty() {
        return Ok(None);
    }

    let confusion = ConfusionMatrix::from_labels(&truth, &predicted, n_classes)?;
    Ok(Some(OobScore {
        accuracy: confusion.accuracy(),
        n_oob_samples: truth.len(),
        confusion,
    }))
}
