//! Fitted forest plus what was learned while fitting it.

use crate::forest::RandomForest;
use crate::importance::RankedFeature;
use crate::oob::OobScore;
use crate::split::SplitCriterion;

/// Hyperparameters and data shape a forest was fitted with.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct TrainingMetadata {
    pub n_trees: usize,
    pub criterion: SplitCriterion,
    pub min_samples_leaf: usize,
    pub n_features: usize,
    pub n_classes: usize,
    pub n_samples: usize,
    /// Features tried per split after resolving `MaxFeatures`.
    pub max_features_resolved: usize,
    pub seed: u64,
}

#[derive(Debug)]
pub struct RandomForestResult {
    forest: RandomForest,
    importances: Vec<RankedFeature>,
    oob_score: Option<OobScore>,
    metadata: TrainingMetadata,
}

impl RandomForestResult {
    pub(crate) fn new(
        forest: RandomForest,
        importances: Vec<RankedFeature>,
        oob_score: Option<OobScore>,
        metadata: TrainingMetadata,
    ) -> Self {
        Self {
            forest,
            importances,
            oob_score,
            metadata,
        }
    }

    #[must_use]
    pub fn forest(&self) -> &RandomForest {
        &self.forest
    }

    #[must_use]
    pub fn into_forest(self) -> RandomForest {
        self.forest
    }

    /// Mean-decrease-in-impurity importances, most important first.
    #[must_use]
    pub fn importances(&self) -> &[RankedFeature] {
        &self.importances
    }

    /// The highest-ranked feature, if the forest has any features.
    #[must_use]
    pub fn top_feature(&self) -> Option<&RankedFeature> {
        self.importances.first()
    }

    #[must_use]
    pub fn oob_score(&self) -> Option<&OobScore> {
        self.oob_score.as_ref()
    }

    /// Out-of-bag accuracy, `None` unless OOB evaluation was enabled.
    #[must_use]
    pub fn oob_accuracy(&self) -> Option<f64> {
        self.oob_score.as_ref().map(|s| s.accuracy)
    }

    #[must_use]
    pub fn metadata(&self) -> &TrainingMetadata {
        &self.metadata
    }
}
