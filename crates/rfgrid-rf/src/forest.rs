//! Random Forest training with parallel tree construction.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use tracing::{debug, instrument};

use crate::config::{OobMode, RandomForestConfig};
use crate::error::RfError;
use crate::importance::aggregate_importances;
use crate::oob::compute_oob;
use crate::result::{RandomForestResult, TrainingMetadata};
use crate::tree::{DecisionTree, DecisionTreeConfig, validate_training_data};

/// A fitted Random Forest ensemble.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RandomForest {
    pub(crate) trees: Vec<DecisionTree>,
    pub(crate) n_features: usize,
    pub(crate) n_classes: usize,
    pub(crate) feature_names: Vec<String>,
}

/// Draw `draw_count` indices with replacement; return them with the out-of-bag rest.
fn bootstrap_sample(
    n_samples: usize,
    draw_count: usize,
    rng: &mut impl Rng,
) -> (Vec<usize>, Vec<usize>) {
    let mut in_bag = vec![false; n_samples];
    let bootstrap_indices: Vec<usize> = (0..draw_count)
        .map(|_| {
            let idx = rng.gen_range(0..n_samples);
            in_bag[idx] = true;
            idx
        })
        .collect();
    let oob_indices = (0..n_samples).filter(|&i| !in_bag[i]).collect();
    (bootstrap_indices, oob_indices)
}

/// Train the Random Forest ensemble.
#[instrument(
    skip_all,
    fields(
        n_trees = config.n_trees,
        criterion = %config.criterion,
        min_samples_leaf = config.min_samples_leaf,
        n_samples = features.len(),
    )
)]
pub(crate) fn train(
    config: &RandomForestConfig,
    features: &[Vec<f64>],
    labels: &[usize],
    feature_names: &[String],
) -> Result<RandomForestResult, RfError> {
    let n_features = validate_training_data(features, labels)?;
    let n_samples = features.len();
    let max_features_resolved = config.max_features.resolve(n_features)?;

    if config.bootstrap_fraction <= 0.0 || config.bootstrap_fraction > 1.0 {
        return Err(RfError::InvalidBootstrapFraction {
            fraction: config.bootstrap_fraction,
        });
    }
    if config.min_samples_leaf == 0 {
        return Err(RfError::InvalidMinSamplesLeaf { min_samples_leaf: 0 });
    }

    let n_classes = labels.iter().max().copied().unwrap_or(0) + 1;
    let draw_count = ((n_samples as f64) * config.bootstrap_fraction).ceil() as usize;

    debug!(
        n_features,
        n_classes,
        max_features = max_features_resolved,
        draw_count,
        "training random forest"
    );

    // Per-tree seeds come from one master stream so results do not depend
    // on how rayon schedules the trees.
    let mut master_rng = ChaCha8Rng::seed_from_u64(config.seed);
    let tree_seeds: Vec<u64> = (0..config.n_trees).map(|_| master_rng.r#gen()).collect();

    let tree_template = DecisionTreeConfig::new()
        .with_criterion(config.criterion)
        .with_max_depth(config.max_depth)
        .with_min_samples_split(config.min_samples_split)
        .with_min_samples_leaf(config.min_samples_leaf)
        .with_max_features(Some(max_features_resolved))
        .with_n_classes(Some(n_classes));

    let tree_results: Vec<(DecisionTree, Vec<usize>)> = tree_seeds
        .into_par_iter()
        .map(|seed| -> Result<(DecisionTree, Vec<usize>), RfError> {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let (bootstrap_indices, oob_indices) =
                bootstrap_sample(n_samples, draw_count, &mut rng);

            let boot_features: Vec<Vec<f64>> = bootstrap_indices
                .iter()
                .map(|&i| features[i].clone())
                .collect();
            let boot_labels: Vec<usize> = bootstrap_indices.iter().map(|&i| labels[i]).collect();

            let tree = tree_template
                .clone()
                .with_seed(rng.r#gen())
                .fit(&boot_features, &boot_labels)?;
            Ok((tree, oob_indices))
        })
        .collect::<Result<_, _>>()?;

    let (trees, oob_indices_per_tree): (Vec<DecisionTree>, Vec<Vec<usize>>) =
        tree_results.into_iter().unzip();

    let per_tree_importances: Vec<Vec<f64>> =
        trees.iter().map(DecisionTree::feature_importances).collect();
    let importances = aggregate_importances(&per_tree_importances, feature_names);

    let oob_score = match config.oob_mode {
        OobMode::Enabled => compute_oob(
            &trees,
            features,
            labels,
            n_classes,
            &oob_indices_per_tree,
        )?,
        OobMode::Disabled => None,
    };

    debug!(
        n_trees_trained = trees.len(),
        oob_accuracy = oob_score.as_ref().map(|s| s.accuracy),
        "random forest training complete"
    );

    let forest = RandomForest {
        trees,
        n_features,
        n_classes,
        feature_names: feature_names.to_vec(),
    };
    let metadata = TrainingMetadata {
        n_trees: config.n_trees,
        criterion: config.criterion,
        min_samples_leaf: config.min_samples_leaf,
        n_features,
        n_classes,
        n_samples,
        max_features_resolved,
        seed: config.seed,
    };

    Ok(RandomForestResult::new(forest, importances, oob_score, metadata))
}

#[cfg(test)]
mod tests {
    use crate::config::{MaxFeatures, OobMode, RandomForestConfig};
    use crate::split::SplitCriterion;

    /// Two-class data separable on `x`, with a noise column `y`.
    fn make_separable_data() -> (Vec<Vec<f64>>, Vec<usize>, Vec<String>) {
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for i in 0..30 {
            features.push(vec![i as f64 * 0.1, (i % 7) as f64]);
            labels.push(0);
        }
        for i in 0..30 {
            features.push(vec![10.0 + i as f64 * 0.1, (i % 5) as f64]);
            labels.push(1);
        }
        let names = vec!["x".to_string(), "y".to_string()];
        (features, labels, names)
    }

    fn training_accuracy(config: &RandomForestConfig) -> f64 {
        let (features, labels, names) = make_separable_data();
        let result = config.fit(&features, &labels, &names).unwrap();
        let predictions = result.forest().predict_batch(&features).unwrap();
        let correct = predictions
            .iter()
            .zip(&labels)
            .filter(|&(&p, &l)| p == l)
            .count();
        correct as f64 / labels.len() as f64
    }

    #[test]
    fn every_criterion_fits_separable_data() {
        for criterion in SplitCriterion::ALL {
            let config = RandomForestConfig::new(25)
                .unwrap()
                .with_criterion(criterion)
                .with_max_features(MaxFeatures::All);
            let accuracy = training_accuracy(&config);
            assert!(accuracy > 0.95, "{criterion}: accuracy = {accuracy}");
        }
    }

    #[test]
    fn large_leaf_size_still_trains() {
        let config = RandomForestConfig::new(10).unwrap().with_min_samples_leaf(5);
        assert!(training_accuracy(&config) > 0.9);
    }

    #[test]
    fn oob_score_computed() {
        let (features, labels, names) = make_separable_data();
        let config = RandomForestConfig::new(50)
            .unwrap()
            .with_oob_mode(OobMode::Enabled);
        let result = config.fit(&features, &labels, &names).unwrap();

        let oob = result.oob_score().expect("OOB should be computed");
        assert!(oob.accuracy > 0.8, "oob accuracy = {}", oob.accuracy);
        assert!(oob.n_oob_samples > 0);
    }

    #[test]
    fn oob_without_out_of_bag_samples_is_absent() {
        // A single record is drawn into every bootstrap.
        let result = RandomForestConfig::new(1)
            .unwrap()
            .with_oob_mode(OobMode::Enabled)
            .fit(&[vec![1.0, 2.0]], &[0], &["x".to_string(), "y".to_string()])
            .unwrap();
        assert!(result.oob_score().is_none());
        assert_eq!(result.oob_accuracy(), None);
    }

    #[test]
    fn feature_importances_sum_to_one() {
        let (features, labels, names) = make_separable_data();
        let result = RandomForestConfig::new(20)
            .unwrap()
            .fit(&features, &labels, &names)
            .unwrap();
        let total: f64 = result.importances().iter().map(|f| f.importance).sum();
        assert!((total - 1.0).abs() < 1e-10, "total = {total}");
        assert_eq!(result.importances()[0].name, "x");
    }

    #[test]
    fn deterministic_with_same_seed() {
        let (features, labels, names) = make_separable_data();
        let config = RandomForestConfig::new(10).unwrap().with_seed(99);
        let preds1 = config
            .fit(&features, &labels, &names)
            .unwrap()
            .forest()
            .predict_proba_batch(&features)
            .unwrap();
        let preds2 = config
            .fit(&features, &labels, &names)
            .unwrap()
            .forest()
            .predict_proba_batch(&features)
            .unwrap();
        for (a, b) in preds1.iter().zip(&preds2) {
            assert_eq!(a.as_slice(), b.as_slice());
        }
    }

    #[test]
    fn metadata_reports_resolved_max_features() {
        let (features, labels, names) = make_separable_data();
        let result = RandomForestConfig::new(3)
            .unwrap()
            .fit(&features, &labels, &names)
            .unwrap();
        let meta = result.metadata();
        assert_eq!(meta.n_trees, 3);
        assert_eq!(meta.n_classes, 2);
        assert_eq!(meta.n_samples, 60);
        assert_eq!(meta.max_features_resolved, 2);
        assert_eq!(meta.criterion, SplitCriterion::Gini);
        assert_eq!(meta.min_samples_leaf, 1);
        assert_eq!(meta.seed, 42);
        assert_eq!(result.oob_accuracy(), None);
        assert_eq!(result.top_feature().map(|f| f.name.as_str()), Some("x"));
    }

    #[test]
    fn invalid_bootstrap_fraction_error() {
        let (features, labels, names) = make_separable_data();
        let err = RandomForestConfig::new(5)
            .unwrap()
            .with_bootstrap_fraction(0.0)
            .fit(&features, &labels, &names)
            .unwrap_err();
        assert!(matches!(err, crate::RfError::InvalidBootstrapFraction { .. }));
    }

    #[test]
    fn zero_leaf_size_error() {
        let (features, labels, names) = make_separable_data();
        let err = RandomForestConfig::new(5)
            .unwrap()
            .with_min_samples_leaf(0)
            .fit(&features, &labels, &names)
            .unwrap_err();
        assert!(matches!(
            err,
            crate::RfError::InvalidMinSamplesLeaf { min_samples_leaf: 0 }
        ));
    }

    #[test]
    fn empty_dataset_error() {
        let config = RandomForestConfig::new(10).unwrap();
        let err = config.fit(&[], &[], &[]).unwrap_err();
        assert!(matches!(err, crate::RfError::EmptyDataset));
    }
}
