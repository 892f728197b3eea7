//! Train-and-score loop over the grid.

use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use rfgrid_rf::{
    BinaryMetrics, ConfusionMatrix, MaxFeatures, OobMode, RandomForestConfig,
};
use tracing::{debug, info, instrument};

use crate::error::SearchError;
use crate::grid::{GridConfiguration, ParamGrid};
use crate::ranking::ResultTable;

/// Number of label classes the evaluator scores.
const N_CLASSES: usize = 2;

/// Encoded train and test partitions shared by every configuration.
#[derive(Debug, Clone)]
pub struct TrainTestData {
    train_features: Vec<Vec<f64>>,
    train_labels: Vec<usize>,
    test_features: Vec<Vec<f64>>,
    test_labels: Vec<usize>,
    feature_names: Vec<String>,
}

impl TrainTestData {
    /// Bundle the two partitions.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::ShapeMismatch`] when a partition has a different
    /// number of feature rows and labels, and [`SearchError::EmptyPartition`]
    /// when either partition has no rows.
    pub fn new(
        train_features: Vec<Vec<f64>>,
        train_labels: Vec<usize>,
        test_features: Vec<Vec<f64>>,
        test_labels: Vec<usize>,
        feature_names: Vec<String>,
    ) -> Result<Self, SearchError> {
        let n_records = train_labels.len() + test_labels.len();
        for (side, rows, labels) in [
            ("train", train_features.len(), train_labels.len()),
            ("test", test_features.len(), test_labels.len()),
        ] {
            if rows != labels {
                return Err(SearchError::ShapeMismatch { side, rows, labels });
            }
            if rows == 0 {
                return Err(SearchError::EmptyPartition {
                    side,
                    n_records,
                    fraction: train_labels.len() as f64 / n_records.max(1) as f64,
                });
            }
        }
        Ok(Self {
            train_features,
            train_labels,
            test_features,
            test_labels,
            feature_names,
        })
    }

    /// Number of training records.
    #[must_use]
    pub fn n_train(&self) -> usize {
        self.train_labels.len()
    }

    /// Number of test records.
    #[must_use]
    pub fn n_test(&self) -> usize {
        self.test_labels.len()
    }

    /// Feature column names.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }
}

/// How the grid configurations are scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Execution {
    /// One configuration at a time, in grid order.
    #[default]
    Sequential,
    /// Configurations spread over the rayon pool.
    Parallel,
}

/// Scores of one trained configuration on the test partition.
#[derive(Debug, Clone, serde::Serialize)]
pub struct EvaluationResult {
    /// The hyperparameters that were trained.
    pub config: GridConfiguration,
    /// Features tried at each split, resolved from `MaxFeatures::Sqrt`.
    pub max_features: usize,
    /// Test-set statistics relative to the positive class.
    pub metrics: BinaryMetrics,
    /// Out-of-bag accuracy on the train partition; `None` when every train
    /// record was drawn into every bootstrap sample.
    pub oob_accuracy: Option<f64>,
    /// Test-set confusion matrix, rows true and columns predicted.
    pub confusion: ConfusionMatrix,
}

impl EvaluationResult {
    /// Test-set accuracy.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        self.metrics.accuracy
    }
}

/// Grid search over Random Forest hyperparameters.
///
/// Every configuration is trained with the same seed, so a result depends
/// only on its own configuration and never on evaluation order.
#[derive(Debug, Clone)]
pub struct GridSearch {
    grid: ParamGrid,
    seed: u64,
    positive_class: usize,
    execution: Execution,
}

impl GridSearch {
    /// Create a search over `grid` with seed 42, positive class 0, sequential.
    #[must_use]
    pub fn new(grid: ParamGrid) -> Self {
        Self {
            grid,
            seed: 42,
            positive_class: 0,
            execution: Execution::Sequential,
        }
    }

    /// Set the seed used to train every configuration.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the class index treated as positive by the binary metrics.
    #[must_use]
    pub fn with_positive_class(mut self, positive_class: usize) -> Self {
        self.positive_class = positive_class;
        self
    }

    /// Set how configurations are scheduled.
    #[must_use]
    pub fn with_execution(mut self, execution: Execution) -> Self {
        self.execution = execution;
        self
    }

    /// Return the grid being searched.
    #[must_use]
    pub fn grid(&self) -> &ParamGrid {
        &self.grid
    }

    /// Train one configuration and score it on the test partition.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Training`] or [`SearchError::Evaluation`] naming
    /// the configuration.
    #[instrument(skip_all, fields(config = %config))]
    pub fn evaluate(
        &self,
        config: &GridConfiguration,
        data: &TrainTestData,
    ) -> Result<EvaluationResult, SearchError> {
        let training = |source| SearchError::Training {
            config: config.label(),
            source,
        };
        let evaluation = |source| SearchError::Evaluation {
            config: config.label(),
            source,
        };

        let fitted = RandomForestConfig::new(config.n_trees)
            .map_err(training)?
            .with_min_samples_leaf(config.min_leaf_size)
            .with_criterion(config.criterion)
            .with_max_features(MaxFeatures::Sqrt)
            .with_bootstrap_fraction(1.0)
            .with_seed(self.seed)
            .with_oob_mode(OobMode::Enabled)
            .fit(&data.train_features, &data.train_labels, &data.feature_names)
            .map_err(training)?;

        let predictions = fitted
            .forest()
            .predict_batch(&data.test_features)
            .map_err(evaluation)?;
        let confusion = ConfusionMatrix::from_labels(&data.test_labels, &predictions, N_CLASSES)
            .map_err(evaluation)?;
        let metrics =
            BinaryMetrics::from_confusion(&confusion, self.positive_class).map_err(evaluation)?;
        let oob_accuracy = fitted.oob_accuracy();

        debug!(
            accuracy = metrics.accuracy,
            ?oob_accuracy,
            top_feature = fitted.top_feature().map(|f| f.name.as_str()),
            "configuration scored"
        );
        Ok(EvaluationResult {
            config: *config,
            max_features: fitted.metadata().max_features_resolved,
            metrics,
            oob_accuracy,
            confusion,
        })
    }

    /// Evaluate every configuration and return the ranked table.
    ///
    /// The first failing configuration aborts the search; no row is skipped.
    ///
    /// # Errors
    ///
    /// Propagates the [`SearchError`] of the failing configuration.
    #[instrument(
        skip_all,
        fields(
            n_configs = self.grid.len(),
            seed = self.seed,
            execution = ?self.execution,
            n_train = data.n_train(),
            n_test = data.n_test(),
        )
    )]
    pub fn run(&self, data: &TrainTestData) -> Result<ResultTable, SearchError> {
        let configs = self.grid.configurations();
        info!(n_configs = configs.len(), "grid search started");

        let results: Vec<EvaluationResult> = match self.execution {
            Execution::Sequential => configs
                .iter()
                .map(|config| self.evaluate(config, data))
                .collect::<Result<_, _>>()?,
            Execution::Parallel => configs
                .par_iter()
                .map(|config| self.evaluate(config, data))
                .collect::<Result<_, _>>()?,
        };

        let table = ResultTable::rank(results);
        if let Some(best) = table.best() {
            info!(best = %best.config, accuracy = best.accuracy(), "grid search finished");
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rfgrid_rf::{RfError, SplitCriterion};

    fn toy_data() -> TrainTestData {
        let row = |i: usize| vec![(i % 3) as f64 + 1.0, ((i / 2) % 40) as f64, (i % 2) as f64];
        let label = |i: usize| usize::from(i % 2 == 0);
        let train: Vec<usize> = (0..80).collect();
        let test: Vec<usize> = (80..110).collect();
        TrainTestData::new(
            train.iter().map(|&i| row(i)).collect(),
            train.iter().map(|&i| label(i)).collect(),
            test.iter().map(|&i| row(i)).collect(),
            test.iter().map(|&i| label(i)).collect(),
            vec!["pclass".into(), "age".into(), "sex".into()],
        )
        .unwrap()
    }

    #[test]
    fn evaluates_every_configuration() {
        let grid = ParamGrid::new(&[1, 5], &[3, 7], &SplitCriterion::ALL).unwrap();
        let table = GridSearch::new(grid).run(&toy_data()).unwrap();
        assert_eq!(table.len(), 12);
        // Column 2 determines the label exactly.
        let best = table.best().unwrap();
        assert!(best.accuracy() > 0.9, "best accuracy {}", best.accuracy());
        assert!(best.oob_accuracy.is_some());
    }

    #[test]
    fn missing_oob_samples_do_not_abort_the_search() {
        // One train record is drawn into the only tree's bootstrap.
        let data = TrainTestData::new(
            vec![vec![1.0, 30.0, 0.0]],
            vec![0],
            vec![vec![1.0, 30.0, 0.0], vec![3.0, 20.0, 1.0]],
            vec![0, 1],
            vec!["pclass".into(), "age".into(), "sex".into()],
        )
        .unwrap();
        let grid = ParamGrid::new(&[1], &[1], &[SplitCriterion::Gini]).unwrap();
        let table = GridSearch::new(grid).run(&data).unwrap();
        let row = table.best().unwrap();
        assert_eq!(row.oob_accuracy, None);
        assert_eq!(row.confusion.total(), 2);
        assert_eq!(row.max_features, 2);
    }

    #[test]
    fn parallel_matches_sequential() {
        let grid = ParamGrid::new(&[1, 3], &[5, 9], &SplitCriterion::ALL).unwrap();
        let data = toy_data();
        let seq = GridSearch::new(grid.clone()).run(&data).unwrap();
        let par = GridSearch::new(grid)
            .with_execution(Execution::Parallel)
            .run(&data)
            .unwrap();
        let ids = |t: &ResultTable| t.iter().map(|r| (r.config, r.metrics.clone())).collect::<Vec<_>>();
        assert_eq!(ids(&seq), ids(&par));
    }

    #[test]
    fn result_does_not_depend_on_grid_contents() {
        let data = toy_data();
        let config = GridConfiguration {
            min_leaf_size: 3,
            n_trees: 5,
            criterion: SplitCriterion::InfGain,
        };
        let small = GridSearch::new(ParamGrid::new(&[3], &[5], &[SplitCriterion::InfGain]).unwrap());
        let large = GridSearch::new(ParamGrid::default());
        assert_eq!(
            small.evaluate(&config, &data).unwrap().metrics,
            large.evaluate(&config, &data).unwrap().metrics
        );
    }

    #[test]
    fn bad_positive_class_names_the_configuration() {
        let grid = ParamGrid::new(&[1], &[3], &[SplitCriterion::Gini]).unwrap();
        let err = GridSearch::new(grid)
            .with_positive_class(4)
            .run(&toy_data())
            .unwrap_err();
        match err {
            SearchError::Evaluation { config, source } => {
                assert_eq!(config, "Gini-1-3");
                assert!(matches!(source, RfError::LabelOutOfRange { label: 4, .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let err = TrainTestData::new(vec![vec![1.0]], vec![0, 1], vec![vec![1.0]], vec![0], vec![])
            .unwrap_err();
        assert!(matches!(
            err,
            SearchError::ShapeMismatch { side: "train", rows: 1, labels: 2 }
        ));
    }
}
