use rfgrid_rf::RfError;

/// Errors from partitioning, grid enumeration, and configuration evaluation.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Returned when there are no labels to partition.
    #[error("cannot partition an empty dataset")]
    EmptyDataset,

    /// Returned when the train fraction is not strictly between 0 and 1.
    #[error("split fraction must be in (0.0, 1.0), got {fraction}")]
    InvalidSplitFraction {
        /// The invalid fraction.
        fraction: f64,
    },

    /// Returned when the split leaves the train or test side with no records.
    #[error("{side} partition is empty ({n_records} records at fraction {fraction})")]
    EmptyPartition {
        /// `"train"` or `"test"`.
        side: &'static str,
        /// Total number of records.
        n_records: usize,
        /// The requested train fraction.
        fraction: f64,
    },

    /// Returned when a hyperparameter value set has no values.
    #[error("no values given for {parameter}")]
    EmptyValueSet {
        /// Name of the hyperparameter.
        parameter: &'static str,
    },

    /// Returned when a minimum leaf size of zero is requested.
    #[error("minimum leaf size must be at least 1, got {leaf_size}")]
    InvalidLeafSize {
        /// The invalid value.
        leaf_size: usize,
    },

    /// Returned when an ensemble size of zero is requested.
    #[error("ensemble size must be at least 1, got {n_trees}")]
    InvalidTreeCount {
        /// The invalid value.
        n_trees: usize,
    },

    /// Returned when train and test matrices disagree with their labels.
    #[error("{side} partition has {rows} feature rows but {labels} labels")]
    ShapeMismatch {
        /// `"train"` or `"test"`.
        side: &'static str,
        /// Number of feature rows.
        rows: usize,
        /// Number of labels.
        labels: usize,
    },

    /// Returned when training a configuration fails; the search is aborted.
    #[error("training failed for configuration {config}")]
    Training {
        /// Composite identifier of the failing configuration.
        config: String,
        /// The underlying forest error.
        #[source]
        source: RfError,
    },

    /// Returned when scoring a configuration on the test partition fails.
    #[error("evaluation failed for configuration {config}")]
    Evaluation {
        /// Composite identifier of the failing configuration.
        config: String,
        /// The underlying forest error.
        #[source]
        source: RfError,
    },
}
