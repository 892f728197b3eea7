//! Hyperparameter grid search for Random Forest classifiers.
//!
//! Partitions labeled records into stratified train/test sets, enumerates
//! the leaf size x ensemble size x criterion grid, trains and scores one
//! forest per configuration, and ranks the results.

mod error;
mod evaluate;
mod grid;
mod partition;
mod ranking;

pub use error::SearchError;
pub use evaluate::{EvaluationResult, Execution, GridSearch, TrainTestData};
pub use grid::{DEFAULT_LEAF_SIZES, DEFAULT_TREE_COUNTS, GridConfiguration, ParamGrid};
pub use partition::{Partition, stratified_split};
pub use ranking::ResultTable;
