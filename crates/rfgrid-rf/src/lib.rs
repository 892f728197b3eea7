//! Random Forest classification: train, predict, evaluate.
//!
//! Provides a hand-rolled Random Forest classifier with CART decision trees,
//! Gini, information gain and DistAUC split criteria, parallel training via
//! rayon, out-of-bag evaluation, impurity-based feature importance, and the
//! binary classification statistics used to score a held-out test set.

mod config;
mod confusion;
mod error;
mod forest;
mod importance;
mod metrics;
mod node;
mod oob;
mod predict;
mod result;
mod split;
pub mod stats;
mod tree;

pub use config::{MaxFeatures, OobMode, RandomForestConfig};
pub use confusion::ConfusionMatrix;
pub use error::RfError;
pub use forest::RandomForest;
pub use importance::RankedFeature;
pub use metrics::{ACCURACY_CONFIDENCE, BinaryMetrics};
pub use node::{FeatureIndex, Impurity, Node, NodeIndex};
pub use oob::OobScore;
pub use predict::ClassDistribution;
pub use result::{RandomForestResult, TrainingMetadata};
pub use split::SplitCriterion;
pub use tree::{DecisionTree, DecisionTreeConfig};
