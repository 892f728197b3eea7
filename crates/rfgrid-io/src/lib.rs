//! File I/O, validation, encoding and report rendering for the rfgrid pipeline.

pub mod chart;
mod domain;
mod encode;
mod error;
mod reader;
mod writer;

pub use domain::{
    ExperimentName, Passenger, PassengerClass, PassengerDataset, Sex, Survival, class_counts,
};
pub use encode::{FEATURE_NAMES, FeatureEncoder, encode_labels};
pub use error::IoError;
pub use reader::{PassengerReader, REQUIRED_COLUMNS};
pub use writer::{ArtifactPaths, BestSummary, INTERVAL_CHART_TOP, ResultWriter, RunParameters};
