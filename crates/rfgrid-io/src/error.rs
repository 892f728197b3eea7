//! I/O error types for rfgrid-io.

use std::path::PathBuf;

/// Errors from CSV loading, feature encoding, and artifact writing.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when the input file does not exist or is unreadable.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the CSV parser encounters a malformed record.
    #[error("CSV parse error in {path} at byte offset {offset}")]
    CsvParse {
        /// Path to the CSV file.
        path: PathBuf,
        /// Byte offset where the error occurred.
        offset: u64,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Returned when a required column is absent from the header.
    #[error("missing required column \"{column}\" in {path}")]
    MissingColumn {
        /// Path to the CSV file.
        path: PathBuf,
        /// Name of the missing column.
        column: &'static str,
    },

    /// Returned when the CSV file contains a header but zero data rows.
    #[error("empty dataset (no data rows) in {path}")]
    EmptyDataset {
        /// Path to the CSV file.
        path: PathBuf,
    },

    /// Returned when a cell cannot be interpreted for its column.
    #[error("invalid {column} value \"{raw}\" in {path}: row {row_index}")]
    InvalidValue {
        /// Path to the CSV file.
        path: PathBuf,
        /// Zero-based row index (excluding header).
        row_index: usize,
        /// Column name.
        column: &'static str,
        /// The raw cell text.
        raw: String,
    },

    /// Returned when a categorical level name is not recognised.
    #[error("unknown {field} level \"{raw}\"")]
    UnknownLevel {
        /// Which categorical field was being parsed.
        field: &'static str,
        /// The unrecognised text.
        raw: String,
    },

    /// Returned when imputation has no observed ages to take a median from.
    #[error("no known ages among {n_records} training records")]
    NoKnownAges {
        /// Number of records the encoder was fitted on.
        n_records: usize,
    },

    /// Returned when the experiment name contains characters outside `[a-zA-Z0-9_-]`.
    #[error("invalid experiment name \"{name}\": must match [a-zA-Z0-9_-]+")]
    InvalidExperimentName {
        /// The invalid name.
        name: String,
    },

    /// Returned when the output directory cannot be created.
    #[error("cannot create output directory {path}")]
    OutputDirCreate {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when a result file cannot be written.
    #[error("cannot write file {path}")]
    WriteFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when an artifact cannot be serialized to JSON.
    #[error("cannot serialize {path}")]
    Serialize {
        /// Destination of the artifact.
        path: PathBuf,
        /// Underlying serde error.
        source: serde_json::Error,
    },

    /// Returned when a chart cannot be rendered.
    #[error("cannot render chart {path}")]
    Chart {
        /// Destination of the chart.
        path: PathBuf,
        /// Underlying plotting error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Returned when there are no results to report.
    #[error("no evaluation results to report")]
    NoResults,
}
