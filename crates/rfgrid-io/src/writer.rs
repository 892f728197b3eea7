//! JSON, Markdown and SVG artifact writer for grid search runs.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use rfgrid_rf::{ACCURACY_CONFIDENCE, BinaryMetrics, SplitCriterion};
use rfgrid_search::{EvaluationResult, ResultTable};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::chart;
use crate::domain::{ExperimentName, Survival};

/// Number of configurations drawn in the interval chart.
pub const INTERVAL_CHART_TOP: usize = 5;

/// Inputs and derived sizes of one search run, recorded with the results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunParameters {
    pub data_path: PathBuf,
    pub n_records: usize,
    pub n_train: usize,
    pub n_test: usize,
    /// Train records per level, `[died, survived]`.
    pub train_class_counts: [usize; 2],
    pub test_class_counts: [usize; 2],
    pub split_fraction: f64,
    pub seed: u64,
    pub positive_class: Survival,
    /// Age imputed for missing values, fitted on the train partition.
    pub median_age: f64,
    pub leaf_sizes: Vec<usize>,
    pub tree_counts: Vec<usize>,
    pub criteria: Vec<SplitCriterion>,
}

/// Paths of every artifact written by [`ResultWriter::write_all`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactPaths {
    pub results: PathBuf,
    pub report: PathBuf,
    pub accuracy_chart: PathBuf,
    pub interval_chart: PathBuf,
}

/// Best configuration of a run, as printed at the end of `search`.
#[derive(Debug, Clone, Serialize)]
pub struct BestSummary<'a> {
    pub experiment: &'a str,
    pub n_configurations: usize,
    pub id: String,
    pub criterion: SplitCriterion,
    pub min_leaf_size: usize,
    pub n_trees: usize,
    pub accuracy: f64,
    pub accuracy_lower: f64,
    pub accuracy_upper: f64,
    pub kappa: f64,
    pub oob_accuracy: Option<f64>,
    pub artifacts: &'a ArtifactPaths,
}

/// Writes the artifacts of a search run.
///
/// Creates the output directory on construction if it does not exist.
/// Output files are named `{experiment}_results.json`,
/// `{experiment}_report.md`, `{experiment}_accuracy.svg` and
/// `{experiment}_top_intervals.svg`.
pub struct ResultWriter {
    output_dir: PathBuf,
    experiment: ExperimentName,
}

impl ResultWriter {
    /// Create a new writer targeting the given directory and experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), experiment = %experiment))]
    pub fn new(output_dir: &Path, experiment: ExperimentName) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            experiment,
        })
    }

    fn path(&self, suffix: &str) -> PathBuf {
        self.output_dir.join(self.experiment.file_name(suffix))
    }

    #[must_use]
    pub fn results_path(&self) -> PathBuf {
        self.path("results.json")
    }

    #[must_use]
    pub fn report_path(&self) -> PathBuf {
        self.path("report.md")
    }

    #[must_use]
    pub fn accuracy_chart_path(&self) -> PathBuf {
        self.path("accuracy.svg")
    }

    #[must_use]
    pub fn interval_chart_path(&self) -> PathBuf {
        self.path("top_intervals.svg")
    }

    /// Write run parameters and the full ranked table to
    /// `{experiment}_results.json`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::NoResults`] | `table` is empty |
    /// | [`IoError::Serialize`] | JSON encoding failed |
    /// | [`IoError::WriteFile`] | The file cannot be written |
    #[instrument(skip_all, fields(n_results = table.len()))]
    pub fn write_results(
        &self,
        params: &RunParameters,
        table: &ResultTable,
    ) -> Result<PathBuf, IoError> {
        let path = self.results_path();
        let results: Vec<ResultEntry<'_>> = table
            .iter()
            .enumerate()
            .map(|(i, r)| ResultEntry::new(i + 1, r))
            .collect();
        let best = results.first().cloned().ok_or(IoError::NoResults)?;

        let artifact = ResultsArtifact {
            experiment: self.experiment.as_str(),
            confidence_level: ACCURACY_CONFIDENCE,
            parameters: params,
            n_configurations: results.len(),
            best,
            results,
        };

        let json = serde_json::to_string_pretty(&artifact).map_err(|e| IoError::Serialize {
            path: path.clone(),
            source: e,
        })?;
        write_file(&path, &json)?;

        info!(path = %path.display(), "results written");
        Ok(path)
    }

    /// Render the accuracy-by-ensemble-size chart to `{experiment}_accuracy.svg`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Chart`] if rendering fails, or
    /// [`IoError::WriteFile`] if the file cannot be written.
    #[instrument(skip_all)]
    pub fn write_accuracy_chart(&self, table: &ResultTable) -> Result<PathBuf, IoError> {
        let path = self.accuracy_chart_path();
        let svg = chart::accuracy_chart_svg(table).map_err(|source| IoError::Chart {
            path: path.clone(),
            source,
        })?;
        write_file(&path, &svg)?;
        info!(path = %path.display(), "accuracy chart written");
        Ok(path)
    }

    /// Render the top-configuration interval chart to
    /// `{experiment}_top_intervals.svg`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Chart`] if rendering fails, or
    /// [`IoError::WriteFile`] if the file cannot be written.
    #[instrument(skip_all)]
    pub fn write_interval_chart(&self, table: &ResultTable) -> Result<PathBuf, IoError> {
        let path = self.interval_chart_path();
        let svg = chart::interval_chart_svg(table, INTERVAL_CHART_TOP).map_err(|source| {
            IoError::Chart {
                path: path.clone(),
                source,
            }
        })?;
        write_file(&path, &svg)?;
        info!(path = %path.display(), "interval chart written");
        Ok(path)
    }

    /// Write the Markdown report to `{experiment}_report.md`.
    ///
    /// The report links the two charts by file name, so it belongs next to
    /// them in the output directory.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::NoResults`] if `table` is empty, or
    /// [`IoError::WriteFile`] if the file cannot be written.
    #[instrument(skip_all, fields(top_n))]
    pub fn write_report(
        &self,
        params: &RunParameters,
        table: &ResultTable,
        top_n: usize,
    ) -> Result<PathBuf, IoError> {
        let path = self.report_path();
        let best = table.best().ok_or(IoError::NoResults)?;
        let markdown = self
            .render_report(params, table, best, top_n)
            .map_err(|e| IoError::WriteFile {
                path: path.clone(),
                source: std::io::Error::other(e),
            })?;
        write_file(&path, &markdown)?;
        info!(path = %path.display(), "report written");
        Ok(path)
    }

    /// Write every artifact of a run.
    ///
    /// # Errors
    ///
    /// Propagates the first error from the individual writers.
    pub fn write_all(
        &self,
        params: &RunParameters,
        table: &ResultTable,
        top_n: usize,
    ) -> Result<ArtifactPaths, IoError> {
        Ok(ArtifactPaths {
            results: self.write_results(params, table)?,
            accuracy_chart: self.write_accuracy_chart(table)?,
            interval_chart: self.write_interval_chart(table)?,
            report: self.write_report(params, table, top_n)?,
        })
    }

    /// Summary of the best configuration.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::NoResults`] if `table` is empty.
    pub fn summary<'a>(
        &'a self,
        table: &ResultTable,
        artifacts: &'a ArtifactPaths,
    ) -> Result<BestSummary<'a>, IoError> {
        let best = table.best().ok_or(IoError::NoResults)?;
        Ok(BestSummary {
            experiment: self.experiment.as_str(),
            n_configurations: table.len(),
            id: best.config.label(),
            criterion: best.config.criterion,
            min_leaf_size: best.config.min_leaf_size,
            n_trees: best.config.n_trees,
            accuracy: best.metrics.accuracy,
            accuracy_lower: best.metrics.accuracy_lower,
            accuracy_upper: best.metrics.accuracy_upper,
            kappa: best.metrics.kappa,
            oob_accuracy: best.oob_accuracy,
            artifacts,
        })
    }

    fn render_report(
        &self,
        params: &RunParameters,
        table: &ResultTable,
        best: &EvaluationResult,
        top_n: usize,
    ) -> Result<String, std::fmt::Error> {
        let mut out = String::new();
        let pct = |x: f64| format!("{:.2}%", 100.0 * x);
        let joined = |values: &[String]| values.join(", ");

        writeln!(out, "# Random Forest grid search: {}", self.experiment)?;
        writeln!(out)?;
        writeln!(
            out,
            "{} passengers from `{}` were split {:.0}/{:.0} into train and test \
             partitions, stratified on the outcome. Every combination of minimum \
             leaf size, number of trees and split criterion was trained on the \
             train partition and scored on the test partition, {} configurations \
             in total. Results are ranked by accuracy, then by fewer trees, then \
             by smaller leaves.",
            params.n_records,
            params.data_path.display(),
            100.0 * params.split_fraction,
            100.0 * (1.0 - params.split_fraction),
            table.len(),
        )?;
        writeln!(out)?;

        writeln!(out, "## Parameters")?;
        writeln!(out)?;
        writeln!(out, "| Parameter | Value |")?;
        writeln!(out, "|---|---|")?;
        let leaf_sizes: Vec<String> = params.leaf_sizes.iter().map(ToString::to_string).collect();
        let tree_counts: Vec<String> = params.tree_counts.iter().map(ToString::to_string).collect();
        let criteria: Vec<String> = params.criteria.iter().map(ToString::to_string).collect();
        let rows = [
            ("Records", params.n_records.to_string()),
            (
                "Train / test",
                format!("{} / {}", params.n_train, params.n_test),
            ),
            (
                "Train died / survived",
                format!(
                    "{} / {}",
                    params.train_class_counts[0], params.train_class_counts[1]
                ),
            ),
            (
                "Test died / survived",
                format!(
                    "{} / {}",
                    params.test_class_counts[0], params.test_class_counts[1]
                ),
            ),
            ("Split fraction", params.split_fraction.to_string()),
            ("Seed", params.seed.to_string()),
            ("Positive class", params.positive_class.to_string()),
            ("Imputed age", format!("{:.1}", params.median_age)),
            ("Minimum leaf sizes", joined(&leaf_sizes)),
            ("Tree counts", joined(&tree_counts)),
            ("Criteria", joined(&criteria)),
        ];
        for (name, value) in rows {
            writeln!(out, "| {name} | {value} |")?;
        }
        writeln!(out)?;

        let top = table.top(top_n);
        writeln!(out, "## Top {} configurations", top.len())?;
        writeln!(out)?;
        writeln!(
            out,
            "| Rank | ID | Criterion | Min leaf | Trees | Accuracy | {:.0}% CI | Kappa | Sensitivity | Specificity | OOB accuracy |",
            100.0 * ACCURACY_CONFIDENCE
        )?;
        writeln!(out, "|---:|---|---|---:|---:|---:|---|---:|---:|---:|---:|")?;
        for (i, r) in top.iter().enumerate() {
            let m = &r.metrics;
            writeln!(
                out,
                "| {} | {} | {} | {} | {} | {} | [{:.4}, {:.4}] | {:.4} | {:.4} | {:.4} | {} |",
                i + 1,
                r.config.label(),
                r.config.criterion,
                r.config.min_leaf_size,
                r.config.n_trees,
                pct(m.accuracy),
                m.accuracy_lower,
                m.accuracy_upper,
                m.kappa,
                m.sensitivity,
                m.specificity,
                r.oob_accuracy.map_or_else(|| "-".to_string(), pct),
            )?;
        }
        writeln!(out)?;

        writeln!(out, "## Charts")?;
        writeln!(out)?;
        writeln!(
            out,
            "![Test accuracy by number of trees]({})",
            self.experiment.file_name("accuracy.svg")
        )?;
        writeln!(out)?;
        writeln!(
            out,
            "![Top configurations with confidence intervals]({})",
            self.experiment.file_name("top_intervals.svg")
        )?;
        writeln!(out)?;

        let m = &best.metrics;
        writeln!(out, "## Best configuration")?;
        writeln!(out)?;
        writeln!(
            out,
            "`{}`: criterion {}, minimum leaf size {}, {} trees. Test accuracy {} \
             ({:.0}% CI {:.4} to {:.4}), kappa {:.4}, no-information rate {:.4} \
             (P[Acc > NIR] = {:.3e}).",
            best.config.label(),
            best.config.criterion,
            best.config.min_leaf_size,
            best.config.n_trees,
            pct(m.accuracy),
            100.0 * ACCURACY_CONFIDENCE,
            m.accuracy_lower,
            m.accuracy_upper,
            m.kappa,
            m.no_information_rate,
            m.p_value_acc_gt_nir,
        )?;
        writeln!(out)?;
        writeln!(out, "Confusion matrix (rows true, columns predicted):")?;
        writeln!(out)?;
        writeln!(out, "| | died | survived |")?;
        writeln!(out, "|---|---:|---:|")?;
        for (level, row) in Survival::LEVELS.iter().zip(best.confusion.as_rows()) {
            writeln!(out, "| {level} | {} | {} |", row[0], row[1])?;
        }
        Ok(out)
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), IoError> {
    fs::write(path, contents).map_err(|e| IoError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    })
}

// --- Shadow structs for JSON serialization ---

#[derive(Serialize)]
struct ResultsArtifact<'a> {
    experiment: &'a str,
    confidence_level: f64,
    parameters: &'a RunParameters,
    n_configurations: usize,
    best: ResultEntry<'a>,
    results: Vec<ResultEntry<'a>>,
}

#[derive(Clone, Serialize)]
struct ResultEntry<'a> {
    rank: usize,
    id: String,
    criterion: SplitCriterion,
    min_leaf_size: usize,
    n_trees: usize,
    max_features: usize,
    oob_accuracy: Option<f64>,
    #[serde(flatten)]
    metrics: &'a BinaryMetrics,
    confusion_matrix: &'a [Vec<usize>],
}

impl<'a> ResultEntry<'a> {
    fn new(rank: usize, r: &'a EvaluationResult) -> Self {
        Self {
            rank,
            id: r.config.label(),
            criterion: r.config.criterion,
            min_leaf_size: r.config.min_leaf_size,
            n_trees: r.config.n_trees,
            max_features: r.max_features,
            oob_accuracy: r.oob_accuracy,
            metrics: &r.metrics,
            confusion_matrix: r.confusion.as_rows(),
        }
    }
}
