use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use rfgrid_io::{
    ExperimentName, FeatureEncoder, Passenger, PassengerReader, ResultWriter, RunParameters,
    Survival, class_counts, encode_labels,
};
use rfgrid_rf::SplitCriterion;
use rfgrid_search::{
    DEFAULT_LEAF_SIZES, DEFAULT_TREE_COUNTS, Execution, GridConfiguration, GridSearch, ParamGrid,
    Partition, TrainTestData, stratified_split,
};

#[derive(Parser)]
#[command(name = "rfgrid")]
#[command(about = "Random Forest hyperparameter grid search on passenger survival data")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for the split and every forest
    #[arg(long, default_value_t = 42, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// Hyperparameter value sets.
#[derive(Args, Debug, Clone)]
struct GridArgs {
    /// Minimum leaf sizes, comma-separated
    #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_LEAF_SIZES)]
    leaf_sizes: Vec<usize>,

    /// Ensemble sizes, comma-separated
    #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_TREE_COUNTS)]
    tree_counts: Vec<usize>,

    /// Split criteria, comma-separated: gini, distauc, infgain
    #[arg(long, value_delimiter = ',', default_values_t = SplitCriterion::ALL)]
    criteria: Vec<SplitCriterion>,
}

impl GridArgs {
    fn build(&self) -> Result<ParamGrid> {
        ParamGrid::new(&self.leaf_sizes, &self.tree_counts, &self.criteria)
            .context("invalid hyperparameter grid")
    }
}

#[derive(Subcommand)]
enum Command {
    /// Train and score every grid configuration, then write the report
    Search {
        /// Path to the passenger CSV file
        #[arg(long)]
        data: PathBuf,

        /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
        #[arg(long, default_value = "titanic")]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        /// Fraction of records placed in the train partition
        #[arg(long, default_value_t = 0.7)]
        split_fraction: f64,

        /// Outcome level treated as the positive class
        #[arg(long, default_value_t = Survival::Died)]
        positive: Survival,

        /// Number of rows in the report's results table
        #[arg(long, default_value_t = 10)]
        top_n: usize,

        /// Evaluate configurations in parallel
        #[arg(long, default_value_t = false)]
        parallel: bool,

        #[command(flatten)]
        grid: GridArgs,
    },

    /// Print the enumerated grid without training anything
    Grid {
        #[command(flatten)]
        grid: GridArgs,
    },

    /// Print the sizes of the stratified partition
    Split {
        /// Path to the passenger CSV file
        #[arg(long)]
        data: PathBuf,

        /// Fraction of records placed in the train partition
        #[arg(long, default_value_t = 0.7)]
        split_fraction: f64,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct GridOutput {
    n_configurations: usize,
    configurations: Vec<GridEntry>,
}

#[derive(Serialize)]
struct GridEntry {
    id: String,
    #[serde(flatten)]
    config: GridConfiguration,
}

#[derive(Serialize)]
struct SplitOutput {
    n_records: usize,
    n_missing_age: usize,
    split_fraction: f64,
    seed: u64,
    n_train: usize,
    n_test: usize,
    train_class_counts: [usize; 2],
    test_class_counts: [usize; 2],
}

/// Read the CSV and partition it; also returns the number of missing ages.
fn load_and_split(
    data: &Path,
    split_fraction: f64,
    seed: u64,
) -> Result<(Vec<Passenger>, Partition, usize)> {
    let dataset = PassengerReader::new(data)
        .read()
        .with_context(|| format!("failed to read passenger CSV {}", data.display()))?;
    let partition = stratified_split(&dataset.labels(), split_fraction, seed)
        .context("failed to partition the dataset")?;
    info!(
        n_train = partition.train().len(),
        n_test = partition.test().len(),
        "dataset partitioned"
    );
    let n_missing_age = dataset.n_missing_age();
    Ok((dataset.passengers().to_vec(), partition, n_missing_age))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Configure Rayon thread pool
    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Search {
            data,
            experiment,
            output_dir,
            split_fraction,
            positive,
            top_n,
            parallel,
            grid,
        } => {
            let experiment_name = ExperimentName::new(experiment)?;
            let param_grid = grid.build()?;

            // 1. Read and partition
            let (passengers, partition, _) = load_and_split(&data, split_fraction, cli.seed)?;
            let train = partition.select_train(&passengers);
            let test = partition.select_test(&passengers);

            // 2. Encode, imputing ages from the train partition only
            let encoder = FeatureEncoder::fit(&train).context("failed to fit feature encoder")?;
            let tt = TrainTestData::new(
                encoder.encode(&train),
                encode_labels(&train),
                encoder.encode(&test),
                encode_labels(&test),
                encoder.feature_names(),
            )?;
            info!(median_age = encoder.median_age(), "features encoded");

            // 3. Search
            let execution = if parallel {
                Execution::Parallel
            } else {
                Execution::Sequential
            };
            let table = GridSearch::new(param_grid.clone())
                .with_seed(cli.seed)
                .with_positive_class(positive.index())
                .with_execution(execution)
                .run(&tt)
                .context("grid search failed")?;

            // 4. Write artifacts
            let params = RunParameters {
                data_path: data,
                n_records: passengers.len(),
                n_train: train.len(),
                n_test: test.len(),
                train_class_counts: class_counts(&train),
                test_class_counts: class_counts(&test),
                split_fraction,
                seed: cli.seed,
                positive_class: positive,
                median_age: encoder.median_age(),
                leaf_sizes: param_grid.leaf_sizes().to_vec(),
                tree_counts: param_grid.tree_counts().to_vec(),
                criteria: param_grid.criteria().to_vec(),
            };
            let writer = ResultWriter::new(&output_dir, experiment_name)?;
            let paths = writer
                .write_all(&params, &table, top_n)
                .context("failed to write report artifacts")?;

            // 5. Print summary
            let summary = writer.summary(&table, &paths)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }

        Command::Grid { grid } => {
            let param_grid = grid.build()?;
            let output = GridOutput {
                n_configurations: param_grid.len(),
                configurations: param_grid
                    .configurations()
                    .into_iter()
                    .map(|config| GridEntry {
                        id: config.label(),
                        config,
                    })
                    .collect(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Split {
            data,
            split_fraction,
        } => {
            let (passengers, partition, n_missing_age) =
                load_and_split(&data, split_fraction, cli.seed)?;
            let train = partition.select_train(&passengers);
            let test = partition.select_test(&passengers);
            let output = SplitOutput {
                n_records: passengers.len(),
                n_missing_age,
                split_fraction,
                seed: cli.seed,
                n_train: train.len(),
                n_test: test.len(),
                train_class_counts: class_counts(&train),
                test_class_counts: class_counts(&test),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
