use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use hierdec_decompose::{BaseDataset, DecompositionEngine, Encoding, FoldAssignment};
use hierdec_eval::{CurveEvaluator, DEFAULT_THRESHOLDS, EvaluationConfig, EvaluationInput};
use hierdec_hierarchy::LabelSubset;
use hierdec_io::{
    DatasetReader, PredictionReader, ResultWriter, count_data_rows, read_confidences, read_folds,
};

#[derive(Parser)]
#[command(name = "hierdec")]
#[command(about = "Hierarchy decompositions and curve-based evaluation for hierarchical multi-label classification")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for reproducibility
    #[arg(long, default_value_t = 42, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Maximum worker threads for per-label evaluation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

#[derive(Subcommand)]
enum Command {
    /// Summarise the hierarchy and annotations of a dataset
    Properties {
        /// Path to the hierarchically labelled dataset (plain or .zip)
        #[arg(long)]
        data: PathBuf,

        /// Optional unlabelled set whose examples are only counted
        #[arg(long)]
        unlabelled: Option<PathBuf>,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Assign examples to cross-validation folds
    Folds {
        /// Path to the hierarchically labelled dataset (plain or .zip)
        #[arg(long)]
        data: PathBuf,

        /// Number of folds
        #[arg(long, default_value_t = 10)]
        n_folds: usize,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Write the encoded training and test datasets of every fold
    Decompose {
        /// Path to the hierarchically labelled dataset (plain or .zip)
        #[arg(long)]
        data: PathBuf,

        /// Encodings to produce (repeatable; all five if omitted)
        #[arg(long = "encoding")]
        encodings: Vec<String>,

        /// Fold assignment file (defaults to <output-dir>/exampleId2fold.txt)
        #[arg(long)]
        folds: Option<PathBuf>,

        /// Labels the complete encodings emit: "most-specific" or "hierarchy-leaves"
        #[arg(long, default_value = "most-specific")]
        label_subset: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Evaluate classifier confidences for one encoding
    Evaluate {
        /// Path to the hierarchically labelled dataset (plain or .zip)
        #[arg(long)]
        data: PathBuf,

        /// Encoding whose predictions are evaluated
        #[arg(long)]
        encoding: String,

        /// Re-evaluate a stored confidence table instead of reading predictions
        #[arg(long, conflicts_with = "predictions_dir")]
        confidences: Option<PathBuf>,

        /// Directory of prediction files (defaults to <output-dir>/<Encoding>/Results)
        #[arg(long)]
        predictions_dir: Option<PathBuf>,

        /// Labels averaged in the report: "most-specific" or "hierarchy-leaves"
        #[arg(long, default_value = "most-specific")]
        label_subset: String,

        /// Report thresholds, comma-separated
        #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_THRESHOLDS)]
        thresholds: Vec<f64>,

        /// Time in-flight label tasks get to finish after a failure
        #[arg(long, default_value_t = 5000)]
        grace_period_ms: u64,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct PropertiesOutput {
    dataset: String,
    n_examples: usize,
    n_labels: usize,
    n_leaves: usize,
    max_depth: usize,
    hierarchy: &'static str,
    n_most_specific_labels: usize,
    properties_file: PathBuf,
}

#[derive(Serialize)]
struct FoldsOutput {
    dataset: String,
    n_examples: usize,
    n_folds: usize,
    seed: u64,
    fold_file: PathBuf,
}

#[derive(Serialize)]
struct DecomposeOutput {
    dataset: String,
    n_folds: usize,
    encodings: Vec<EncodingOutput>,
}

#[derive(Serialize)]
struct EncodingOutput {
    encoding: &'static str,
    n_files: usize,
}

#[derive(Serialize)]
struct EvaluateOutput {
    dataset: String,
    encoding: &'static str,
    n_examples: usize,
    n_labels: usize,
    n_averaged_labels: usize,
    auprc: f64,
    auc: f64,
    micro_auprc: f64,
}

fn read_dataset(path: &Path) -> Result<BaseDataset> {
    DatasetReader::new(path)
        .read()
        .with_context(|| format!("failed to read dataset {}", path.display()))
}

fn parse_encoding(s: &str) -> Result<Encoding> {
    s.parse()
        .with_context(|| format!("unknown encoding: {s}"))
}

fn parse_label_subset(s: &str) -> Result<LabelSubset> {
    s.parse()
        .with_context(|| format!("unknown label subset: {s} (expected most-specific or hierarchy-leaves)"))
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

    match cli.command {
        Command::Properties {
            data,
            unlabelled,
            output_dir,
        } => {
            let dataset = read_dataset(&data)?;
            let unlabelled = unlabelled
                .map(|path| {
                    count_data_rows(&path)
                        .with_context(|| format!("failed to read unlabelled set {}", path.display()))
                })
                .transpose()?;

            let properties = dataset.properties();
            let writer = ResultWriter::new(&output_dir).context("failed to create output directory")?;
            let properties_file = writer
                .write_properties(dataset.name(), &properties, dataset.attribute_counts(), unlabelled)
                .context("failed to write dataset properties")?;

            let output = PropertiesOutput {
                dataset: dataset.name().to_string(),
                n_examples: properties.n_examples,
                n_labels: properties.n_labels,
                n_leaves: properties.n_leaves,
                max_depth: properties.max_depth,
                hierarchy: if properties.is_tree { "tree" } else { "DAG" },
                n_most_specific_labels: properties.n_most_specific_labels,
                properties_file,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Folds {
            data,
            n_folds,
            output_dir,
        } => {
            let dataset = read_dataset(&data)?;
            let folds = FoldAssignment::new(n_folds)
                .context("invalid fold count")?
                .with_seed(cli.seed)
                .assign(dataset.example_ids())
                .context("fold assignment failed")?;

            let writer = ResultWriter::new(&output_dir).context("failed to create output directory")?;
            let fold_file = writer.write_folds(&folds).context("failed to write fold file")?;

            let output = FoldsOutput {
                dataset: dataset.name().to_string(),
                n_examples: folds.len(),
                n_folds: folds.n_folds(),
                seed: cli.seed,
                fold_file,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Decompose {
            data,
            encodings,
            folds,
            label_subset,
            output_dir,
        } => {
            let encodings = if encodings.is_empty() {
                Encoding::ALL.to_vec()
            } else {
                encodings
                    .iter()
                    .map(|s| parse_encoding(s))
                    .collect::<Result<Vec<_>>>()?
            };
            let subset = parse_label_subset(&label_subset)?;

            let dataset = read_dataset(&data)?;
            let writer = ResultWriter::new(&output_dir).context("failed to create output directory")?;
            let fold_path = folds.unwrap_or_else(|| writer.fold_path());
            let folds = read_folds(&fold_path)
                .with_context(|| format!("failed to read fold file {}", fold_path.display()))?;
            info!(n_folds = folds.n_folds(), n_encodings = encodings.len(), "decomposing");

            let engine = DecompositionEngine::new(&dataset, subset);
            let mut summary = Vec::with_capacity(encodings.len());
            for encoding in encodings {
                let mut n_files = 0;
                for fold in 1..=folds.n_folds() {
                    let datasets = engine
                        .encode_fold(&folds, fold, encoding)
                        .with_context(|| format!("failed to encode fold {fold} for {encoding}"))?;
                    n_files += writer
                        .write_fold_datasets(encoding, &datasets)
                        .with_context(|| format!("failed to write fold {fold} for {encoding}"))?
                        .len();
                }
                summary.push(EncodingOutput {
                    encoding: encoding.dir_name(),
                    n_files,
                });
            }

            let output = DecomposeOutput {
                dataset: dataset.name().to_string(),
                n_folds: folds.n_folds(),
                encodings: summary,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Evaluate {
            data,
            encoding,
            confidences,
            predictions_dir,
            label_subset,
            thresholds,
            grace_period_ms,
            output_dir,
        } => {
            let encoding = parse_encoding(&encoding)?;
            let subset = parse_label_subset(&label_subset)?;

            let mut config = EvaluationConfig::new(thresholds)
                .context("invalid thresholds")?
                .with_grace_period(Duration::from_millis(grace_period_ms));
            if let Some(threads) = cli.threads {
                config = config.with_max_workers(threads);
            }
            let evaluator = CurveEvaluator::new(config).context("failed to start evaluation workers")?;

            let dataset = read_dataset(&data)?;
            let writer = ResultWriter::new(&output_dir).context("failed to create output directory")?;

            let matrix = match confidences {
                Some(path) => read_confidences(&path)
                    .with_context(|| format!("failed to read confidences {}", path.display()))?,
                None => {
                    let dir = predictions_dir
                        .unwrap_or_else(|| writer.encoding_dir(encoding).join("Results"));
                    let matrix = PredictionReader::new(&dir)
                        .collect(&dataset, encoding)
                        .with_context(|| format!("failed to collect predictions from {}", dir.display()))?;
                    writer
                        .write_confidences(encoding, &matrix)
                        .context("failed to write confidences")?;
                    matrix
                }
            };
            let (n_examples, n_labels) = (matrix.n_examples(), matrix.n_labels());

            let averaged = dataset.label_subset(subset);
            let input = EvaluationInput::new(matrix, dataset.ground_truth());
            let report = evaluator
                .tabular_report(&input, &averaged)
                .context("evaluation failed")?;
            writer
                .write_evaluation(dataset.name(), encoding, &report)
                .context("failed to write evaluation")?;

            let output = EvaluateOutput {
                dataset: dataset.name().to_string(),
                encoding: encoding.dir_name(),
                n_examples,
                n_labels,
                n_averaged_labels: report.rows.iter().filter(|r| r.included_in_averages).count(),
                auprc: report.averages.auprc,
                auc: report.averages.auc,
                micro_auprc: report.averages.micro_auprc,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
