//! I/O error types for hierdec-io.

use std::path::PathBuf;

use hierdec_decompose::DecomposeError;
use hierdec_eval::EvalError;

/// Errors from reading datasets and predictions and writing results.
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

    /// Returned when an open file or directory cannot be read.
    #[error("cannot read {path}")]
    ReadFile {
        /// Path being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when a `.zip` file cannot be opened, read or written.
    #[error("archive error in {path}")]
    Archive {
        /// Path to the archive.
        path: PathBuf,
        /// Underlying zip error.
        source: zip::result::ZipError,
    },

    /// Returned when a `.zip` file holds no entry.
    #[error("empty archive: {path}")]
    EmptyArchive {
        /// Path to the archive.
        path: PathBuf,
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

    /// Returned when a CSV record cannot be written.
    #[error("CSV write error in {path}")]
    CsvWrite {
        /// Path to the CSV file.
        path: PathBuf,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Returned when a dataset has no `@ATTRIBUTE CLASS HIERARCHICAL` line.
    #[error("no hierarchy declaration in {path}")]
    MissingHierarchy {
        /// Path to the dataset.
        path: PathBuf,
    },

    /// Returned when a dataset contains no data row.
    #[error("empty dataset (no data rows) in {path}")]
    EmptyDataset {
        /// Path to the dataset.
        path: PathBuf,
    },

    /// Returned when a data line does not have the expected shape.
    #[error("malformed line {line} in {path}: \"{content}\"")]
    MalformedLine {
        /// Path to the file.
        path: PathBuf,
        /// One-based line number.
        line: usize,
        /// The offending line.
        content: String,
    },

    /// Returned when a cell that should hold a number does not.
    #[error("non-finite value in {path}: line {line}, raw value \"{raw}\"")]
    NonFiniteValue {
        /// Path to the file.
        path: PathBuf,
        /// One-based line number.
        line: usize,
        /// The raw string value that failed to parse.
        raw: String,
    },

    /// Returned when a prediction file name does not name its decomposition
    /// unit (`Child_<c>-parent_<p>-...` or `Parent_<p>-...`).
    #[error("cannot recover the decomposition unit from file name {path}")]
    UnrecognisedPredictionFile {
        /// Path to the prediction file.
        path: PathBuf,
    },

    /// Returned when a result directory holds no prediction file.
    #[error("no prediction files (*.pred.arff, *.pred.arff.gz, *.pred.arff.zip) in {path}")]
    NoPredictionFiles {
        /// The directory that was listed.
        path: PathBuf,
    },

    /// Returned when parsed content is rejected by the dataset, hierarchy,
    /// fold or reconciliation rules.
    #[error("invalid content in {path}")]
    Decompose {
        /// File the content came from.
        path: PathBuf,
        /// Underlying validation error.
        source: DecomposeError,
    },

    /// Returned when a confidence value is rejected by the matrix builder.
    #[error("invalid confidence in {path}")]
    Confidence {
        /// File the value came from.
        path: PathBuf,
        /// Underlying validation error.
        source: EvalError,
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

    /// Returned when a JSON artifact cannot be serialized.
    #[error("cannot serialize {path}")]
    Serialize {
        /// Path of the artifact.
        path: PathBuf,
        /// Underlying serde error.
        source: serde_json::Error,
    },
}
