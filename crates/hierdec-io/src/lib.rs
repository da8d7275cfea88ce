//! File I/O for the hierdec pipeline: datasets, fold assignments, encoded
//! datasets, classifier predictions and evaluation results.
//!
//! Tables and encoded datasets are stored as single-entry `.zip` archives;
//! every reader accepts both the plain and the zipped form.

mod archive;
mod confidences;
mod error;
mod fold_file;
mod naming;
mod predictions;
mod reader;
mod writer;

pub use archive::{compress_and_remove, read_text, zipped_path};
pub use confidences::{CONFIDENCE_HEADER, read_confidences};
pub use error::IoError;
pub use fold_file::{FOLD_FILE, read_folds};
pub use naming::{Split, dataset_file_name, unit_from_file_name};
pub use predictions::PredictionReader;
pub use reader::{DatasetReader, count_data_rows};
pub use writer::ResultWriter;
