//! Hierarchy decompositions and their inverse.
//!
//! Restates a hierarchically labelled dataset as flat or per-edge binary
//! datasets for a non-hierarchical classifier, assigns examples to
//! cross-validation folds, and folds per-edge classifier confidences back
//! into one confidence per (example, label).

mod dataset;
mod encoding;
mod engine;
mod error;
mod folds;
mod reconcile;

pub use dataset::{BaseDataset, Example};
pub use encoding::Encoding;
pub use engine::{DatasetUnit, DecompositionEngine, EncodedDataset, ExampleScope, FoldDatasets};
pub use error::DecomposeError;
pub use folds::{FoldAssignment, Folds};
pub use reconcile::{ConfidenceReconciler, EdgeConfidences};
