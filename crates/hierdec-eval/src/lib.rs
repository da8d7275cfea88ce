//! Threshold-sweep evaluation of per-label confidences.
//!
//! Computes, for every label, a precision-recall curve and a ROC curve
//! resampled onto a 1001-point grid together with their areas, a single
//! micro-averaged precision-recall curve over a chosen label subset, and a
//! fixed-threshold tabular report. Per-label work runs on a bounded rayon
//! pool; outputs are always ordered by label name.

mod config;
mod confusion;
mod curve;
mod error;
mod evaluator;
mod matrix;
mod micro;
mod pool;
mod report;
mod rounding;

pub use config::{DEFAULT_THRESHOLDS, EvaluationConfig};
pub use confusion::BinaryConfusion;
pub use curve::{CurveKind, CurveSet, LabelCurve};
pub use error::EvalError;
pub use evaluator::CurveEvaluator;
pub use matrix::{ConfidenceMatrix, ConfidenceMatrixBuilder, EvaluationInput, GroundTruth};
pub use micro::MicroAveragedCurve;
pub use report::{EvaluationReport, LabelReportRow, ReportAverages};
pub use rounding::round_half_up;
