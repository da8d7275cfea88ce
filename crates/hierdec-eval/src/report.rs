//! Fixed-threshold per-label report with area metrics and averages.

use serde::Serialize;

use crate::confusion::BinaryConfusion;
use crate::curve::{AREA_DECIMALS, CurveSet};
use crate::micro::MicroAveragedCurve;
use crate::rounding::round_half_up;

/// One label's line of the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelReportRow {
    /// The label.
    pub label: String,
    /// Confusion counts at each configured threshold, in threshold order.
    pub confusion: Vec<BinaryConfusion>,
    /// Area under the precision-recall curve.
    pub auprc: f64,
    /// Area under the ROC curve.
    pub auc: f64,
    /// Whether the label belongs to the averaged subset.
    pub included_in_averages: bool,
}

/// Averages over the labels of the averaged subset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReportAverages {
    /// Mean AUPRC, 0.0 if the subset is empty.
    pub auprc: f64,
    /// Mean AUC, 0.0 if the subset is empty.
    pub auc: f64,
    /// Area under the micro-averaged precision-recall curve.
    pub micro_auprc: f64,
}

/// Everything one evaluation run produces.
#[derive(Debug, Clone)]
pub struct EvaluationReport {
    /// Report thresholds, ascending.
    pub thresholds: Vec<f64>,
    /// Per-label precision-recall curves.
    pub precision_recall: CurveSet,
    /// Per-label ROC curves.
    pub roc: CurveSet,
    /// The micro-averaged precision-recall curve.
    pub micro: MicroAveragedCurve,
    /// One row per label, ordered by label.
    pub rows: Vec<LabelReportRow>,
    /// Subset averages.
    pub averages: ReportAverages,
}

/// Join confusion counts with the curve areas and average over the rows
/// flagged for inclusion.
pub(crate) fn assemble(
    thresholds: Vec<f64>,
    precision_recall: CurveSet,
    roc: CurveSet,
    micro: MicroAveragedCurve,
    confusion: Vec<(String, Vec<BinaryConfusion>, bool)>,
) -> EvaluationReport {
    let rows: Vec<LabelReportRow> = confusion
        .into_iter()
        .map(|(label, confusion, included_in_averages)| LabelReportRow {
            auprc: precision_recall.area(&label).unwrap_or(0.0),
            auc: roc.area(&label).unwrap_or(0.0),
            label,
            confusion,
            included_in_averages,
        })
        .collect();

    let included: Vec<&LabelReportRow> = rows.iter().filter(|r| r.included_in_averages).collect();
    let mean = |f: fn(&LabelReportRow) -> f64| {
        if included.is_empty() {
            0.0
        } else {
            let sum: f64 = included.iter().map(|r| f(r)).sum();
            round_half_up(sum / included.len() as f64, AREA_DECIMALS)
        }
    };
    let averages = ReportAverages {
        auprc: mean(|r| r.auprc),
        auc: mean(|r| r.auc),
        micro_auprc: micro.area,
    };

    EvaluationReport {
        thresholds,
        precision_recall,
        roc,
        micro,
        rows,
        averages,
    }
}
