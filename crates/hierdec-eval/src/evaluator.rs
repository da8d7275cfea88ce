//! Public entry points of curve evaluation.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use tracing::{info, instrument};

use crate::config::EvaluationConfig;
use crate::confusion::BinaryConfusion;
use crate::curve::{CurveKind, CurveSet, sweep_label};
use crate::error::EvalError;
use crate::matrix::EvaluationInput;
use crate::micro::{LabelCounts, MicroAveragedCurve, micro_average};
use crate::pool::LabelPool;
use crate::report::{EvaluationReport, assemble};

/// Computes curves, areas and reports for a confidence matrix.
///
/// Owns the worker pool; every per-label computation of every call runs on
/// it. Inputs are shared read-only with the tasks through
/// [`EvaluationInput`], so one evaluator can serve several runs.
pub struct CurveEvaluator {
    config: EvaluationConfig,
    pool: LabelPool,
}

impl fmt::Debug for CurveEvaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurveEvaluator")
            .field("config", &self.config)
            .field("n_workers", &self.pool.n_workers())
            .finish()
    }
}

impl CurveEvaluator {
    /// Start the worker pool described by `config`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`EvalError::InvalidWorkerCount`] | `max_workers` is zero |
    /// | [`EvalError::ThreadPool`] | The pool cannot be created |
    pub fn new(config: EvaluationConfig) -> Result<Self, EvalError> {
        let pool = LabelPool::new(config.max_workers, config.grace_period)?;
        Ok(Self { config, pool })
    }

    /// Return the configuration.
    #[must_use]
    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    /// Per-label precision-recall curves and AUPRC.
    ///
    /// # Errors
    ///
    /// Fails if any label task fails; no partial result is returned.
    #[instrument(skip_all, fields(n_labels = input.confidences.n_labels()))]
    pub fn precision_recall(&self, input: &EvaluationInput) -> Result<CurveSet, EvalError> {
        self.curves(input, CurveKind::PrecisionRecall)
    }

    /// Per-label ROC curves and AUC.
    ///
    /// # Errors
    ///
    /// Fails if any label task fails; no partial result is returned.
    #[instrument(skip_all, fields(n_labels = input.confidences.n_labels()))]
    pub fn roc(&self, input: &EvaluationInput) -> Result<CurveSet, EvalError> {
        self.curves(input, CurveKind::Roc)
    }

    /// Micro-averaged precision-recall curve over the labels of `subset`
    /// that have a confidence column. Subset labels without a column are
    /// ignored. The thresholds visited come from every column.
    ///
    /// # Errors
    ///
    /// Fails if any label task fails.
    #[instrument(skip_all, fields(n_subset = subset.len()))]
    pub fn micro_averaged_pr(
        &self,
        input: &EvaluationInput,
        subset: &BTreeSet<String>,
    ) -> Result<MicroAveragedCurve, EvalError> {
        // Every label is swept: its thresholds join the shared grid even
        // when its counts are not summed.
        let all = input.confidences.labels().to_vec();
        let shared = input.clone();
        let names = Arc::new(all.clone());
        let counts = self.pool.run(&all, move |i| {
            let matrix = &shared.confidences;
            let column = matrix.column(&names[i])?;
            let truth = shared.truth.membership(&names[i], matrix.examples());
            Ok(LabelCounts::sweep(column, &truth))
        })?;

        let thresholds: BTreeSet<u32> = counts.iter().flat_map(|c| c.thresholds()).collect();
        let (labels, counts): (Vec<String>, Vec<LabelCounts>) = all
            .into_iter()
            .zip(counts)
            .filter(|(label, _)| subset.contains(label))
            .unzip();
        let curve = micro_average(labels, &counts, &thresholds);
        info!(
            n_labels = curve.labels.len(),
            area = curve.area,
            "micro-averaged precision-recall computed"
        );
        Ok(curve)
    }

    /// Full report: both curve families, the micro-averaged curve and
    /// confusion counts at each configured threshold, with AUPRC and AUC
    /// averaged over `subset`.
    ///
    /// # Errors
    ///
    /// Fails if any label task fails.
    #[instrument(skip_all, fields(n_labels = input.confidences.n_labels(), n_examples = input.confidences.n_examples()))]
    pub fn tabular_report(
        &self,
        input: &EvaluationInput,
        subset: &BTreeSet<String>,
    ) -> Result<EvaluationReport, EvalError> {
        let precision_recall = self.precision_recall(input)?;
        let roc = self.roc(input)?;
        let micro = self.micro_averaged_pr(input, subset)?;

        let shared = input.clone();
        let thresholds = Arc::new(self.config.thresholds.clone());
        let task_thresholds = Arc::clone(&thresholds);
        let confusion = self.pool.run(input.confidences.labels(), move |i| {
            let matrix = &shared.confidences;
            let label = &matrix.labels()[i];
            let truth = shared.truth.membership(label, matrix.examples());
            let column = matrix.column_at(i);
            let counts: Vec<BinaryConfusion> = task_thresholds
                .iter()
                .map(|&t| BinaryConfusion::at_threshold(column, &truth, t))
                .collect();
            Ok((label.clone(), counts))
        })?;
        let confusion = confusion
            .into_iter()
            .map(|(label, counts)| {
                let included = subset.contains(&label);
                (label, counts, included)
            })
            .collect();

        let report = assemble(thresholds.to_vec(), precision_recall, roc, micro, confusion);
        info!(
            auprc = report.averages.auprc,
            auc = report.averages.auc,
            micro_auprc = report.averages.micro_auprc,
            "evaluation report compiled"
        );
        Ok(report)
    }

    fn curves(&self, input: &EvaluationInput, kind: CurveKind) -> Result<CurveSet, EvalError> {
        let shared = input.clone();
        let labels = self.pool.run(input.confidences.labels(), move |i| {
            let matrix = &shared.confidences;
            let label = &matrix.labels()[i];
            let truth = shared.truth.membership(label, matrix.examples());
            Ok(sweep_label(kind, label, matrix.column_at(i), &truth))
        })?;
        info!(kind = ?kind, n_labels = labels.len(), "curves computed");
        Ok(CurveSet { kind, labels })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{ConfidenceMatrixBuilder, GroundTruth};

    fn evaluator() -> CurveEvaluator {
        CurveEvaluator::new(EvaluationConfig::new([0.5]).unwrap().with_max_workers(2)).unwrap()
    }

    fn input() -> EvaluationInput {
        let mut b = ConfidenceMatrixBuilder::new();
        b.insert("e1", "A", 0.9).unwrap();
        b.insert("e2", "A", 0.3).unwrap();
        b.insert("e1", "B", 0.2).unwrap();
        b.insert("e2", "B", 0.7).unwrap();
        let truth = GroundTruth::from_annotations(vec![("e1", vec!["A"]), ("e2", vec!["A", "B"])]);
        EvaluationInput::new(b.build(), truth)
    }

    #[test]
    fn curves_are_ordered_by_label() {
        let set = evaluator().precision_recall(&input()).unwrap();
        let names: Vec<&str> = set.labels.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(set.kind, CurveKind::PrecisionRecall);
    }

    #[test]
    fn report_rows_and_averages() {
        let subset: BTreeSet<String> = ["B".to_string()].into();
        let report = evaluator().tabular_report(&input(), &subset).unwrap();
        assert_eq!(report.rows.len(), 2);

        let a = &report.rows[0];
        assert_eq!(a.label, "A");
        assert!(!a.included_in_averages);
        // A: both examples positive, only e1 above 0.5.
        assert_eq!(a.confusion[0].tp, 1);
        assert_eq!(a.confusion[0].fn_, 1);

        let b = &report.rows[1];
        assert!(b.included_in_averages);
        assert_eq!(b.auprc, 1.0);
        assert_eq!(b.auc, 1.0);
        assert_eq!(report.averages.auprc, 1.0);
        assert_eq!(report.averages.micro_auprc, report.micro.area);
        assert_eq!(report.micro.labels, vec!["B".to_string()]);
    }

    #[test]
    fn empty_subset_averages_to_zero() {
        let report = evaluator().tabular_report(&input(), &BTreeSet::new()).unwrap();
        assert_eq!(report.averages.auprc, 0.0);
        assert_eq!(report.averages.auc, 0.0);
        assert_eq!(report.micro.area, 0.0);
    }
}
