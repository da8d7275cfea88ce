//! Example x label confidence matrix and ground-truth label sets.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::error::EvalError;
use crate::rounding::round_half_up;

/// Decimals kept for stored confidences.
pub(crate) const CONFIDENCE_DECIMALS: u32 = 4;

/// A dense example x label confidence matrix.
///
/// Examples and labels are kept in sorted order. Storage is column-major so
/// that a per-label sweep reads one contiguous slice. Every cell holds a
/// value in `[0, 1]` rounded to 4 decimals; cells never observed while
/// building are 0.0.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfidenceMatrix {
    examples: Vec<String>,
    labels: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl ConfidenceMatrix {
    /// Example ids, sorted.
    #[must_use]
    pub fn examples(&self) -> &[String] {
        &self.examples
    }

    /// Labels, sorted.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Number of examples.
    #[must_use]
    pub fn n_examples(&self) -> usize {
        self.examples.len()
    }

    /// Number of labels.
    #[must_use]
    pub fn n_labels(&self) -> usize {
        self.labels.len()
    }

    /// Position of `label` in [`ConfidenceMatrix::labels`].
    #[must_use]
    pub fn label_index(&self, label: &str) -> Option<usize> {
        self.labels
            .binary_search_by(|l| l.as_str().cmp(label))
            .ok()
    }

    /// Confidences of one label, aligned with [`ConfidenceMatrix::examples`].
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::UnknownLabel`] if the label has no column.
    pub fn column(&self, label: &str) -> Result<&[f64], EvalError> {
        self.label_index(label)
            .map(|i| self.columns[i].as_slice())
            .ok_or_else(|| EvalError::UnknownLabel {
                label: label.to_string(),
            })
    }

    /// Confidences of the label at `index`.
    #[must_use]
    pub fn column_at(&self, index: usize) -> &[f64] {
        &self.columns[index]
    }

    /// A single cell, or `None` if the example or label is unknown.
    #[must_use]
    pub fn get(&self, example: &str, label: &str) -> Option<f64> {
        let row = self
            .examples
            .binary_search_by(|e| e.as_str().cmp(example))
            .ok()?;
        let col = self.label_index(label)?;
        Some(self.columns[col][row])
    }

    /// Iterate rows as `(example, confidences in label order)`.
    pub fn rows(&self) -> impl Iterator<Item = (&str, Vec<f64>)> {
        self.examples.iter().enumerate().map(|(row, example)| {
            let values = self.columns.iter().map(|col| col[row]).collect();
            (example.as_str(), values)
        })
    }
}

/// Sparse accumulator for a [`ConfidenceMatrix`].
#[derive(Debug, Default)]
pub struct ConfidenceMatrixBuilder {
    examples: BTreeSet<String>,
    labels: BTreeSet<String>,
    cells: BTreeMap<(String, String), f64>,
}

impl ConfidenceMatrixBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an example even if it ends up with no stored confidence.
    pub fn add_example(&mut self, example: impl Into<String>) {
        self.examples.insert(example.into());
    }

    /// Register a label even if no example ends up with a stored confidence.
    pub fn add_label(&mut self, label: impl Into<String>) {
        self.labels.insert(label.into());
    }

    /// Set one cell. Later writes to the same cell win.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::InvalidConfidence`] if `value` is not a finite
    /// number in `[0, 1]`.
    pub fn insert(
        &mut self,
        example: impl Into<String>,
        label: impl Into<String>,
        value: f64,
    ) -> Result<(), EvalError> {
        let example = example.into();
        let label = label.into();
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(EvalError::InvalidConfidence {
                example,
                label,
                value,
            });
        }
        self.examples.insert(example.clone());
        self.labels.insert(label.clone());
        self.cells
            .insert((example, label), round_half_up(value, CONFIDENCE_DECIMALS));
        Ok(())
    }

    /// Densify, filling every unobserved cell with 0.0.
    #[must_use]
    pub fn build(self) -> ConfidenceMatrix {
        let examples: Vec<String> = self.examples.into_iter().collect();
        let labels: Vec<String> = self.labels.into_iter().collect();
        let row_of: BTreeMap<&str, usize> = examples
            .iter()
            .enumerate()
            .map(|(i, e)| (e.as_str(), i))
            .collect();
        let col_of: BTreeMap<&str, usize> = labels
            .iter()
            .enumerate()
            .map(|(i, l)| (l.as_str(), i))
            .collect();

        let mut columns = vec![vec![0.0; examples.len()]; labels.len()];
        for ((example, label), value) in &self.cells {
            if let (Some(&row), Some(&col)) = (row_of.get(example.as_str()), col_of.get(label.as_str())) {
                columns[col][row] = *value;
            }
        }

        ConfidenceMatrix {
            examples,
            labels,
            columns,
        }
    }
}

/// The true labels of every example, indexed both ways.
#[derive(Debug, Clone, Default)]
pub struct GroundTruth {
    by_example: BTreeMap<String, BTreeSet<String>>,
    by_label: BTreeMap<String, BTreeSet<String>>,
}

impl GroundTruth {
    /// Build from `(example id, annotation)` pairs.
    pub fn from_annotations<I, E, A, L>(annotations: I) -> Self
    where
        I: IntoIterator<Item = (E, A)>,
        E: Into<String>,
        A: IntoIterator<Item = L>,
        L: Into<String>,
    {
        let mut truth = Self::default();
        for (example, labels) in annotations {
            let example = example.into();
            let entry = truth.by_example.entry(example.clone()).or_default();
            for label in labels {
                let label = label.into();
                entry.insert(label.clone());
                truth
                    .by_label
                    .entry(label)
                    .or_default()
                    .insert(example.clone());
            }
        }
        truth
    }

    /// `true` if `example` is annotated with `label`.
    #[must_use]
    pub fn has(&self, example: &str, label: &str) -> bool {
        self.by_example
            .get(example)
            .is_some_and(|labels| labels.contains(label))
    }

    /// Examples annotated with `label`.
    #[must_use]
    pub fn positives(&self, label: &str) -> Option<&BTreeSet<String>> {
        self.by_label.get(label)
    }

    /// Labels of `example`.
    #[must_use]
    pub fn labels_of(&self, example: &str) -> Option<&BTreeSet<String>> {
        self.by_example.get(example)
    }

    /// Per-example membership of `label`, aligned with `examples`.
    #[must_use]
    pub fn membership(&self, label: &str, examples: &[String]) -> Vec<bool> {
        examples.iter().map(|e| self.has(e, label)).collect()
    }
}

/// Read-only inputs shared by every per-label task of one evaluation run.
#[derive(Debug, Clone)]
pub struct EvaluationInput {
    /// The confidences under evaluation.
    pub confidences: Arc<ConfidenceMatrix>,
    /// The true annotations.
    pub truth: Arc<GroundTruth>,
}

impl EvaluationInput {
    /// Wrap a matrix and its ground truth for sharing across tasks.
    #[must_use]
    pub fn new(confidences: ConfidenceMatrix, truth: GroundTruth) -> Self {
        Self {
            confidences: Arc::new(confidences),
            truth: Arc::new(truth),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_fills_missing_cells_with_zero() {
        let mut b = ConfidenceMatrixBuilder::new();
        b.insert("e2", "B", 0.5).unwrap();
        b.insert("e1", "A", 0.25).unwrap();
        b.add_example("e3");
        let m = b.build();

        assert_eq!(m.examples(), ["e1", "e2", "e3"]);
        assert_eq!(m.labels(), ["A", "B"]);
        assert_eq!(m.column("A").unwrap(), [0.25, 0.0, 0.0]);
        assert_eq!(m.column("B").unwrap(), [0.0, 0.5, 0.0]);
        assert_eq!(m.get("e3", "B"), Some(0.0));
        assert_eq!(m.get("e4", "B"), None);
    }

    #[test]
    fn builder_rounds_to_four_decimals() {
        let mut b = ConfidenceMatrixBuilder::new();
        b.insert("e1", "A", 0.123_45).unwrap();
        assert_eq!(b.build().get("e1", "A"), Some(0.1235));
    }

    #[test]
    fn builder_rejects_out_of_range() {
        let mut b = ConfidenceMatrixBuilder::new();
        let err = b.insert("e1", "A", 1.5).unwrap_err();
        assert!(matches!(err, EvalError::InvalidConfidence { .. }));
        assert!(b.insert("e1", "A", f64::NAN).is_err());
    }

    #[test]
    fn unknown_column_is_an_error() {
        let m = ConfidenceMatrixBuilder::new().build();
        assert!(matches!(
            m.column("A").unwrap_err(),
            EvalError::UnknownLabel { .. }
        ));
    }

    #[test]
    fn rows_follow_label_order() {
        let mut b = ConfidenceMatrixBuilder::new();
        b.insert("e1", "B", 0.2).unwrap();
        b.insert("e1", "A", 0.1).unwrap();
        let m = b.build();
        let rows: Vec<(&str, Vec<f64>)> = m.rows().collect();
        assert_eq!(rows, vec![("e1", vec![0.1, 0.2])]);
    }

    #[test]
    fn ground_truth_indexes_both_ways() {
        let truth = GroundTruth::from_annotations(vec![
            ("e1", vec!["A", "B"]),
            ("e2", vec!["A"]),
            ("e3", vec![]),
        ]);
        assert!(truth.has("e1", "B"));
        assert!(!truth.has("e2", "B"));
        assert!(!truth.has("e9", "A"));
        assert_eq!(truth.positives("A").map(BTreeSet::len), Some(2));
        assert!(truth.labels_of("e3").is_some_and(BTreeSet::is_empty));
        let examples: Vec<String> = ["e1", "e2", "e3"].iter().map(|s| s.to_string()).collect();
        assert_eq!(truth.membership("A", &examples), vec![true, true, false]);
    }
}
