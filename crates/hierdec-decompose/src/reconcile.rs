//! Turns per-edge confidences into one confidence per example and label.
//!
//! A label's confidence along one path to `root` is the product of the
//! child-given-parent confidences of the path's edges; an edge without a
//! confidence counts as 0. Over several paths the smallest product wins, so a
//! label is never more confident than any chain of ancestors that enables it.

use std::collections::{BTreeMap, BTreeSet};

use hierdec_eval::{ConfidenceMatrix, ConfidenceMatrixBuilder};
use hierdec_hierarchy::{LabelHierarchy, ROOT};
use tracing::{debug, instrument};

use crate::error::DecomposeError;

/// Child-given-parent confidences per example.
#[derive(Debug, Clone, Default)]
pub struct EdgeConfidences {
    examples: BTreeSet<String>,
    by_example: BTreeMap<String, BTreeMap<(String, String), f64>>,
}

impl EdgeConfidences {
    /// Empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an example even if it never gets an edge confidence, so that
    /// it still appears (with zeros) in the reconciled matrix.
    pub fn add_example(&mut self, example: impl Into<String>) {
        self.examples.insert(example.into());
    }

    /// Record the confidence that `child` applies to `example` given that
    /// `parent` does. A later value for the same edge replaces the earlier.
    ///
    /// # Errors
    ///
    /// Returns [`DecomposeError::InvalidEdgeConfidence`] if `value` is not a
    /// number in `[0, 1]`.
    pub fn insert(
        &mut self,
        example: impl Into<String>,
        child: impl Into<String>,
        parent: impl Into<String>,
        value: f64,
    ) -> Result<(), DecomposeError> {
        let (example, child, parent) = (example.into(), child.into(), parent.into());
        if !(0.0..=1.0).contains(&value) {
            return Err(DecomposeError::InvalidEdgeConfidence {
                example,
                child,
                parent,
                value,
            });
        }
        self.examples.insert(example.clone());
        self.by_example
            .entry(example)
            .or_default()
            .insert((child, parent), value);
        Ok(())
    }

    /// Confidence of one edge for one example.
    #[must_use]
    pub fn get(&self, example: &str, child: &str, parent: &str) -> Option<f64> {
        self.by_example
            .get(example)?
            .get(&(child.to_string(), parent.to_string()))
            .copied()
    }

    /// Registered examples, sorted.
    #[must_use]
    pub fn examples(&self) -> &BTreeSet<String> {
        &self.examples
    }

    /// Every label named as a child or a parent, without `root`.
    #[must_use]
    pub fn labels(&self) -> BTreeSet<String> {
        self.by_example
            .values()
            .flat_map(|edges| edges.keys())
            .flat_map(|(child, parent)| [child, parent])
            .filter(|l| l.as_str() != ROOT)
            .cloned()
            .collect()
    }

    /// Number of stored edge confidences.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_example.values().map(BTreeMap::len).sum()
    }

    /// `true` if no edge confidence is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Reconciles [`EdgeConfidences`] against a hierarchy.
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceReconciler<'h> {
    hierarchy: &'h LabelHierarchy,
}

impl<'h> ConfidenceReconciler<'h> {
    /// Reconciler over `hierarchy`.
    #[must_use]
    pub fn new(hierarchy: &'h LabelHierarchy) -> Self {
        Self { hierarchy }
    }

    /// Build the example x label matrix for the labels seen in `edges`.
    ///
    /// Each cell is the minimum over the label's paths to `root` of the
    /// product of edge confidences along the path, rounded to 4 decimals.
    /// Cells of examples without edge data are 0.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DecomposeError::Hierarchy`] | An edge names a label outside the hierarchy |
    /// | [`DecomposeError::Eval`] | A reconciled value cannot be stored |
    #[instrument(skip_all, fields(n_examples = edges.examples.len(), n_edges = edges.len()))]
    pub fn reconcile(&self, edges: &EdgeConfidences) -> Result<ConfidenceMatrix, DecomposeError> {
        let labels = edges.labels();
        let mut builder = ConfidenceMatrixBuilder::new();
        for example in &edges.examples {
            builder.add_example(example.as_str());
        }

        for label in &labels {
            builder.add_label(label.as_str());
            let paths = self.hierarchy.paths_to_root(label)?;
            for (example, example_edges) in &edges.by_example {
                let value = paths
                    .iter()
                    .map(|path| {
                        path.windows(2)
                            .map(|step| {
                                example_edges
                                    .get(&(step[0].clone(), step[1].clone()))
                                    .copied()
                                    .unwrap_or(0.0)
                            })
                            .product::<f64>()
                    })
                    .fold(f64::INFINITY, f64::min);
                let value = if value.is_finite() { value } else { 0.0 };
                builder.insert(example.as_str(), label.as_str(), value)?;
            }
        }

        let matrix = builder.build();
        debug!(n_labels = matrix.n_labels(), "edge confidences reconciled");
        Ok(matrix)
    }
}
