//! Summary statistics of a hierarchy and the annotations of a dataset.

use std::collections::BTreeSet;

use tracing::instrument;

use crate::hierarchy::{Annotation, LabelHierarchy};

/// Minimum, mean and maximum of a sample. All zero for an empty sample.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Summary {
    /// Smallest observed value.
    pub min: f64,
    /// Arithmetic mean.
    pub mean: f64,
    /// Largest observed value.
    pub max: f64,
}

impl Summary {
    /// Summarise a sample of counts.
    #[must_use]
    pub fn of<I: IntoIterator<Item = usize>>(values: I) -> Self {
        let mut n = 0usize;
        let mut sum = 0usize;
        let mut min = usize::MAX;
        let mut max = 0usize;
        for v in values {
            n += 1;
            sum += v;
            min = min.min(v);
            max = max.max(v);
        }
        if n == 0 {
            return Self::default();
        }
        Self {
            min: min as f64,
            mean: sum as f64 / n as f64,
            max: max as f64,
        }
    }
}

/// Hierarchy shape and annotation statistics for one dataset.
///
/// Values are kept unrounded; writers round for display.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetProperties {
    /// Number of annotated examples.
    pub n_examples: usize,
    /// Number of non-root labels.
    pub n_labels: usize,
    /// Number of labels that are never a parent.
    pub n_leaves: usize,
    /// Longest label-to-root path, in edges.
    pub max_depth: usize,
    /// `true` if every label has at most one parent.
    pub is_tree: bool,
    /// Children per parent (including `root`).
    pub forward_branching: Summary,
    /// Parents per child.
    pub backward_branching: Summary,
    /// Labels that are most specific in at least one annotation.
    pub n_most_specific_labels: usize,
    /// Mean number of most-specific labels per example.
    pub cardinality_complete: f64,
    /// Mean number of labels per example that are most specific somewhere
    /// in the dataset.
    pub cardinality_hierarchical: f64,
    /// Mean number of labels per example.
    pub cardinality: f64,
    /// Mean number of leaf labels per example.
    pub cardinality_leaves: f64,
    /// Most-specific annotations that are not hierarchy leaves.
    pub incomplete_paths: usize,
    /// Total most-specific annotations over all examples.
    pub total_paths: usize,
}

impl DatasetProperties {
    /// Compute the statistics of `annotations` under `hierarchy`.
    #[instrument(skip_all)]
    pub fn compute<'a, I>(hierarchy: &LabelHierarchy, annotations: I) -> Self
    where
        I: IntoIterator<Item = &'a Annotation>,
    {
        let annotations: Vec<&Annotation> = annotations.into_iter().collect();
        let leaves = hierarchy.leaves();

        let per_example_specific: Vec<Annotation> = annotations
            .iter()
            .map(|a| hierarchy.most_specific_labels(a))
            .collect();
        let global_specific: BTreeSet<&String> = per_example_specific.iter().flatten().collect();

        let total_paths: usize = per_example_specific.iter().map(BTreeSet::len).sum();
        let incomplete_paths = per_example_specific
            .iter()
            .flatten()
            .filter(|label| !leaves.contains(label.as_str()))
            .count();

        let mean = |counts: Vec<usize>| Summary::of(counts).mean;

        Self {
            n_examples: annotations.len(),
            n_labels: hierarchy.labels().len(),
            n_leaves: leaves.len(),
            max_depth: hierarchy.max_depth(),
            is_tree: hierarchy.is_tree(),
            forward_branching: Summary::of(hierarchy.parent_to_children().values().map(BTreeSet::len)),
            backward_branching: Summary::of(hierarchy.child_to_parents().values().map(BTreeSet::len)),
            n_most_specific_labels: global_specific.len(),
            cardinality_complete: mean(per_example_specific.iter().map(BTreeSet::len).collect()),
            cardinality_hierarchical: mean(
                annotations
                    .iter()
                    .map(|a| a.iter().filter(|l| global_specific.contains(l)).count())
                    .collect(),
            ),
            cardinality: mean(annotations.iter().map(|a| a.len()).collect()),
            cardinality_leaves: mean(
                annotations
                    .iter()
                    .map(|a| a.iter().filter(|l| leaves.contains(l.as_str())).count())
                    .collect(),
            ),
            incomplete_paths,
            total_paths,
        }
    }

    /// Percentage of most-specific annotations that stop above a leaf.
    #[must_use]
    pub fn incomplete_path_share(&self) -> f64 {
        if self.total_paths == 0 {
            0.0
        } else {
            self.incomplete_paths as f64 / self.total_paths as f64 * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotation(labels: &[&str]) -> Annotation {
        labels.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn summary_of_empty_is_zero() {
        assert_eq!(Summary::of(Vec::new()), Summary::default());
    }

    #[test]
    fn summary_statistics() {
        let s = Summary::of(vec![1, 2, 6]);
        assert!((s.min - 1.0).abs() < f64::EPSILON);
        assert!((s.mean - 3.0).abs() < f64::EPSILON);
        assert!((s.max - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn properties_of_small_tree() {
        let h = LabelHierarchy::parse("root/A,A/B,A/C,root/D").unwrap();
        let annotations = vec![
            annotation(&["A", "B"]),
            annotation(&["A"]),
            annotation(&["D"]),
        ];
        let p = DatasetProperties::compute(&h, &annotations);

        assert_eq!(p.n_examples, 3);
        assert_eq!(p.n_labels, 4);
        assert_eq!(p.n_leaves, 3);
        assert_eq!(p.max_depth, 2);
        assert!(p.is_tree);
        // root has 2 children, A has 2.
        assert!((p.forward_branching.mean - 2.0).abs() < f64::EPSILON);
        assert!((p.backward_branching.max - 1.0).abs() < f64::EPSILON);
        // Most specific per example: {B}, {A}, {D}.
        assert_eq!(p.n_most_specific_labels, 3);
        assert!((p.cardinality_complete - 1.0).abs() < f64::EPSILON);
        // Example 1 carries A and B, both most specific somewhere.
        assert!((p.cardinality_hierarchical - 4.0 / 3.0).abs() < 1e-12);
        assert!((p.cardinality - 4.0 / 3.0).abs() < 1e-12);
        assert!((p.cardinality_leaves - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(p.total_paths, 3);
        assert_eq!(p.incomplete_paths, 1);
        assert!((p.incomplete_path_share() - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn dag_is_reported_as_not_tree() {
        let h = LabelHierarchy::parse("root/A,root/B,A/C,B/C").unwrap();
        let p = DatasetProperties::compute(&h, &[annotation(&["A", "B", "C"])]);
        assert!(!p.is_tree);
        assert!((p.backward_branching.max - 2.0).abs() < f64::EPSILON);
        assert_eq!(p.total_paths, 1);
        assert_eq!(p.incomplete_paths, 0);
    }
}
