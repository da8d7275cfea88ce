//! Encodes a base dataset under each decomposition.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use hierdec_hierarchy::{Annotation, LabelSubset, ROOT};
use tracing::{debug, instrument};

use crate::dataset::{BaseDataset, Example};
use crate::encoding::Encoding;
use crate::error::DecomposeError;
use crate::folds::Folds;

/// Which examples a per-edge dataset keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExampleScope {
    /// Only examples that carry the parent label (all of them when the
    /// parent is `root`). Used for training splits.
    ParentCarriers,
    /// Every kept example. Used for test splits.
    All,
}

/// The decomposition unit a dataset belongs to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum DatasetUnit {
    /// The whole label set in one dataset.
    Whole,
    /// One child-given-parent edge.
    Edge {
        /// Parent label.
        parent: String,
        /// Child label.
        child: String,
    },
    /// The children of one parent.
    Parent {
        /// Parent label.
        parent: String,
    },
}

/// One encoded dataset: header text (class attributes included) and rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedDataset {
    /// The unit this dataset was built for.
    pub unit: DatasetUnit,
    /// Relation, attribute and class attribute lines.
    pub header: String,
    /// One line per kept example.
    pub rows: Vec<String>,
}

impl EncodedDataset {
    /// Render as dataset text.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut text = String::with_capacity(self.header.len() + self.rows.len() * 32);
        text.push_str(&self.header);
        text.push_str("\n@DATA\n");
        for row in &self.rows {
            text.push_str(row);
            text.push('\n');
        }
        text
    }
}

/// Training and test datasets of one fold.
#[derive(Debug, Clone)]
pub struct FoldDatasets {
    /// Fold number, starting at 1.
    pub fold: usize,
    /// Datasets over every example outside the fold.
    pub train: Vec<EncodedDataset>,
    /// Datasets over the examples of the fold.
    pub test: Vec<EncodedDataset>,
}

/// Produces encoded datasets from a [`BaseDataset`].
///
/// The target labels of the complete encodings are resolved once from the
/// chosen [`LabelSubset`].
#[derive(Debug)]
pub struct DecompositionEngine<'a> {
    dataset: &'a BaseDataset,
    targets: BTreeSet<String>,
}

impl<'a> DecompositionEngine<'a> {
    /// Prepare an engine for `dataset`.
    #[must_use]
    pub fn new(dataset: &'a BaseDataset, subset: LabelSubset) -> Self {
        Self {
            targets: dataset.label_subset(subset),
            dataset,
        }
    }

    /// The labels the complete encodings emit, sorted.
    #[must_use]
    pub fn targets(&self) -> &BTreeSet<String> {
        &self.targets
    }

    /// Encode the examples in `keep` under `encoding`.
    ///
    /// Ids in `keep` that are not in the dataset are ignored. `scope` only
    /// affects the partial encodings.
    #[instrument(skip_all, fields(encoding = %encoding, n_keep = keep.len()))]
    pub fn encode(&self, keep: &BTreeSet<String>, encoding: Encoding, scope: ExampleScope) -> Vec<EncodedDataset> {
        let datasets = match encoding {
            Encoding::Baseline if self.dataset.hierarchy().is_tree() => vec![self.baseline_tree(keep)],
            Encoding::Baseline => vec![self.baseline_dag(keep)],
            Encoding::LabelsWithoutHierarchicalRelations | Encoding::LabelVsTheRest => {
                vec![self.complete(keep)]
            }
            Encoding::ChildVsParentLabel => self.child_vs_parent(keep, scope),
            Encoding::LabelSpecialization => self.label_specialization(keep, scope),
        };
        debug!(n_datasets = datasets.len(), "encoded");
        datasets
    }

    /// Encode the training and test split of one fold.
    ///
    /// # Errors
    ///
    /// Returns [`DecomposeError::FoldOutOfRange`] if `fold` is not in
    /// `1..=folds.n_folds()`.
    pub fn encode_fold(&self, folds: &Folds, fold: usize, encoding: Encoding) -> Result<FoldDatasets, DecomposeError> {
        let (train, test) = folds.train_test(fold)?;
        Ok(FoldDatasets {
            fold,
            train: self.encode(&train, encoding, ExampleScope::ParentCarriers),
            test: self.encode(&test, encoding, ExampleScope::All),
        })
    }

    fn kept<'s>(&'s self, keep: &'s BTreeSet<String>) -> impl Iterator<Item = (&'s str, &'s Example)> {
        self.dataset
            .examples()
            .iter()
            .filter(move |(id, _)| keep.contains(*id))
            .map(|(id, e)| (id.as_str(), e))
    }

    fn baseline_tree(&self, keep: &BTreeSet<String>) -> EncodedDataset {
        let hierarchy = self.dataset.hierarchy();
        let label_paths: BTreeMap<&str, String> = hierarchy
            .labels()
            .iter()
            .filter_map(|l| hierarchy.tree_path(l).map(|p| (l.as_str(), p)))
            .collect();
        let all_paths: BTreeSet<&str> = label_paths.values().map(String::as_str).collect();

        let mut header = self.dataset.header().to_string();
        let _ = writeln!(
            header,
            "@ATTRIBUTE CLASS HIERARCHICAL {}",
            all_paths.into_iter().collect::<Vec<_>>().join(",")
        );

        let rows = self
            .kept(keep)
            .map(|(_, example)| {
                let paths: BTreeSet<String> = example
                    .labels
                    .iter()
                    .filter_map(|l| label_paths.get(l.as_str()).cloned())
                    .collect();
                let paths = collapse_paths(paths);
                format!(
                    "{},{}",
                    example.attribute_values,
                    paths.into_iter().collect::<Vec<_>>().join("@")
                )
            })
            .collect();

        EncodedDataset {
            unit: DatasetUnit::Whole,
            header,
            rows,
        }
    }

    fn baseline_dag(&self, keep: &BTreeSet<String>) -> EncodedDataset {
        let mut header = self.dataset.header().to_string();
        let _ = writeln!(header, "@ATTRIBUTE CLASS HIERARCHICAL {}", self.dataset.declaration());
        let rows = self
            .kept(keep)
            .map(|(_, example)| {
                let labels: Vec<&str> = example.labels.iter().map(String::as_str).collect();
                format!("{},{}", example.attribute_values, labels.join("@"))
            })
            .collect();
        EncodedDataset {
            unit: DatasetUnit::Whole,
            header,
            rows,
        }
    }

    fn complete(&self, keep: &BTreeSet<String>) -> EncodedDataset {
        let hierarchy = self.dataset.hierarchy();
        let rows = self
            .kept(keep)
            .map(|(_, example)| {
                let specific = hierarchy.most_specific_labels(&example.labels);
                binary_row(&example.attribute_values, &self.targets, &specific)
            })
            .collect();
        EncodedDataset {
            unit: DatasetUnit::Whole,
            header: binary_header(self.dataset.header(), &self.targets),
            rows,
        }
    }

    fn child_vs_parent(&self, keep: &BTreeSet<String>, scope: ExampleScope) -> Vec<EncodedDataset> {
        self.dataset
            .hierarchy()
            .edges()
            .map(|(parent, child)| {
                let targets = BTreeSet::from([child.to_string()]);
                EncodedDataset {
                    unit: DatasetUnit::Edge {
                        parent: parent.to_string(),
                        child: child.to_string(),
                    },
                    header: binary_header(self.dataset.header(), &targets),
                    rows: self.partial_rows(keep, scope, parent, &targets),
                }
            })
            .collect()
    }

    fn label_specialization(&self, keep: &BTreeSet<String>, scope: ExampleScope) -> Vec<EncodedDataset> {
        self.dataset
            .hierarchy()
            .parent_to_children()
            .iter()
            .filter(|(_, children)| children.len() >= 2)
            .map(|(parent, children)| EncodedDataset {
                unit: DatasetUnit::Parent {
                    parent: parent.clone(),
                },
                header: binary_header(self.dataset.header(), children),
                rows: self.partial_rows(keep, scope, parent, children),
            })
            .collect()
    }

    fn partial_rows(
        &self,
        keep: &BTreeSet<String>,
        scope: ExampleScope,
        parent: &str,
        targets: &BTreeSet<String>,
    ) -> Vec<String> {
        let restrict = scope == ExampleScope::ParentCarriers && parent != ROOT;
        self.kept(keep)
            .filter(|(_, example)| !restrict || example.labels.contains(parent))
            .map(|(_, example)| binary_row(&example.attribute_values, targets, &example.labels))
            .collect()
    }
}

fn binary_header(base: &str, targets: &BTreeSet<String>) -> String {
    let mut header = base.to_string();
    for label in targets {
        let _ = writeln!(header, "@ATTRIBUTE {label} {{0, 1}}");
    }
    header
}

fn binary_row(attribute_values: &str, targets: &BTreeSet<String>, present: &Annotation) -> String {
    let mut row = attribute_values.to_string();
    for label in targets {
        row.push_str(if present.contains(label) { ",1" } else { ",0" });
    }
    row
}

/// Drop every path that is a strict prefix of another path in the set.
fn collapse_paths(paths: BTreeSet<String>) -> BTreeSet<String> {
    let shadowed: BTreeSet<&String> = paths
        .iter()
        .filter(|p| {
            let prefix = format!("{p}/");
            paths.iter().any(|q| q.starts_with(&prefix))
        })
        .collect();
    paths
        .iter()
        .filter(|p| !shadowed.contains(p))
        .cloned()
        .collect()
}
