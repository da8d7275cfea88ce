//! The label DAG and its derived adjacency and path tables.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::OnceLock;

use tracing::{debug, instrument};

use crate::error::HierarchyError;
use crate::paths::enumerate_paths;

/// The reserved universal ancestor of every label.
pub const ROOT: &str = "root";

/// An ordered path of labels, starting at a label and ending at [`ROOT`].
pub type LabelPath = Vec<String>;

/// The set of labels truly assigned to one example.
pub type Annotation = BTreeSet<String>;

/// A validated label hierarchy.
///
/// Built once from the parent/child pairs declared in a dataset header and
/// shared read-only afterwards. Every non-root label is guaranteed to reach
/// [`ROOT`] through parent links.
#[derive(Debug, Clone)]
pub struct LabelHierarchy {
    labels: BTreeSet<String>,
    edges: BTreeSet<(String, String)>,
    children: BTreeMap<String, BTreeSet<String>>,
    parents: BTreeMap<String, BTreeSet<String>>,
    paths: OnceLock<BTreeMap<String, Vec<LabelPath>>>,
}

impl LabelHierarchy {
    /// Build a hierarchy from `(parent, child)` pairs.
    ///
    /// Labels are trimmed. Duplicate pairs collapse into one edge.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`HierarchyError::MalformedPair`] | A side of a pair is empty |
    /// | [`HierarchyError::InvalidLabelName`] | A label has a character other than `[A-Za-z0-9.]` |
    /// | [`HierarchyError::RootAsChild`] | `root` appears as a child |
    /// | [`HierarchyError::SelfLoop`] | A label is its own parent |
    /// | [`HierarchyError::MissingRoot`] | No pair has `root` as parent |
    /// | [`HierarchyError::UnreachableLabels`] | A label has no path to `root` |
    #[instrument(skip_all)]
    pub fn build<I, P, C>(pairs: I) -> Result<Self, HierarchyError>
    where
        I: IntoIterator<Item = (P, C)>,
        P: AsRef<str>,
        C: AsRef<str>,
    {
        let mut edges = BTreeSet::new();
        let mut children: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        let mut parents: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        for (index, (parent, child)) in pairs.into_iter().enumerate() {
            let parent = parent.as_ref().trim();
            let child = child.as_ref().trim();
            if parent.is_empty() || child.is_empty() {
                return Err(HierarchyError::MalformedPair {
                    index,
                    pair: format!("{parent}/{child}"),
                });
            }
            if let Some(label) = [parent, child].into_iter().find(|l| !is_valid_label(l)) {
                return Err(HierarchyError::InvalidLabelName {
                    index,
                    label: label.to_string(),
                });
            }
            if child == ROOT {
                return Err(HierarchyError::RootAsChild { index });
            }
            if parent == child {
                return Err(HierarchyError::SelfLoop {
                    label: child.to_string(),
                });
            }
            edges.insert((parent.to_string(), child.to_string()));
            children
                .entry(parent.to_string())
                .or_default()
                .insert(child.to_string());
            parents
                .entry(child.to_string())
                .or_default()
                .insert(parent.to_string());
        }

        if !children.contains_key(ROOT) {
            return Err(HierarchyError::MissingRoot);
        }

        let labels: BTreeSet<String> = children
            .keys()
            .chain(parents.keys())
            .filter(|l| l.as_str() != ROOT)
            .cloned()
            .collect();

        // Walk parent -> child edges from root; anything not reached has no path up.
        let mut reached: BTreeSet<&str> = BTreeSet::new();
        let mut queue: VecDeque<&str> = VecDeque::from([ROOT]);
        while let Some(node) = queue.pop_front() {
            if let Some(kids) = children.get(node) {
                for kid in kids {
                    if reached.insert(kid.as_str()) {
                        queue.push_back(kid.as_str());
                    }
                }
            }
        }
        let unreachable: Vec<String> = labels
            .iter()
            .filter(|l| !reached.contains(l.as_str()))
            .cloned()
            .collect();
        if !unreachable.is_empty() {
            return Err(HierarchyError::UnreachableLabels {
                labels: unreachable,
            });
        }

        debug!(n_labels = labels.len(), n_edges = edges.len(), "hierarchy built");

        Ok(Self {
            labels,
            edges,
            children,
            parents,
            paths: OnceLock::new(),
        })
    }

    /// Parse a comma-separated `parent/child` declaration, e.g.
    /// `root/A,A/B,A/C`, and build the hierarchy from it.
    ///
    /// # Errors
    ///
    /// Same as [`LabelHierarchy::build`]; a pair that does not split into
    /// exactly two sides on `/` is a [`HierarchyError::MalformedPair`].
    pub fn parse(declaration: &str) -> Result<Self, HierarchyError> {
        let mut pairs = Vec::new();
        for (index, raw) in declaration.split(',').enumerate() {
            let sides: Vec<&str> = raw.split('/').collect();
            if sides.len() != 2 {
                return Err(HierarchyError::MalformedPair {
                    index,
                    pair: raw.trim().to_string(),
                });
            }
            pairs.push((sides[0], sides[1]));
        }
        Self::build(pairs)
    }

    /// All non-root labels, sorted.
    #[must_use]
    pub fn labels(&self) -> &BTreeSet<String> {
        &self.labels
    }

    /// Return `true` if `label` is a non-root label of this hierarchy.
    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    /// All `(parent, child)` edges, sorted by parent then child.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.edges.iter().map(|(p, c)| (p.as_str(), c.as_str()))
    }

    /// Number of declared edges.
    #[must_use]
    pub fn n_edges(&self) -> usize {
        self.edges.len()
    }

    /// Parent -> children adjacency (includes `root` as a parent).
    #[must_use]
    pub fn parent_to_children(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.children
    }

    /// Child -> parents adjacency.
    #[must_use]
    pub fn child_to_parents(&self) -> &BTreeMap<String, BTreeSet<String>> {
        &self.parents
    }

    /// Children of `label`, if it has any.
    #[must_use]
    pub fn children_of(&self, label: &str) -> Option<&BTreeSet<String>> {
        self.children.get(label)
    }

    /// Parents of `label`, if it has any.
    #[must_use]
    pub fn parents_of(&self, label: &str) -> Option<&BTreeSet<String>> {
        self.parents.get(label)
    }

    /// `true` iff no label is the child of more than one parent.
    #[must_use]
    pub fn is_tree(&self) -> bool {
        self.parents.values().all(|p| p.len() <= 1)
    }

    /// Labels that are never a parent.
    #[must_use]
    pub fn leaves(&self) -> BTreeSet<String> {
        self.labels
            .iter()
            .filter(|l| !self.children.contains_key(l.as_str()))
            .cloned()
            .collect()
    }

    /// Every simple path from `label` to `root`.
    ///
    /// Paths are computed for all labels on first use and cached. In a tree
    /// there is exactly one path per label; in a DAG a label reachable
    /// through several parents has one path per parent chain.
    ///
    /// # Errors
    ///
    /// Returns [`HierarchyError::UnknownLabel`] if `label` is not part of the
    /// hierarchy.
    pub fn paths_to_root(&self, label: &str) -> Result<&[LabelPath], HierarchyError> {
        self.path_table()
            .get(label)
            .map(Vec::as_slice)
            .ok_or_else(|| HierarchyError::UnknownLabel {
                label: label.to_string(),
            })
    }

    /// The cached label -> paths table.
    pub fn path_table(&self) -> &BTreeMap<String, Vec<LabelPath>> {
        self.paths.get_or_init(|| {
            let table: BTreeMap<String, Vec<LabelPath>> = self
                .labels
                .iter()
                .map(|label| (label.clone(), enumerate_paths(label, &self.parents)))
                .collect();
            debug!(
                n_paths = table.values().map(Vec::len).sum::<usize>(),
                "enumerated label paths"
            );
            table
        })
    }

    /// Length of the longest path to root, counted in edges.
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.path_table()
            .values()
            .flatten()
            .map(|path| path.len() - 1)
            .max()
            .unwrap_or(0)
    }

    /// Slash-separated path from the top of the hierarchy down to `label`,
    /// e.g. `A/B` for the path `B -> A -> root`.
    ///
    /// Uses the first enumerated path, which is the only one in a tree.
    #[must_use]
    pub fn tree_path(&self, label: &str) -> Option<String> {
        let path = self.path_table().get(label)?.first()?;
        let descending: Vec<&str> = path
            .iter()
            .rev()
            .skip(1)
            .map(String::as_str)
            .collect();
        Some(descending.join("/"))
    }

    /// `true` unless one of `label`'s children is also in `annotation`.
    #[must_use]
    pub fn is_most_specific(&self, label: &str, annotation: &Annotation) -> bool {
        self.children
            .get(label)
            .is_none_or(|kids| kids.iter().all(|kid| !annotation.contains(kid)))
    }

    /// The labels of `annotation` that have no child also present in it.
    #[must_use]
    pub fn most_specific_labels(&self, annotation: &Annotation) -> Annotation {
        annotation
            .iter()
            .filter(|label| self.is_most_specific(label, annotation))
            .cloned()
            .collect()
    }
}

fn is_valid_label(label: &str) -> bool {
    label.chars().all(|c| c.is_ascii_alphanumeric() || c == '.')
}
