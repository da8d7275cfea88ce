//! The parsed base dataset every decomposition starts from.

use std::collections::{BTreeMap, BTreeSet};

use hierdec_eval::GroundTruth;
use hierdec_hierarchy::{Annotation, DatasetProperties, LabelHierarchy, LabelSubset};
use tracing::{debug, instrument};

use crate::error::DecomposeError;

/// One example of the base dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Example {
    /// The row text up to (not including) the label column, id first.
    pub attribute_values: String,
    /// The example's true labels.
    pub labels: Annotation,
}

/// A hierarchically labelled dataset in its parsed form.
#[derive(Debug, Clone)]
pub struct BaseDataset {
    name: String,
    header: String,
    declaration: String,
    hierarchy: LabelHierarchy,
    examples: BTreeMap<String, Example>,
}

impl BaseDataset {
    /// Assemble a dataset from its parts.
    ///
    /// `header` holds the relation and non-class attribute lines, exactly as
    /// they are written at the top of every encoded dataset. `declaration`
    /// is the `parent/child,...` hierarchy text.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DecomposeError::Hierarchy`] | The declaration is not a valid hierarchy |
    /// | [`DecomposeError::DuplicateExample`] | Two examples share an id |
    /// | [`DecomposeError::UnknownAnnotation`] | An example carries a label outside the hierarchy |
    #[instrument(skip_all, fields(name = %name.as_ref()))]
    pub fn new<I>(
        name: impl AsRef<str>,
        header: impl Into<String>,
        declaration: impl Into<String>,
        examples: I,
    ) -> Result<Self, DecomposeError>
    where
        I: IntoIterator<Item = (String, Example)>,
    {
        let declaration = declaration.into();
        let hierarchy = LabelHierarchy::parse(&declaration)?;

        let mut by_id = BTreeMap::new();
        for (id, example) in examples {
            if let Some(label) = example.labels.iter().find(|l| !hierarchy.contains(l)) {
                return Err(DecomposeError::UnknownAnnotation {
                    example: id,
                    label: label.clone(),
                });
            }
            if by_id.contains_key(&id) {
                return Err(DecomposeError::DuplicateExample { id });
            }
            by_id.insert(id, example);
        }

        debug!(n_examples = by_id.len(), n_labels = hierarchy.labels().len(), "base dataset assembled");

        Ok(Self {
            name: name.as_ref().to_string(),
            header: header.into(),
            declaration,
            hierarchy,
            examples: by_id,
        })
    }

    /// Relation name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Relation and non-class attribute lines.
    #[must_use]
    pub fn header(&self) -> &str {
        &self.header
    }

    /// The raw hierarchy declaration.
    #[must_use]
    pub fn declaration(&self) -> &str {
        &self.declaration
    }

    /// The validated hierarchy.
    #[must_use]
    pub fn hierarchy(&self) -> &LabelHierarchy {
        &self.hierarchy
    }

    /// Examples keyed by id.
    #[must_use]
    pub fn examples(&self) -> &BTreeMap<String, Example> {
        &self.examples
    }

    /// Example ids, sorted.
    pub fn example_ids(&self) -> impl Iterator<Item = &str> {
        self.examples.keys().map(String::as_str)
    }

    /// Annotations in example-id order.
    pub fn annotations(&self) -> impl Iterator<Item = &Annotation> {
        self.examples.values().map(|e| &e.labels)
    }

    /// Resolve a label subset against this dataset.
    #[must_use]
    pub fn label_subset(&self, subset: LabelSubset) -> BTreeSet<String> {
        subset.resolve(&self.hierarchy, self.annotations())
    }

    /// Ground truth for evaluation.
    #[must_use]
    pub fn ground_truth(&self) -> GroundTruth {
        GroundTruth::from_annotations(
            self.examples
                .iter()
                .map(|(id, e)| (id.clone(), e.labels.iter().cloned())),
        )
    }

    /// Hierarchy and annotation statistics.
    #[must_use]
    pub fn properties(&self) -> DatasetProperties {
        DatasetProperties::compute(&self.hierarchy, self.annotations())
    }

    /// Number of `(nominal, numeric)` attributes declared in the header.
    #[must_use]
    pub fn attribute_counts(&self) -> (usize, usize) {
        let mut nominal = 0;
        let mut numeric = 0;
        for line in self.header.lines().map(str::trim) {
            let upper = line.to_uppercase();
            if !upper.starts_with("@ATTRIBUTE") {
                continue;
            }
            if upper.ends_with("NUMERIC") {
                numeric += 1;
            } else if line.contains('{') && line.ends_with('}') {
                nominal += 1;
            }
        }
        (nominal, numeric)
    }
}
